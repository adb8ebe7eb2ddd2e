//! Type descriptors for buffer variables.

mod basic;
mod var_type;

pub use basic::{BasicType, ScalarKind};
pub use var_type::{ArraySize, StructMember, StructType, VarType};
