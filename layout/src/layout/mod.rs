//! Reference layout computation and the layout data model shared with
//! implementations under test.

mod compute;
mod entry;

pub use compute::{
    align_up, BlockInstance, BlockReference, LayoutComputer, ReferenceLayout, VarSource,
    VEC4_ALIGNMENT,
};
pub use entry::{BlockLayoutEntry, BufferLayout, BufferVarLayoutEntry};
