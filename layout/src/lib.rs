//! # SSBO Layout
//!
//! Reference layouts and conformance verification for shader storage buffer
//! blocks.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`ShaderInterface`] - Structs and buffer blocks declared by a test case
//! - [`LayoutComputer`] - Reference layouts under shared, packed, std140 and
//!   std430 packing, row- or column-major
//! - [`verify`] - Structural checks, layout comparison and content verification
//!   of an implementation's reported layout
//! - [`LayoutCase`] - Orchestration of one case into a [`Verdict`]
//! - [`DummyProgram`] - An in-crate implementation under test
//!
//! ## Example
//!
//! ```ignore
//! use ssbo_layout::{BasicType, BufferVar, CaseConfig, LayoutCase, LayoutFlags, ShaderInterface};
//!
//! let mut interface = ShaderInterface::new();
//! let handle = interface.alloc_block("Block")?;
//! let block = interface.block_mut(handle)?;
//! block.set_flags(LayoutFlags::STD140);
//! block.add_member(BufferVar::new("v", BasicType::VEC3, LayoutFlags::ACCESS_READ));
//!
//! let case = LayoutCase::new("vec3", interface, CaseConfig::new())?;
//! let verdict = case.run(&mut case.dummy_program());
//! assert!(verdict.is_pass());
//! ```

pub mod case;
pub mod error;
pub mod flags;
pub mod generator;
pub mod interface;
pub mod layout;
pub mod program;
pub mod storage;
pub mod types;
pub mod value;
pub mod verify;

// Re-export main types for convenience
pub use case::{CaseConfig, LayoutCase, Verdict};
pub use error::{LayoutError, LayoutResult, VerificationError};
pub use flags::{LayoutFlags, PackingRule};
pub use generator::{Features, GeneratorLimits, InterfaceGenerator};
pub use interface::{BlockHandle, BufferBlock, BufferVar, ShaderInterface, StructHandle};
pub use layout::{
    BlockLayoutEntry, BufferLayout, BufferVarLayoutEntry, LayoutComputer, ReferenceLayout,
};
pub use program::{DummyProgram, ProgramResources, ProgramUnderTest};
pub use storage::{BlockPlacement, BufferMode, BufferStorage};
pub use types::{ArraySize, BasicType, ScalarKind, StructMember, StructType, VarType};
pub use value::Value;
pub use verify::{LayoutComparator, VerificationReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version.
///
/// The library never installs a logger; binaries do.
pub fn init() {
    log::info!("SSBO layout v{} initialized", VERSION);
}
