//! Error types.
//!
//! [`LayoutError`] reports an illegal interface declaration and is fatal to
//! the test case. [`VerificationError`] describes one discrepancy found while
//! checking an implementation; verifiers collect every discrepancy they find
//! into a [`VerificationReport`](crate::VerificationReport).

use thiserror::Error;

use crate::layout::BufferVarLayoutEntry;
use crate::types::BasicType;
use crate::value::Value;

/// Illegal type, block or interface declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("struct '{0}' is already declared")]
    DuplicateStruct(String),
    #[error("block '{0}' is already declared")]
    DuplicateBlock(String),
    #[error("unresolved struct '{name}' referenced from {context}")]
    UnresolvedStruct { name: String, context: String },
    #[error("struct '{owner}' references '{referenced}', which is not declared before it")]
    ForwardStructReference { owner: String, referenced: String },
    #[error("unsized array '{member}' is not the last member of block '{block}'")]
    UnsizedArrayNotLast { block: String, member: String },
    #[error("unsized dimension of '{member}' in block '{block}' is not the outermost one")]
    NestedUnsizedArray { block: String, member: String },
    #[error("struct '{owner}' member '{member}' contains an unsized array")]
    UnsizedArrayInStruct { owner: String, member: String },
    #[error("struct '{0}' has no members")]
    EmptyStruct(String),
    #[error("block '{0}' has no members")]
    EmptyBlock(String),
    #[error("zero-sized array in {context}")]
    ZeroSizedArray { context: String },
    #[error("invalid basic type {ty} in {context}")]
    InvalidBasicType { context: String, ty: String },
    #[error("invalid block handle {0}")]
    InvalidBlockHandle(usize),
    #[error("invalid struct handle {0}")]
    InvalidStructHandle(usize),
    #[error("instance {instance} out of range for block '{block}' with {count} instances")]
    InstanceOutOfRange {
        block: String,
        instance: u32,
        count: u32,
    },
    #[error("no unsized array length supplied for instance {instance} of block '{block}'")]
    MissingUnsizedArraySize { block: String, instance: u32 },
    #[error("conflicting packing qualifiers on {context}")]
    ConflictingPackingFlags { context: String },
    #[error("both row_major and column_major set on {context}")]
    ConflictingMatrixFlags { context: String },
}

pub type LayoutResult<T> = Result<T, LayoutError>;

/// A single discrepancy between the reference and an implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerificationError {
    #[error("buffer block '{name}' not found")]
    MissingBlock { name: String },
    #[error("buffer block '{name}' reported more than once")]
    DuplicateBlock { name: String },
    #[error("buffer variable '{name}' not found in block '{block}'")]
    MissingVariable { block: String, name: String },
    #[error("buffer variable '{name}' reported more than once in block '{block}'")]
    DuplicateVariable { block: String, name: String },
    #[error("layout mismatch in '{name}':\n  expected: {expected}\n  got: {actual}")]
    LayoutMismatch {
        name: String,
        expected: Box<BufferVarLayoutEntry>,
        actual: Box<BufferVarLayoutEntry>,
    },
    #[error("type mismatch in '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: BasicType,
        actual: BasicType,
    },
    #[error("array size mismatch in '{name}': expected {expected}, got {actual}")]
    ArraySizeMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },
    #[error("top-level array size mismatch in '{name}': expected {expected}, got {actual}")]
    TopLevelArraySizeMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },
    #[error("majorness mismatch in '{name}': expected row_major = {expected_row_major}")]
    MajornessMismatch {
        name: String,
        expected_row_major: bool,
    },
    #[error("number of active variables differ in block '{block}': expected {expected}, got {actual}")]
    ActiveVariableCountMismatch {
        block: String,
        expected: usize,
        actual: usize,
    },
    #[error("offset of '{name}' ({offset}) does not follow '{previous}' ({previous_end}) in block '{block}'")]
    OffsetOrder {
        block: String,
        previous: String,
        previous_end: u64,
        name: String,
        offset: u32,
    },
    #[error("invalid block index {index} in buffer variable '{name}'")]
    InvalidBlockIndex { name: String, index: usize },
    #[error("invalid active variable index {index} in block '{block}'")]
    InvalidActiveVariableIndex { block: String, index: usize },
    #[error("active variable index {index} repeated in block '{block}'")]
    DuplicateActiveVariable { block: String, index: usize },
    #[error("buffer variable '{name}' is not active in any block")]
    UnreferencedVariable { name: String },
    #[error("index query for '{name}' returned {actual:?}, expected {expected}")]
    IndexQueryMismatch {
        name: String,
        expected: usize,
        actual: Option<u32>,
    },
    #[error("variable '{name}' out of buffer bounds: ends at {end}, block size {block_size}")]
    OutOfBounds {
        name: String,
        end: u64,
        block_size: u64,
    },
    #[error("block '{block}' needs {size} bytes, more than the limit of {limit}")]
    BlockTooLarge { block: String, size: u64, limit: u64 },
    #[error("unsized array '{name}' has stride {stride}, smaller than its {element_size} byte element")]
    InvalidUnsizedStride {
        name: String,
        stride: u32,
        element_size: u64,
    },
    #[error("'{first}' and '{second}' overlap at byte {offset}")]
    IndexOverlap {
        first: String,
        second: String,
        offset: u64,
    },
    #[error("blocks '{first}' and '{second}' overlap in buffer {buffer}")]
    BlockOverlap {
        first: String,
        second: String,
        buffer: usize,
    },
    #[error("shared layout of '{name}' differs between blocks '{first_block}' and '{second_block}'")]
    SharedLayoutInconsistent {
        name: String,
        first_block: String,
        second_block: String,
    },
    #[error("unsized array length mismatch in block '{block}': expected {expected}, got {actual}")]
    UnsizedArraySizeMismatch {
        block: String,
        expected: u32,
        actual: u32,
    },
    #[error("value mismatch in '{name}' {location}: expected {expected}, got {actual}")]
    ValueMismatch {
        name: String,
        location: String,
        expected: Value,
        actual: Value,
    },
}
