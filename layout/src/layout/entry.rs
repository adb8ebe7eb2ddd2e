//! Layout entries: the flattened description of where every buffer variable
//! lives inside its block.
//!
//! The same types describe both the reference layout computed by this crate
//! and the layout reported by an implementation under test.

use std::fmt;

use crate::types::{BasicType, ScalarKind};

/// Layout of one buffer variable.
///
/// Arrays of scalars, vectors and matrices are described by a single entry
/// named `name[0]` with `array_size`/`array_stride`. A top-level array of
/// structs or arrays is described by the entries of its first element plus
/// `top_level_array_size`/`top_level_array_stride`. A size of 0 marks the
/// runtime-sized trailing array of a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferVarLayoutEntry {
    /// Full path name (`Block.member.field[0]`).
    pub name: String,
    /// Basic type of the variable or of its array elements.
    pub ty: BasicType,
    /// Index of the owning block entry.
    pub block_index: usize,
    /// Byte offset from the start of the block.
    pub offset: u32,
    /// Innermost array size; 1 if not an array, 0 if unsized.
    pub array_size: u32,
    /// Byte distance between innermost array elements; 0 if not an array.
    pub array_stride: u32,
    /// Byte distance between matrix columns (or rows); 0 if not a matrix.
    pub matrix_stride: u32,
    /// Size of the enclosing top-level array; 1 if none, 0 if unsized.
    pub top_level_array_size: u32,
    /// Byte distance between top-level array elements; 0 if none.
    pub top_level_array_stride: u32,
    /// Whether a matrix is stored row by row.
    pub is_row_major: bool,
}

impl BufferVarLayoutEntry {
    /// Create an entry for a single non-array value at `offset`.
    pub fn new(name: impl Into<String>, ty: BasicType, block_index: usize, offset: u32) -> Self {
        Self {
            name: name.into(),
            ty,
            block_index,
            offset,
            array_size: 1,
            array_stride: 0,
            matrix_stride: 0,
            top_level_array_size: 1,
            top_level_array_stride: 0,
            is_row_major: false,
        }
    }

    /// Set the innermost array size and stride.
    pub fn with_array(mut self, size: u32, stride: u32) -> Self {
        self.array_size = size;
        self.array_stride = stride;
        self
    }

    /// Set the matrix stride and majorness.
    pub fn with_matrix(mut self, stride: u32, row_major: bool) -> Self {
        self.matrix_stride = stride;
        self.is_row_major = row_major;
        self
    }

    /// Set the enclosing top-level array size and stride.
    pub fn with_top_level_array(mut self, size: u32, stride: u32) -> Self {
        self.top_level_array_size = size;
        self.top_level_array_stride = stride;
        self
    }

    pub fn scalar_kind(&self) -> ScalarKind {
        self.ty.scalar_kind()
    }

    /// Whether either array dimension is the runtime-sized one.
    pub fn is_unsized(&self) -> bool {
        self.array_size == 0 || self.top_level_array_size == 0
    }

    /// Stride of the runtime-sized dimension, if any.
    pub fn unsized_stride(&self) -> Option<u32> {
        if self.array_size == 0 {
            Some(self.array_stride)
        } else if self.top_level_array_size == 0 {
            Some(self.top_level_array_stride)
        } else {
            None
        }
    }

    /// `(top_level_size, array_size)` with the unsized dimension resolved to
    /// `unsized_len`.
    pub fn resolved_sizes(&self, unsized_len: u32) -> (u32, u32) {
        let top = if self.top_level_array_size == 0 {
            unsized_len
        } else {
            self.top_level_array_size
        };
        let inner = if self.array_size == 0 {
            unsized_len
        } else {
            self.array_size
        };
        (top, inner)
    }

    /// Byte offsets, relative to the block, of every array element in
    /// top-level-major order.
    pub fn element_offsets(&self, unsized_len: u32) -> Vec<u64> {
        let (top, inner) = self.resolved_sizes(unsized_len);
        let mut offsets = Vec::with_capacity(top as usize * inner as usize);
        for top_index in 0..top as u64 {
            for index in 0..inner as u64 {
                offsets.push(
                    self.offset as u64
                        + top_index * self.top_level_array_stride as u64
                        + index * self.array_stride as u64,
                );
            }
        }
        offsets
    }

    /// Byte offsets, relative to an element, of every component in
    /// column-major component order (column outer, row inner).
    ///
    /// The order is independent of the storage majorness so that two layouts
    /// of the same variable can be compared component by component.
    pub fn component_offsets(&self) -> Vec<u64> {
        let comp = ScalarKind::BYTE_SIZE as u64;
        let stride = self.matrix_stride as u64;
        if !self.ty.is_matrix() {
            return (0..self.ty.component_count() as u64)
                .map(|index| index * comp)
                .collect();
        }
        let mut offsets = Vec::with_capacity(self.ty.component_count() as usize);
        for column in 0..self.ty.matrix_columns() as u64 {
            for row in 0..self.ty.matrix_rows() as u64 {
                offsets.push(if self.is_row_major {
                    row * stride + column * comp
                } else {
                    column * stride + row * comp
                });
            }
        }
        offsets
    }

    /// Byte ranges `[start, end)`, relative to the block, of every stored
    /// vector (matrix column/row, vector or scalar).
    pub fn vector_spans(&self, unsized_len: u32) -> Vec<(u64, u64)> {
        let (num_vecs, vec_size) = self.ty.memory_vectors(self.is_row_major);
        let vec_bytes = (vec_size * ScalarKind::BYTE_SIZE) as u64;
        let mut spans = Vec::new();
        for element in self.element_offsets(unsized_len) {
            for vec_index in 0..num_vecs as u64 {
                let start = element + vec_index * self.matrix_stride as u64;
                spans.push((start, start + vec_bytes));
            }
        }
        spans
    }

    /// Number of bytes from `offset` to the end of the last stored vector.
    pub fn byte_size(&self, unsized_len: u32) -> u64 {
        let (top, inner) = self.resolved_sizes(unsized_len);
        if top == 0 || inner == 0 {
            return 0;
        }
        let (num_vecs, vec_size) = self.ty.memory_vectors(self.is_row_major);
        ((top - 1) as u64 * self.top_level_array_stride as u64)
            .saturating_add((inner - 1) as u64 * self.array_stride as u64)
            .saturating_add((num_vecs - 1) as u64 * self.matrix_stride as u64)
            .saturating_add((vec_size * ScalarKind::BYTE_SIZE) as u64)
    }

    /// Byte size of one element of the runtime-sized dimension, if any.
    pub fn unsized_element_byte_size(&self) -> Option<u64> {
        if self.array_size == 0 {
            Some(self.clone().with_top_level_array(1, 0).with_array(1, 0).byte_size(1))
        } else if self.top_level_array_size == 0 {
            Some(self.element_byte_size())
        } else {
            None
        }
    }

    /// Byte size of the first top-level element, counting one element of a
    /// runtime-sized innermost array.
    pub fn element_byte_size(&self) -> u64 {
        self.clone().with_top_level_array(1, 0).byte_size(1)
    }
}

impl fmt::Display for BufferVarLayoutEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: type: {}, block: {}, offset: {}, array size: {}, array stride: {}, \
             matrix stride: {}, top-level array size: {}, top-level array stride: {}, \
             row major: {}",
            self.name,
            self.ty,
            self.block_index,
            self.offset,
            self.array_size,
            self.array_stride,
            self.matrix_stride,
            self.top_level_array_size,
            self.top_level_array_stride,
            self.is_row_major
        )
    }
}

/// Layout of one block instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockLayoutEntry {
    /// Block name, with `[i]` appended for instance arrays.
    pub name: String,
    /// Size in bytes, excluding the elements of a runtime-sized array.
    pub size: u32,
    /// Indices into [`BufferLayout::buffer_vars`] of the block's variables.
    pub active_var_indices: Vec<usize>,
}

impl BlockLayoutEntry {
    pub fn new(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            size,
            active_var_indices: Vec::new(),
        }
    }
}

impl fmt::Display for BlockLayoutEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: size: {}, active variables: {:?}",
            self.name, self.size, self.active_var_indices
        )
    }
}

/// Flattened layout of every block and buffer variable of an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferLayout {
    pub blocks: Vec<BlockLayoutEntry>,
    pub buffer_vars: Vec<BufferVarLayoutEntry>,
}

impl BufferLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the block entry named `name`.
    pub fn block_index(&self, name: &str) -> Option<usize> {
        self.blocks.iter().position(|block| block.name == name)
    }

    /// Index of the variable entry named `name`.
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.buffer_vars.iter().position(|var| var.name == name)
    }

    /// Entries of the active variables of block `block_index`.
    pub fn block_variables(
        &self,
        block_index: usize,
    ) -> impl Iterator<Item = (usize, &BufferVarLayoutEntry)> {
        self.blocks
            .get(block_index)
            .map(|block| block.active_var_indices.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&index| self.buffer_vars.get(index).map(|var| (index, var)))
    }

    /// Stride of the runtime-sized array of a block, 0 if it has none.
    pub fn unsized_array_stride(&self, block_index: usize) -> u32 {
        self.block_variables(block_index)
            .find_map(|(_, var)| var.unsized_stride())
            .unwrap_or(0)
    }

    /// Bytes needed for one instance of a block whose runtime-sized array
    /// holds `unsized_len` elements.
    pub fn block_data_size(&self, block_index: usize, unsized_len: u32) -> u64 {
        let Some(block) = self.blocks.get(block_index) else {
            return 0;
        };
        block.size as u64 + unsized_len as u64 * self.unsized_array_stride(block_index) as u64
    }
}

impl fmt::Display for BufferLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, block) in self.blocks.iter().enumerate() {
            writeln!(f, "block {index}: {block}")?;
        }
        for (index, var) in self.buffer_vars.iter().enumerate() {
            writeln!(f, "  var {index}: {var}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_offsets_follow_majorness() {
        let column =
            BufferVarLayoutEntry::new("m", BasicType::mat(2, 3), 0, 0).with_matrix(16, false);
        assert_eq!(column.component_offsets(), vec![0, 4, 8, 16, 20, 24]);

        let row = BufferVarLayoutEntry::new("m", BasicType::mat(2, 3), 0, 0).with_matrix(16, true);
        assert_eq!(row.component_offsets(), vec![0, 16, 32, 4, 20, 36]);
    }

    #[test]
    fn test_element_offsets_with_top_level_array() {
        let entry = BufferVarLayoutEntry::new("s[0].a[0]", BasicType::FLOAT, 0, 8)
            .with_array(2, 4)
            .with_top_level_array(2, 32);
        assert_eq!(entry.element_offsets(0), vec![8, 12, 40, 44]);
        assert_eq!(entry.byte_size(0), 40);
    }

    #[test]
    fn test_unsized_entry_resolution() {
        let entry = BufferVarLayoutEntry::new("data[0]", BasicType::FLOAT, 0, 16).with_array(0, 4);
        assert!(entry.is_unsized());
        assert_eq!(entry.unsized_stride(), Some(4));
        assert_eq!(entry.element_offsets(3), vec![16, 20, 24]);
    }

    #[test]
    fn test_block_data_size_includes_unsized_elements() {
        let mut layout = BufferLayout::new();
        let mut block = BlockLayoutEntry::new("Block", 16);
        block.active_var_indices = vec![0, 1];
        layout.blocks.push(block);
        layout
            .buffer_vars
            .push(BufferVarLayoutEntry::new("a", BasicType::VEC4, 0, 0));
        layout
            .buffer_vars
            .push(BufferVarLayoutEntry::new("data[0]", BasicType::FLOAT, 0, 16).with_array(0, 4));

        assert_eq!(layout.unsized_array_stride(0), 4);
        assert_eq!(layout.block_data_size(0, 5), 36);
        assert_eq!(layout.variable_index("data[0]"), Some(1));
        assert_eq!(layout.block_index("Missing"), None);
    }
}
