//! Reference layout computation.
//!
//! Walks the members of each block in declaration order with a running byte
//! cursor, aligning every value to its base alignment under the effective
//! packing rule:
//!
//! - scalars align to 4 bytes, two-component vectors to 8, three- and
//!   four-component vectors to 16;
//! - a matrix is an array of column vectors (row vectors when row-major),
//!   aligned as that vector;
//! - arrays align as their element, structs as their most aligned member;
//! - under std140 matrix, array and struct alignments round up to 16.
//!
//! Shared and packed blocks use natural (std430) alignment as reference.

use log::{debug, trace};

use super::{BlockLayoutEntry, BufferLayout, BufferVarLayoutEntry};
use crate::error::{LayoutError, LayoutResult};
use crate::flags::{LayoutFlags, PackingRule};
use crate::interface::{validate_var_type, BlockHandle, BufferBlock, BufferVar, ShaderInterface};
use crate::types::{ArraySize, BasicType, ScalarKind, VarType};

/// Alignment of a four-component vector; the std140 rounding unit.
pub const VEC4_ALIGNMENT: u32 = 4 * ScalarKind::BYTE_SIZE;

/// Round `value` up to a multiple of `alignment`.
pub fn align_up(value: u32, alignment: u32) -> u32 {
    if alignment == 0 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

/// Where a reference variable entry was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarSource {
    /// Declaring block.
    pub block: BlockHandle,
    /// Index of the top-level member inside the block.
    pub member: usize,
}

/// One instance of a declared block in the reference layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockInstance {
    /// Declaring block.
    pub block: BlockHandle,
    /// Instance index (0 for non-array blocks).
    pub instance: u32,
    /// Runtime length of the trailing unsized array (0 if none).
    pub last_unsized_array_size: u32,
    /// Packing rule of the block.
    pub rule: PackingRule,
}

/// Reference layout of a single block declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReference {
    /// Block-level packing rule.
    pub rule: PackingRule,
    /// Variable entries; `block_index` is 0 until assembled into a
    /// [`ReferenceLayout`].
    pub entries: Vec<BufferVarLayoutEntry>,
    /// Index of the declaring top-level member for each entry.
    pub members: Vec<usize>,
    /// Size in bytes excluding runtime-sized array elements.
    pub size: u32,
    /// Stride of the runtime-sized trailing array, 0 if none.
    pub unsized_array_stride: u32,
    /// Total byte size of each instance.
    pub instance_sizes: Vec<u64>,
}

/// Reference layout of a whole interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceLayout {
    layout: BufferLayout,
    sources: Vec<VarSource>,
    instances: Vec<BlockInstance>,
}

impl ReferenceLayout {
    /// The flattened layout, in the same shape an implementation reports.
    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    /// Declaration that produced variable entry `var_index`.
    pub fn source(&self, var_index: usize) -> Option<VarSource> {
        self.sources.get(var_index).copied()
    }

    /// Block instance described by block entry `block_index`.
    pub fn instance(&self, block_index: usize) -> Option<&BlockInstance> {
        self.instances.get(block_index)
    }

    /// All block instances, parallel to `layout().blocks`.
    pub fn instances(&self) -> &[BlockInstance] {
        &self.instances
    }

    /// Runtime unsized array length of each block entry.
    pub fn unsized_array_sizes(&self) -> Vec<u32> {
        self.instances
            .iter()
            .map(|instance| instance.last_unsized_array_size)
            .collect()
    }

    /// Total byte size of block entry `block_index`.
    pub fn block_data_size(&self, block_index: usize) -> u64 {
        let unsized_len = self
            .instance(block_index)
            .map_or(0, |instance| instance.last_unsized_array_size);
        self.layout.block_data_size(block_index, unsized_len)
    }

    /// Block entry indices belonging to the block declaration `handle`.
    pub fn block_entries(&self, handle: BlockHandle) -> impl Iterator<Item = usize> + '_ {
        self.instances
            .iter()
            .enumerate()
            .filter(move |(_, instance)| instance.block == handle)
            .map(|(index, _)| index)
    }
}

/// Computes reference layouts for the blocks of a [`ShaderInterface`].
#[derive(Debug, Clone, Copy)]
pub struct LayoutComputer<'a> {
    interface: &'a ShaderInterface,
    default_flags: LayoutFlags,
}

impl<'a> LayoutComputer<'a> {
    /// Create a computer using GLSL defaults (shared, column-major) for
    /// blocks that specify no packing or majorness.
    pub fn new(interface: &'a ShaderInterface) -> Self {
        Self {
            interface,
            default_flags: LayoutFlags::empty(),
        }
    }

    /// Packing and majorness applied beneath every block's own flags.
    pub fn with_default_flags(mut self, flags: LayoutFlags) -> Self {
        self.default_flags = flags & (LayoutFlags::PACKING_MASK | LayoutFlags::MATRIX_MASK);
        self
    }

    /// Compute the reference layout of every block in declaration order.
    pub fn compute(&self) -> LayoutResult<ReferenceLayout> {
        let mut layout = BufferLayout::new();
        let mut sources = Vec::new();
        let mut instances = Vec::new();

        for handle in self.interface.block_handles() {
            let block = self.interface.block(handle)?;
            let reference = self.compute_block(handle)?;
            let block_index = layout.blocks.len();
            let first_var = layout.buffer_vars.len();

            for (mut entry, member) in reference.entries.into_iter().zip(reference.members) {
                entry.block_index = block_index;
                layout.buffer_vars.push(entry);
                sources.push(VarSource { block: handle, member });
            }
            let var_indices: Vec<usize> = (first_var..layout.buffer_vars.len()).collect();

            for instance in 0..block.instance_count() {
                let name = if block.is_array() {
                    format!("{}[{instance}]", block.block_name())
                } else {
                    block.block_name().to_string()
                };
                let mut entry = BlockLayoutEntry::new(name, reference.size);
                entry.active_var_indices = var_indices.clone();
                layout.blocks.push(entry);
                instances.push(BlockInstance {
                    block: handle,
                    instance,
                    last_unsized_array_size: block.last_unsized_array_size(instance).unwrap_or(0),
                    rule: reference.rule,
                });
            }
        }

        debug!(
            "Computed reference layout: {} block entries, {} variables",
            layout.blocks.len(),
            layout.buffer_vars.len()
        );
        Ok(ReferenceLayout {
            layout,
            sources,
            instances,
        })
    }

    /// Compute the reference layout of one block.
    pub fn compute_block(&self, handle: BlockHandle) -> LayoutResult<BlockReference> {
        let block = self.interface.block(handle)?;
        let block_flags = self.block_flags(block)?;
        let rule = block_flags
            .packing()
            .ok_or_else(|| LayoutError::ConflictingPackingFlags {
                context: block.block_name().to_string(),
            })?;
        self.validate_block(block, block_flags)?;

        let prefix = match block.instance_name() {
            Some(_) => format!("{}.", block.block_name()),
            None => String::new(),
        };

        let mut entries = Vec::new();
        let mut members = Vec::new();
        let mut cursor = 0u32;
        let mut block_alignment = 1u32;
        for (member, var) in block.variables().iter().enumerate() {
            let flags = block_flags.merge(var.flags());
            block_alignment = block_alignment.max(self.base_alignment(var.ty(), flags)?);
            let first = entries.len();
            cursor += self.layout_buffer_var(&mut entries, cursor, &prefix, var, flags)?;
            members.extend(std::iter::repeat(member).take(entries.len() - first));
        }

        // A runtime-sized array ends the block at its first element; other
        // blocks are padded like a struct.
        let size = if block.has_unsized_array() {
            cursor
        } else {
            align_up(cursor, block_alignment)
        };

        let unsized_array_stride = entries
            .iter()
            .find_map(BufferVarLayoutEntry::unsized_stride)
            .unwrap_or(0);
        let mut instance_sizes = Vec::with_capacity(block.instance_count() as usize);
        for instance in 0..block.instance_count() {
            let unsized_len = match block.last_unsized_array_size(instance) {
                Some(len) => len,
                None if block.has_unsized_array() => {
                    return Err(LayoutError::MissingUnsizedArraySize {
                        block: block.block_name().to_string(),
                        instance,
                    })
                }
                None => 0,
            };
            instance_sizes.push(size as u64 + unsized_len as u64 * unsized_array_stride as u64);
        }

        debug!(
            "Block {} ({rule}): {} entries, size {size}, unsized stride {unsized_array_stride}",
            block.block_name(),
            entries.len()
        );
        for entry in &entries {
            trace!("  {entry}");
        }

        Ok(BlockReference {
            rule,
            entries,
            members,
            size,
            unsized_array_stride,
            instance_sizes,
        })
    }

    fn block_flags(&self, block: &BufferBlock) -> LayoutResult<LayoutFlags> {
        let flags = self.default_flags.merge(block.flags());
        if flags.has_conflicting_majorness() || block.flags().has_conflicting_majorness() {
            return Err(LayoutError::ConflictingMatrixFlags {
                context: block.block_name().to_string(),
            });
        }
        Ok(flags)
    }

    fn validate_block(&self, block: &BufferBlock, block_flags: LayoutFlags) -> LayoutResult<()> {
        let variables = block.variables();
        if variables.is_empty() {
            return Err(LayoutError::EmptyBlock(block.block_name().to_string()));
        }

        for (index, var) in variables.iter().enumerate() {
            let context = format!("{}.{}", block.block_name(), var.name());
            let flags = block_flags.merge(var.flags());
            if flags.packing().is_none() || var.flags().packing().is_none() {
                return Err(LayoutError::ConflictingPackingFlags { context });
            }
            if var.flags().has_conflicting_majorness() {
                return Err(LayoutError::ConflictingMatrixFlags { context });
            }
            validate_var_type(var.ty(), &context)?;
            if var.ty().has_nested_unsized_array() {
                return Err(LayoutError::NestedUnsizedArray {
                    block: block.block_name().to_string(),
                    member: var.name().to_string(),
                });
            }
            if var.ty().is_unsized_array() && index + 1 != variables.len() {
                return Err(LayoutError::UnsizedArrayNotLast {
                    block: block.block_name().to_string(),
                    member: var.name().to_string(),
                });
            }
        }
        Ok(())
    }

    // ========================================================================
    // Alignment rules
    // ========================================================================

    /// Base alignment of `ty` under the packing and majorness in `flags`.
    pub fn base_alignment(&self, ty: &VarType, flags: LayoutFlags) -> LayoutResult<u32> {
        let rule = flags.packing().unwrap_or_default();
        let round = |alignment: u32| {
            if rule.rounds_to_vec4() {
                align_up(alignment, VEC4_ALIGNMENT)
            } else {
                alignment
            }
        };

        match ty {
            VarType::Basic(basic) if basic.is_matrix() => {
                let (_, vec_size) = basic.memory_vectors(flags.is_row_major());
                Ok(round(BasicType::vector_alignment(vec_size)))
            }
            VarType::Basic(basic) => Ok(BasicType::vector_alignment(basic.component_count())),
            VarType::Array { element, .. } => Ok(round(self.base_alignment(element, flags)?)),
            VarType::Struct(name) => {
                let def = self.resolve_struct(name)?;
                let mut alignment = 0;
                for member in def.members() {
                    alignment = alignment.max(self.base_alignment(&member.ty, flags)?);
                }
                Ok(round(alignment))
            }
        }
    }

    fn resolve_struct(&self, name: &str) -> LayoutResult<&'a crate::types::StructType> {
        let def = self
            .interface
            .find_struct(name)
            .ok_or_else(|| LayoutError::UnresolvedStruct {
                name: name.to_string(),
                context: "layout computation".to_string(),
            })?;
        if def.members().is_empty() {
            return Err(LayoutError::EmptyStruct(name.to_string()));
        }
        Ok(def)
    }

    // ========================================================================
    // Layout walk
    // ========================================================================

    /// Lay out a top-level block member starting at `base_offset`.
    ///
    /// Returns the number of bytes consumed, including leading padding.
    fn layout_buffer_var(
        &self,
        entries: &mut Vec<BufferVarLayoutEntry>,
        base_offset: u32,
        prefix: &str,
        var: &BufferVar,
        flags: LayoutFlags,
    ) -> LayoutResult<u32> {
        let VarType::Array { element, size } = var.ty() else {
            let name = format!("{prefix}{}", var.name());
            return self.layout_type(entries, base_offset, &name, var.ty(), flags);
        };

        let top_level_size = match size {
            ArraySize::Sized(size) => *size,
            ArraySize::Unsized => 0,
        };
        let name = format!("{prefix}{}[0]", var.name());
        let base_alignment = self.base_alignment(var.ty(), flags)?;
        let mut cursor = align_up(base_offset, base_alignment);

        match element.as_ref() {
            VarType::Basic(basic) => {
                let entry = self.basic_array_entry(
                    &name,
                    *basic,
                    cursor,
                    top_level_size,
                    base_alignment,
                    flags,
                );
                cursor += entry.array_stride * top_level_size;
                entries.push(entry);
            }
            _ => {
                // Entries are emitted for element 0 only; the stride is known
                // once its size is, so it is patched in afterwards.
                let first = entries.len();
                let element_size = self.layout_type(entries, cursor, &name, element, flags)?;
                let stride = align_up(element_size, base_alignment);
                for entry in &mut entries[first..] {
                    entry.top_level_array_size = top_level_size;
                    entry.top_level_array_stride = stride;
                }
                if top_level_size != 0 {
                    cursor += stride * (top_level_size - 1) + element_size;
                }
            }
        }
        Ok(cursor - base_offset)
    }

    /// Lay out a value of type `ty` named `name` starting at `base_offset`.
    ///
    /// Returns the number of bytes consumed, including leading padding.
    fn layout_type(
        &self,
        entries: &mut Vec<BufferVarLayoutEntry>,
        base_offset: u32,
        name: &str,
        ty: &VarType,
        flags: LayoutFlags,
    ) -> LayoutResult<u32> {
        let base_alignment = self.base_alignment(ty, flags)?;
        let mut cursor = align_up(base_offset, base_alignment);

        match ty {
            VarType::Basic(basic) => {
                let mut entry = BufferVarLayoutEntry::new(name, *basic, 0, cursor);
                if basic.is_matrix() {
                    let (num_vecs, _) = basic.memory_vectors(flags.is_row_major());
                    entry = entry.with_matrix(base_alignment, flags.is_row_major());
                    cursor += num_vecs * base_alignment;
                } else {
                    cursor += basic.byte_size();
                }
                entries.push(entry);
            }
            VarType::Array { element, size } => {
                let ArraySize::Sized(count) = *size else {
                    return Err(LayoutError::NestedUnsizedArray {
                        block: String::new(),
                        member: name.to_string(),
                    });
                };
                match element.as_ref() {
                    VarType::Basic(basic) => {
                        let entry = self.basic_array_entry(
                            &format!("{name}[0]"),
                            *basic,
                            cursor,
                            count,
                            base_alignment,
                            flags,
                        );
                        cursor += entry.array_stride * count;
                        entries.push(entry);
                    }
                    _ => {
                        for index in 0..count {
                            let element_name = format!("{name}[{index}]");
                            cursor +=
                                self.layout_type(entries, cursor, &element_name, element, flags)?;
                        }
                    }
                }
            }
            VarType::Struct(struct_name) => {
                let def = self.resolve_struct(struct_name)?;
                for member in def.members() {
                    let member_name = format!("{name}.{}", member.name);
                    cursor +=
                        self.layout_type(entries, cursor, &member_name, &member.ty, flags)?;
                }
                cursor = align_up(cursor, base_alignment);
            }
        }
        Ok(cursor - base_offset)
    }

    /// Entry for an array of scalars, vectors or matrices whose base
    /// alignment is `alignment`.
    fn basic_array_entry(
        &self,
        name: &str,
        element: BasicType,
        offset: u32,
        count: u32,
        alignment: u32,
        flags: LayoutFlags,
    ) -> BufferVarLayoutEntry {
        let entry = BufferVarLayoutEntry::new(name, element, 0, offset);
        if element.is_matrix() {
            let (num_vecs, _) = element.memory_vectors(flags.is_row_major());
            entry
                .with_array(count, alignment * num_vecs)
                .with_matrix(alignment, flags.is_row_major())
        } else {
            entry.with_array(count, alignment)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_block(vars: Vec<BufferVar>, flags: LayoutFlags) -> (ShaderInterface, BlockHandle) {
        let mut interface = ShaderInterface::new();
        let handle = interface.alloc_block("Block").unwrap();
        let block = interface.block_mut(handle).unwrap();
        block.set_flags(flags);
        for var in vars {
            block.add_member(var);
        }
        (interface, handle)
    }

    fn var(name: &str, ty: impl Into<VarType>) -> BufferVar {
        BufferVar::new(name, ty, LayoutFlags::ACCESS_READ)
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 16), 0);
        assert_eq!(align_up(12, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_up(5, 0), 5);
    }

    #[test]
    fn test_single_vec3_std140() {
        let (interface, handle) =
            single_block(vec![var("v", BasicType::VEC3)], LayoutFlags::STD140);
        let computer = LayoutComputer::new(&interface);
        let reference = computer.compute_block(handle).unwrap();

        let alignment = computer
            .base_alignment(&BasicType::VEC3.into(), LayoutFlags::STD140)
            .unwrap();
        assert_eq!(alignment, 16);
        assert_eq!(reference.entries[0].offset, 0);
        assert_eq!(reference.size, 16);
    }

    #[test]
    fn test_mat4_then_vec3_std140() {
        let (interface, handle) = single_block(
            vec![var("a", BasicType::MAT4), var("b", BasicType::VEC3)],
            LayoutFlags::STD140,
        );
        let reference = LayoutComputer::new(&interface).compute_block(handle).unwrap();
        let a = &reference.entries[0];
        let b = &reference.entries[1];
        assert_eq!((a.offset, a.matrix_stride, a.is_row_major), (0, 16, false));
        assert_eq!(b.offset, 64);
    }

    #[test]
    fn test_vec3_followed_by_scalar_fills_padding() {
        let (interface, handle) = single_block(
            vec![var("v", BasicType::VEC3), var("f", BasicType::FLOAT)],
            LayoutFlags::STD140,
        );
        let reference = LayoutComputer::new(&interface).compute_block(handle).unwrap();
        assert_eq!(reference.entries[1].offset, 12);
        assert_eq!(reference.size, 16);
    }

    #[test]
    fn test_scalar_array_stride_by_rule() {
        for (flags, stride) in [(LayoutFlags::STD140, 16), (LayoutFlags::STD430, 4)] {
            let (interface, handle) =
                single_block(vec![var("f", VarType::array(BasicType::FLOAT.into(), 3))], flags);
            let reference = LayoutComputer::new(&interface).compute_block(handle).unwrap();
            let entry = &reference.entries[0];
            assert_eq!(entry.name, "f[0]");
            assert_eq!((entry.array_size, entry.array_stride), (3, stride));
        }
    }

    #[test]
    fn test_row_major_matrix_std430() {
        let (interface, handle) = single_block(
            vec![BufferVar::new("m", BasicType::mat(3, 2), LayoutFlags::ROW_MAJOR)],
            LayoutFlags::STD430,
        );
        let reference = LayoutComputer::new(&interface).compute_block(handle).unwrap();
        // Two rows of three components, each aligned as vec4.
        let m = &reference.entries[0];
        assert_eq!((m.matrix_stride, m.is_row_major), (16, true));
        assert_eq!(reference.size, 32);
    }

    #[test]
    fn test_unsized_trailing_array() {
        let (mut interface, handle) = single_block(
            vec![
                var("count", BasicType::UINT),
                var("data", VarType::unsized_array(BasicType::FLOAT.into())),
            ],
            LayoutFlags::STD430,
        );
        interface
            .block_mut(handle)
            .unwrap()
            .set_last_unsized_array_size(0, 5)
            .unwrap();
        let reference = LayoutComputer::new(&interface).compute_block(handle).unwrap();
        let data = &reference.entries[1];
        assert_eq!((data.offset, data.array_size, data.array_stride), (4, 0, 4));
        assert_eq!(reference.size, 4);
        assert_eq!(reference.instance_sizes, vec![24]);
    }

    #[test]
    fn test_missing_unsized_size_is_error() {
        let (interface, handle) = single_block(
            vec![var("data", VarType::unsized_array(BasicType::VEC4.into()))],
            LayoutFlags::STD430,
        );
        let result = LayoutComputer::new(&interface).compute_block(handle);
        assert!(matches!(result, Err(LayoutError::MissingUnsizedArraySize { instance: 0, .. })));
    }

    #[test]
    fn test_unsized_array_not_last_is_error() {
        let (interface, handle) = single_block(
            vec![
                var("data", VarType::unsized_array(BasicType::FLOAT.into())),
                var("tail", BasicType::FLOAT),
            ],
            LayoutFlags::STD430,
        );
        let result = LayoutComputer::new(&interface).compute_block(handle);
        assert!(matches!(result, Err(LayoutError::UnsizedArrayNotLast { .. })));
    }

    #[test]
    fn test_empty_block_is_error() {
        let (interface, handle) = single_block(Vec::new(), LayoutFlags::STD140);
        let result = LayoutComputer::new(&interface).compute_block(handle);
        assert!(matches!(result, Err(LayoutError::EmptyBlock(_))));
    }

    #[test]
    fn test_struct_member_layout() {
        let mut interface = ShaderInterface::new();
        let s = interface.alloc_struct("S").unwrap();
        interface.add_struct_member(s, "a", BasicType::FLOAT).unwrap();
        interface.add_struct_member(s, "b", BasicType::VEC2).unwrap();
        let handle = interface.alloc_block("Block").unwrap();
        let block = interface.block_mut(handle).unwrap();
        block.set_flags(LayoutFlags::STD140);
        block.add_member(var("s", VarType::structure("S")));
        block.add_member(var("f", BasicType::FLOAT));

        let reference = LayoutComputer::new(&interface).compute_block(handle).unwrap();
        let offsets: Vec<_> = reference
            .entries
            .iter()
            .map(|e| (e.name.as_str(), e.offset))
            .collect();
        // Struct aligned to 16 under std140, so `f` follows the padded struct.
        assert_eq!(offsets, vec![("s.a", 0), ("s.b", 8), ("f", 16)]);
    }

    #[test]
    fn test_top_level_array_of_structs() {
        let mut interface = ShaderInterface::new();
        let s = interface.alloc_struct("S").unwrap();
        interface.add_struct_member(s, "v", BasicType::VEC3).unwrap();
        interface.add_struct_member(s, "f", BasicType::FLOAT).unwrap();
        interface.add_struct_member(s, "i", BasicType::INT).unwrap();
        let handle = interface.alloc_block("Block").unwrap();
        let block = interface.block_mut(handle).unwrap();
        block.set_flags(LayoutFlags::STD430);
        block.add_member(var("s", VarType::array(VarType::structure("S"), 3)));
        block.add_member(var("tail", BasicType::FLOAT));

        let reference = LayoutComputer::new(&interface).compute_block(handle).unwrap();
        let names: Vec<_> = reference.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["s[0].v", "s[0].f", "s[0].i", "tail"]);
        for entry in &reference.entries[..3] {
            assert_eq!((entry.top_level_array_size, entry.top_level_array_stride), (3, 32));
        }
        // The 20-byte struct pads to 32, and the last element keeps its padding.
        assert_eq!(reference.entries[3].offset, 96);
    }

    #[test]
    fn test_instance_name_prefixes_variables() {
        let (mut interface, handle) =
            single_block(vec![var("v", BasicType::VEC4)], LayoutFlags::STD140);
        let block = interface.block_mut(handle).unwrap();
        block.set_instance_name("blockInstance");
        block.set_array_size(2);

        let reference = LayoutComputer::new(&interface).compute().unwrap();
        let layout = reference.layout();
        assert_eq!(layout.buffer_vars[0].name, "Block.v");
        let block_names: Vec<_> = layout.blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(block_names, vec!["Block[0]", "Block[1]"]);
        assert_eq!(layout.blocks[1].active_var_indices, vec![0]);
        assert_eq!(reference.block_entries(handle).count(), 2);
    }

    #[test]
    fn test_default_flags_apply_beneath_block() {
        let (interface, handle) =
            single_block(
                vec![var("f", VarType::array(BasicType::FLOAT.into(), 2))],
                LayoutFlags::empty(),
            );
        let computer = LayoutComputer::new(&interface).with_default_flags(LayoutFlags::STD140);
        let reference = computer.compute_block(handle).unwrap();
        assert_eq!(reference.rule, PackingRule::Std140);
        assert_eq!(reference.entries[0].array_stride, 16);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let (interface, _) = single_block(
            vec![var("a", BasicType::MAT3), var("b", VarType::array(BasicType::IVEC3.into(), 4))],
            LayoutFlags::STD140,
        );
        let computer = LayoutComputer::new(&interface);
        assert_eq!(computer.compute().unwrap(), computer.compute().unwrap());
    }
}
