//! Buffer variables, buffer blocks and the shader interface that owns them.
//!
//! A [`ShaderInterface`] is built once per test case and is read-only
//! afterwards. Structs and blocks are addressed by handles returned from the
//! `alloc_*` methods; struct members may only reference structs registered
//! before the struct being extended, which rules out recursive types at
//! registration time.

use std::fmt;

use crate::error::{LayoutError, LayoutResult};
use crate::flags::LayoutFlags;
use crate::types::{ArraySize, StructType, VarType};

/// A variable declared inside a buffer block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferVar {
    name: String,
    ty: VarType,
    flags: LayoutFlags,
}

impl BufferVar {
    /// Create a new buffer variable.
    pub fn new(name: impl Into<String>, ty: impl Into<VarType>, flags: LayoutFlags) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            flags,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &VarType {
        &self.ty
    }

    /// Flags as declared on the variable, before merging with block flags.
    pub fn flags(&self) -> LayoutFlags {
        self.flags
    }
}

/// A buffer block declaration, optionally instanced as an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferBlock {
    block_name: String,
    instance_name: Option<String>,
    variables: Vec<BufferVar>,
    array_size: u32,
    last_unsized_array_sizes: Vec<Option<u32>>,
    flags: LayoutFlags,
}

impl BufferBlock {
    fn new(block_name: String) -> Self {
        Self {
            block_name,
            instance_name: None,
            variables: Vec::new(),
            array_size: 0,
            last_unsized_array_sizes: vec![None],
            flags: LayoutFlags::empty(),
        }
    }

    pub fn block_name(&self) -> &str {
        &self.block_name
    }

    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name.as_deref()
    }

    /// Whether the block is declared as an instance array.
    pub fn is_array(&self) -> bool {
        self.array_size > 0
    }

    /// Instance array size, 0 if the block is not an array.
    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    /// Number of block instances (1 for non-array blocks).
    pub fn instance_count(&self) -> u32 {
        self.array_size.max(1)
    }

    pub fn flags(&self) -> LayoutFlags {
        self.flags
    }

    /// Members in declaration order.
    pub fn variables(&self) -> &[BufferVar] {
        &self.variables
    }

    /// Whether the last member is a runtime-sized array.
    pub fn has_unsized_array(&self) -> bool {
        self.variables
            .last()
            .is_some_and(|var| var.ty().is_unsized_array())
    }

    /// Runtime length of the trailing unsized array for `instance`.
    pub fn last_unsized_array_size(&self, instance: u32) -> Option<u32> {
        self.last_unsized_array_sizes
            .get(instance as usize)
            .copied()
            .flatten()
    }

    pub fn set_instance_name(&mut self, name: impl Into<String>) {
        self.instance_name = Some(name.into());
    }

    pub fn set_flags(&mut self, flags: LayoutFlags) {
        self.flags = flags;
    }

    /// Append a member. Declaration order determines offsets.
    pub fn add_member(&mut self, var: BufferVar) {
        self.variables.push(var);
    }

    /// Declare the block as an instance array of `array_size` (0 for none).
    ///
    /// Resets the per-instance unsized array sizes.
    pub fn set_array_size(&mut self, array_size: u32) {
        self.array_size = array_size;
        self.last_unsized_array_sizes = vec![None; array_size.max(1) as usize];
    }

    /// Supply the runtime length of the trailing unsized array for `instance`.
    pub fn set_last_unsized_array_size(&mut self, instance: u32, size: u32) -> LayoutResult<()> {
        let count = self.instance_count();
        let slot = self
            .last_unsized_array_sizes
            .get_mut(instance as usize)
            .ok_or_else(|| LayoutError::InstanceOutOfRange {
                block: self.block_name.clone(),
                instance,
                count,
            })?;
        *slot = Some(size);
        Ok(())
    }
}

/// Handle to a struct registered in a [`ShaderInterface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructHandle(pub(crate) usize);

/// Handle to a block allocated in a [`ShaderInterface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(pub(crate) usize);

impl BlockHandle {
    /// Declaration index of the block.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Owner of all struct definitions and buffer blocks of one test case.
#[derive(Debug, Clone, Default)]
pub struct ShaderInterface {
    structs: Vec<StructType>,
    blocks: Vec<BufferBlock>,
}

impl ShaderInterface {
    /// Create an empty interface.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Structs
    // ========================================================================

    /// Register a new, empty struct named `name`.
    pub fn alloc_struct(&mut self, name: impl Into<String>) -> LayoutResult<StructHandle> {
        let name = name.into();
        if self.find_struct(&name).is_some() {
            return Err(LayoutError::DuplicateStruct(name));
        }
        self.structs.push(StructType::new(name));
        Ok(StructHandle(self.structs.len() - 1))
    }

    /// Append a member to a registered struct.
    ///
    /// The member type may only reference structs registered before
    /// `handle`, and may not contain runtime-sized arrays.
    pub fn add_struct_member(
        &mut self,
        handle: StructHandle,
        name: impl Into<String>,
        ty: impl Into<VarType>,
    ) -> LayoutResult<()> {
        let name = name.into();
        let ty = ty.into();
        let owner = self
            .structs
            .get(handle.0)
            .ok_or(LayoutError::InvalidStructHandle(handle.0))?
            .name()
            .to_string();

        if ty.contains_unsized_array() {
            return Err(LayoutError::UnsizedArrayInStruct { owner, member: name });
        }
        validate_var_type(&ty, &format!("{owner}.{name}"))?;
        for referenced in ty.struct_references() {
            match self.struct_index(referenced) {
                None => {
                    return Err(LayoutError::UnresolvedStruct {
                        name: referenced.to_string(),
                        context: format!("{owner}.{name}"),
                    })
                }
                Some(index) if index >= handle.0 => {
                    return Err(LayoutError::ForwardStructReference {
                        owner,
                        referenced: referenced.to_string(),
                    })
                }
                Some(_) => {}
            }
        }

        self.structs[handle.0].push_member(name, ty);
        Ok(())
    }

    /// Look up a struct by name.
    pub fn find_struct(&self, name: &str) -> Option<&StructType> {
        self.structs.iter().find(|s| s.name() == name)
    }

    fn struct_index(&self, name: &str) -> Option<usize> {
        self.structs.iter().position(|s| s.name() == name)
    }

    /// Get a struct by handle.
    pub fn struct_type(&self, handle: StructHandle) -> Option<&StructType> {
        self.structs.get(handle.0)
    }

    /// All named structs in registration order.
    pub fn named_structs(&self) -> impl Iterator<Item = &StructType> {
        self.structs.iter()
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    /// Allocate a new, empty block named `name`.
    pub fn alloc_block(&mut self, name: impl Into<String>) -> LayoutResult<BlockHandle> {
        let name = name.into();
        if self.blocks.iter().any(|b| b.block_name() == name) {
            return Err(LayoutError::DuplicateBlock(name));
        }
        self.blocks.push(BufferBlock::new(name));
        Ok(BlockHandle(self.blocks.len() - 1))
    }

    /// Get a block by handle.
    pub fn block(&self, handle: BlockHandle) -> LayoutResult<&BufferBlock> {
        self.blocks
            .get(handle.0)
            .ok_or(LayoutError::InvalidBlockHandle(handle.0))
    }

    /// Get a block for modification while the interface is being declared.
    pub fn block_mut(&mut self, handle: BlockHandle) -> LayoutResult<&mut BufferBlock> {
        self.blocks
            .get_mut(handle.0)
            .ok_or(LayoutError::InvalidBlockHandle(handle.0))
    }

    /// All blocks in declaration order.
    pub fn blocks(&self) -> &[BufferBlock] {
        &self.blocks
    }

    /// Handles of all blocks in declaration order.
    pub fn block_handles(&self) -> impl Iterator<Item = BlockHandle> {
        (0..self.blocks.len()).map(BlockHandle)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

/// GLSL-like declarations of every struct and block.
impl fmt::Display for ShaderInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for def in &self.structs {
            writeln!(f, "struct {} {{", def.name())?;
            for member in def.members() {
                writeln!(f, "    {} {};", member.ty, member.name)?;
            }
            writeln!(f, "}};")?;
        }
        for block in &self.blocks {
            let qualifiers = layout_qualifiers(block.flags());
            if !qualifiers.is_empty() {
                write!(f, "layout({}) ", qualifiers.join(", "))?;
            }
            writeln!(f, "buffer {} {{", block.block_name())?;
            for var in block.variables() {
                f.write_str("    ")?;
                let qualifiers = layout_qualifiers(var.flags());
                if !qualifiers.is_empty() {
                    write!(f, "layout({}) ", qualifiers.join(", "))?;
                }
                let access = var.flags() & LayoutFlags::ACCESS_MASK;
                if access == LayoutFlags::ACCESS_READ {
                    f.write_str("readonly ")?;
                } else if access == LayoutFlags::ACCESS_WRITE {
                    f.write_str("writeonly ")?;
                }
                writeln!(f, "{} {};", var.ty(), var.name())?;
            }
            f.write_str("}")?;
            if let Some(instance_name) = block.instance_name() {
                write!(f, " {instance_name}")?;
                if block.is_array() {
                    write!(f, "[{}]", block.array_size())?;
                }
            }
            writeln!(f, ";")?;
        }
        Ok(())
    }
}

fn layout_qualifiers(flags: LayoutFlags) -> Vec<&'static str> {
    [
        (LayoutFlags::SHARED, "shared"),
        (LayoutFlags::PACKED, "packed"),
        (LayoutFlags::STD140, "std140"),
        (LayoutFlags::STD430, "std430"),
        (LayoutFlags::ROW_MAJOR, "row_major"),
        (LayoutFlags::COLUMN_MAJOR, "column_major"),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .map(|(_, name)| name)
    .collect()
}

/// Check basic type dimensions and sized array lengths of `ty`.
pub(crate) fn validate_var_type(ty: &VarType, context: &str) -> LayoutResult<()> {
    match ty {
        VarType::Basic(basic) if !basic.is_valid() => Err(LayoutError::InvalidBasicType {
            context: context.to_string(),
            ty: format!("{basic:?}"),
        }),
        VarType::Basic(_) | VarType::Struct(_) => Ok(()),
        VarType::Array { element, size } => {
            if *size == ArraySize::Sized(0) {
                return Err(LayoutError::ZeroSizedArray {
                    context: context.to_string(),
                });
            }
            validate_var_type(element, context)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BasicType;

    #[test]
    fn test_duplicate_names_rejected() {
        let mut interface = ShaderInterface::new();
        interface.alloc_struct("S").unwrap();
        assert!(matches!(
            interface.alloc_struct("S"),
            Err(LayoutError::DuplicateStruct(name)) if name == "S"
        ));

        interface.alloc_block("Block").unwrap();
        assert!(matches!(
            interface.alloc_block("Block"),
            Err(LayoutError::DuplicateBlock(_))
        ));
    }

    #[test]
    fn test_struct_may_only_reference_earlier_structs() {
        let mut interface = ShaderInterface::new();
        let a = interface.alloc_struct("A").unwrap();
        let b = interface.alloc_struct("B").unwrap();

        interface
            .add_struct_member(b, "a", VarType::structure("A"))
            .unwrap();

        // Self reference and reference to a later struct would allow cycles.
        assert!(matches!(
            interface.add_struct_member(a, "a", VarType::structure("A")),
            Err(LayoutError::ForwardStructReference { .. })
        ));
        assert!(matches!(
            interface.add_struct_member(a, "b", VarType::array(VarType::structure("B"), 2)),
            Err(LayoutError::ForwardStructReference { .. })
        ));
        assert!(matches!(
            interface.add_struct_member(a, "c", VarType::structure("Missing")),
            Err(LayoutError::UnresolvedStruct { .. })
        ));
    }

    #[test]
    fn test_struct_rejects_unsized_member() {
        let mut interface = ShaderInterface::new();
        let s = interface.alloc_struct("S").unwrap();
        let result =
            interface.add_struct_member(s, "data", VarType::unsized_array(BasicType::FLOAT.into()));
        assert!(matches!(result, Err(LayoutError::UnsizedArrayInStruct { .. })));
        assert!(interface.find_struct("S").unwrap().members().is_empty());
    }

    #[test]
    fn test_block_unsized_sizes_follow_array_size() {
        let mut interface = ShaderInterface::new();
        let handle = interface.alloc_block("Block").unwrap();
        let block = interface.block_mut(handle).unwrap();
        assert_eq!(block.instance_count(), 1);
        block.set_last_unsized_array_size(0, 5).unwrap();
        assert_eq!(block.last_unsized_array_size(0), Some(5));

        block.set_array_size(3);
        assert_eq!(block.instance_count(), 3);
        assert_eq!(block.last_unsized_array_size(0), None);
        block.set_last_unsized_array_size(2, 7).unwrap();
        assert!(matches!(
            block.set_last_unsized_array_size(3, 1),
            Err(LayoutError::InstanceOutOfRange { count: 3, .. })
        ));
    }

    #[test]
    fn test_block_enumeration_order() {
        let mut interface = ShaderInterface::new();
        for name in ["First", "Second", "Third"] {
            interface.alloc_block(name).unwrap();
        }
        let names: Vec<_> = interface.blocks().iter().map(|b| b.block_name()).collect();
        assert_eq!(names, ["First", "Second", "Third"]);
        assert_eq!(interface.block_handles().count(), 3);
    }

    #[test]
    fn test_display_declarations() {
        let mut interface = ShaderInterface::new();
        let s = interface.alloc_struct("S").unwrap();
        interface
            .add_struct_member(s, "v", VarType::array(BasicType::VEC3.into(), 2))
            .unwrap();
        let handle = interface.alloc_block("Block").unwrap();
        let block = interface.block_mut(handle).unwrap();
        block.set_flags(LayoutFlags::STD430 | LayoutFlags::ROW_MAJOR);
        block.set_instance_name("blocks");
        block.set_array_size(2);
        block.add_member(BufferVar::new("s", VarType::structure("S"), LayoutFlags::ACCESS_READ));
        block.add_member(BufferVar::new(
            "m",
            BasicType::MAT2,
            LayoutFlags::ACCESS_MASK | LayoutFlags::COLUMN_MAJOR,
        ));

        assert_eq!(
            interface.to_string(),
            "struct S {\n    vec3[2] v;\n};\n\
             layout(std430, row_major) buffer Block {\n    \
             readonly S s;\n    \
             layout(column_major) mat2 m;\n\
             } blocks[2];\n"
        );
    }
}
