//! Recursive variable types: basic types, arrays and named structs.

use std::fmt;

use super::BasicType;

/// Size of an array dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArraySize {
    /// Fixed element count.
    Sized(u32),
    /// Runtime-sized array; only legal as the outermost dimension of the
    /// last member of a block.
    Unsized,
}

impl fmt::Display for ArraySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sized(size) => write!(f, "[{size}]"),
            Self::Unsized => f.write_str("[]"),
        }
    }
}

/// Type of a buffer variable or struct member.
///
/// Structs are referenced by name and resolved through the owning
/// [`ShaderInterface`](crate::ShaderInterface).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VarType {
    /// Scalar, vector or matrix.
    Basic(BasicType),
    /// Array of `element`.
    Array {
        /// Element type.
        element: Box<VarType>,
        /// Number of elements.
        size: ArraySize,
    },
    /// Reference to a named struct.
    Struct(String),
}

impl VarType {
    /// A basic type.
    pub fn basic(ty: BasicType) -> Self {
        Self::Basic(ty)
    }

    /// A sized array of `element`.
    pub fn array(element: VarType, size: u32) -> Self {
        Self::Array {
            element: Box::new(element),
            size: ArraySize::Sized(size),
        }
    }

    /// A runtime-sized array of `element`.
    pub fn unsized_array(element: VarType) -> Self {
        Self::Array {
            element: Box::new(element),
            size: ArraySize::Unsized,
        }
    }

    /// A reference to the struct named `name`.
    pub fn structure(name: impl Into<String>) -> Self {
        Self::Struct(name.into())
    }

    pub fn is_basic(&self) -> bool {
        matches!(self, Self::Basic(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct(_))
    }

    /// Whether the outermost dimension is runtime-sized.
    pub fn is_unsized_array(&self) -> bool {
        matches!(
            self,
            Self::Array {
                size: ArraySize::Unsized,
                ..
            }
        )
    }

    /// Element type of an array.
    pub fn element_type(&self) -> Option<&VarType> {
        match self {
            Self::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Whether any dimension below the outermost one is runtime-sized.
    pub fn has_nested_unsized_array(&self) -> bool {
        match self {
            Self::Array { element, .. } => element.contains_unsized_array(),
            _ => false,
        }
    }

    /// Whether any dimension, at any depth of this type expression, is
    /// runtime-sized. Struct references are not followed.
    pub fn contains_unsized_array(&self) -> bool {
        match self {
            Self::Basic(_) | Self::Struct(_) => false,
            Self::Array { element, size } => {
                *size == ArraySize::Unsized || element.contains_unsized_array()
            }
        }
    }

    /// Names of structs referenced directly by this type expression.
    pub fn struct_references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_struct_references(&mut refs);
        refs
    }

    fn collect_struct_references<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            Self::Basic(_) => {}
            Self::Array { element, .. } => element.collect_struct_references(refs),
            Self::Struct(name) => refs.push(name),
        }
    }

    /// Innermost non-array type.
    pub fn base_type(&self) -> &VarType {
        match self {
            Self::Array { element, .. } => element.base_type(),
            other => other,
        }
    }
}

impl From<BasicType> for VarType {
    fn from(ty: BasicType) -> Self {
        Self::Basic(ty)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base_type() {
            Self::Basic(ty) => write!(f, "{ty}")?,
            Self::Struct(name) => f.write_str(name)?,
            Self::Array { .. } => unreachable!("base_type never returns an array"),
        }
        let mut current = self;
        while let Self::Array { element, size } = current {
            write!(f, "{size}")?;
            current = element;
        }
        Ok(())
    }
}

/// A named member of a struct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructMember {
    pub name: String,
    pub ty: VarType,
}

/// A named struct definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructType {
    name: String,
    members: Vec<StructMember>,
}

impl StructType {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Struct type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[StructMember] {
        &self.members
    }

    pub(crate) fn push_member(&mut self, name: String, ty: VarType) {
        self.members.push(StructMember { name, ty });
    }
}
