//! Basic (non-aggregate) GLSL value types.

use std::fmt;

/// Scalar component kind of a basic type.
///
/// All kinds occupy one 32-bit word in buffer memory; `bool` is stored as a
/// 32-bit integer where any non-zero value means `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// 32-bit IEEE float.
    Float,
    /// 32-bit signed integer.
    Int,
    /// 32-bit unsigned integer.
    Uint,
    /// Boolean stored as a 32-bit word.
    Bool,
}

impl ScalarKind {
    /// Size in bytes of one component.
    pub const BYTE_SIZE: u32 = 4;

    /// All scalar kinds, in declaration order.
    pub const ALL: [ScalarKind; 4] = [Self::Float, Self::Int, Self::Uint, Self::Bool];

    /// GLSL keyword for the scalar type.
    pub fn glsl_name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Bool => "bool",
        }
    }

    /// Prefix of the GLSL vector type name (`vec`, `ivec`, `uvec`, `bvec`).
    fn vector_prefix(self) -> &'static str {
        match self {
            Self::Float => "",
            Self::Int => "i",
            Self::Uint => "u",
            Self::Bool => "b",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl_name())
    }
}

/// A scalar, vector or matrix type.
///
/// Matrices are always float matrices, `columns` x `rows` (GLSL `matCxR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicType {
    /// A single scalar.
    Scalar(ScalarKind),
    /// A vector of 2 to 4 components.
    Vector(ScalarKind, u8),
    /// A float matrix with 2 to 4 columns and rows.
    Matrix {
        /// Number of columns.
        columns: u8,
        /// Number of rows.
        rows: u8,
    },
}

impl BasicType {
    pub const FLOAT: Self = Self::Scalar(ScalarKind::Float);
    pub const INT: Self = Self::Scalar(ScalarKind::Int);
    pub const UINT: Self = Self::Scalar(ScalarKind::Uint);
    pub const BOOL: Self = Self::Scalar(ScalarKind::Bool);
    pub const VEC2: Self = Self::Vector(ScalarKind::Float, 2);
    pub const VEC3: Self = Self::Vector(ScalarKind::Float, 3);
    pub const VEC4: Self = Self::Vector(ScalarKind::Float, 4);
    pub const IVEC2: Self = Self::Vector(ScalarKind::Int, 2);
    pub const IVEC3: Self = Self::Vector(ScalarKind::Int, 3);
    pub const IVEC4: Self = Self::Vector(ScalarKind::Int, 4);
    pub const UVEC2: Self = Self::Vector(ScalarKind::Uint, 2);
    pub const UVEC3: Self = Self::Vector(ScalarKind::Uint, 3);
    pub const UVEC4: Self = Self::Vector(ScalarKind::Uint, 4);
    pub const BVEC2: Self = Self::Vector(ScalarKind::Bool, 2);
    pub const BVEC3: Self = Self::Vector(ScalarKind::Bool, 3);
    pub const BVEC4: Self = Self::Vector(ScalarKind::Bool, 4);
    pub const MAT2: Self = Self::mat(2, 2);
    pub const MAT3: Self = Self::mat(3, 3);
    pub const MAT4: Self = Self::mat(4, 4);

    /// Create a `columns` x `rows` float matrix type.
    pub const fn mat(columns: u8, rows: u8) -> Self {
        Self::Matrix { columns, rows }
    }

    /// Create a scalar (`size == 1`) or vector type.
    pub const fn vec(kind: ScalarKind, size: u8) -> Self {
        if size == 1 {
            Self::Scalar(kind)
        } else {
            Self::Vector(kind, size)
        }
    }

    /// Check that vector and matrix dimensions are within 2..=4.
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Scalar(_) => true,
            Self::Vector(_, size) => (2..=4).contains(&size),
            Self::Matrix { columns, rows } => (2..=4).contains(&columns) && (2..=4).contains(&rows),
        }
    }

    /// Scalar kind of each component.
    pub fn scalar_kind(&self) -> ScalarKind {
        match *self {
            Self::Scalar(kind) | Self::Vector(kind, _) => kind,
            Self::Matrix { .. } => ScalarKind::Float,
        }
    }

    /// Total number of scalar components.
    pub fn component_count(&self) -> u32 {
        match *self {
            Self::Scalar(_) => 1,
            Self::Vector(_, size) => size as u32,
            Self::Matrix { columns, rows } => columns as u32 * rows as u32,
        }
    }

    /// Whether this is a matrix type.
    pub fn is_matrix(&self) -> bool {
        matches!(self, Self::Matrix { .. })
    }

    /// Number of matrix columns (1 for non-matrices).
    pub fn matrix_columns(&self) -> u32 {
        match *self {
            Self::Matrix { columns, .. } => columns as u32,
            _ => 1,
        }
    }

    /// Number of matrix rows (1 for non-matrices).
    pub fn matrix_rows(&self) -> u32 {
        match *self {
            Self::Matrix { rows, .. } => rows as u32,
            _ => 1,
        }
    }

    /// Tightly packed size in bytes.
    pub fn byte_size(&self) -> u32 {
        self.component_count() * ScalarKind::BYTE_SIZE
    }

    /// Decompose into `(vector_count, vector_size)` as stored in memory.
    ///
    /// A column-major matrix is a sequence of column vectors (`rows`
    /// components each); a row-major one is a sequence of row vectors.
    /// Scalars and vectors are a single vector.
    pub fn memory_vectors(&self, row_major: bool) -> (u32, u32) {
        match *self {
            Self::Matrix { columns, rows } if row_major => (rows as u32, columns as u32),
            Self::Matrix { columns, rows } => (columns as u32, rows as u32),
            _ => (1, self.component_count()),
        }
    }

    /// Natural byte alignment of a scalar or vector with `size` components.
    ///
    /// Two-component vectors align to their size; three- and four-component
    /// vectors align as four components.
    pub fn vector_alignment(size: u32) -> u32 {
        match size {
            1 => ScalarKind::BYTE_SIZE,
            2 => 2 * ScalarKind::BYTE_SIZE,
            _ => 4 * ScalarKind::BYTE_SIZE,
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Vector(kind, size) => write!(f, "{}vec{size}", kind.vector_prefix()),
            Self::Matrix { columns, rows } if columns == rows => write!(f, "mat{columns}"),
            Self::Matrix { columns, rows } => write!(f, "mat{columns}x{rows}"),
        }
    }
}
