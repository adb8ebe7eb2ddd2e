//! Layout, majorness and access qualifiers.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Qualifiers attached to buffer blocks and buffer variables.
    ///
    /// Member flags are merged over block flags with [`LayoutFlags::merge`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayoutFlags: u32 {
        /// `layout(shared)`.
        const SHARED = 1 << 0;
        /// `layout(packed)`.
        const PACKED = 1 << 1;
        /// `layout(std140)`.
        const STD140 = 1 << 2;
        /// `layout(std430)`.
        const STD430 = 1 << 3;
        /// `layout(row_major)`.
        const ROW_MAJOR = 1 << 4;
        /// `layout(column_major)`. Lack of both majorness flags means column-major.
        const COLUMN_MAJOR = 1 << 5;
        /// Variable is read by the program under test.
        const ACCESS_READ = 1 << 11;
        /// Variable is written by the program under test.
        const ACCESS_WRITE = 1 << 12;

        const PACKING_MASK = Self::SHARED.bits()
            | Self::PACKED.bits()
            | Self::STD140.bits()
            | Self::STD430.bits();
        const MATRIX_MASK = Self::ROW_MAJOR.bits() | Self::COLUMN_MAJOR.bits();
        const ACCESS_MASK = Self::ACCESS_READ.bits() | Self::ACCESS_WRITE.bits();
    }
}

impl Default for LayoutFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl LayoutFlags {
    /// Merge member flags over block (or enclosing) flags.
    ///
    /// Packing bits of `member` replace the packing bits of `self` when any
    /// is set; the same holds for majorness bits. Access bits come from
    /// `member` only.
    pub fn merge(self, member: LayoutFlags) -> LayoutFlags {
        let mut merged = self & (Self::PACKING_MASK | Self::MATRIX_MASK);
        if member.intersects(Self::PACKING_MASK) {
            merged.remove(Self::PACKING_MASK);
            merged |= member & Self::PACKING_MASK;
        }
        if member.intersects(Self::MATRIX_MASK) {
            merged.remove(Self::MATRIX_MASK);
            merged |= member & Self::MATRIX_MASK;
        }
        merged | (member & Self::ACCESS_MASK)
    }

    /// Effective packing rule, or `None` if more than one packing bit is set.
    ///
    /// No packing bit selects [`PackingRule::Shared`], the GLSL default.
    pub fn packing(self) -> Option<PackingRule> {
        let packing = self & Self::PACKING_MASK;
        if packing.is_empty() {
            Some(PackingRule::Shared)
        } else if packing == Self::SHARED {
            Some(PackingRule::Shared)
        } else if packing == Self::PACKED {
            Some(PackingRule::Packed)
        } else if packing == Self::STD140 {
            Some(PackingRule::Std140)
        } else if packing == Self::STD430 {
            Some(PackingRule::Std430)
        } else {
            None
        }
    }

    /// Whether both majorness flags are set.
    pub fn has_conflicting_majorness(self) -> bool {
        self.contains(Self::MATRIX_MASK)
    }

    /// Effective majorness; column-major unless `ROW_MAJOR` is set.
    pub fn is_row_major(self) -> bool {
        self.contains(Self::ROW_MAJOR)
    }

    /// Whether the program under test writes the variable.
    pub fn is_written(self) -> bool {
        self.contains(Self::ACCESS_WRITE)
    }
}

/// Packing rule governing alignment and padding of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackingRule {
    /// Implementation-defined layout, stable across programs.
    #[default]
    Shared,
    /// Implementation-defined layout, unused members may be eliminated.
    Packed,
    /// Standard layout with 16-byte rounding of array, struct and matrix
    /// alignment.
    Std140,
    /// Standard layout with natural alignment.
    Std430,
}

impl PackingRule {
    /// Corresponding qualifier flag.
    pub fn flag(self) -> LayoutFlags {
        match self {
            Self::Shared => LayoutFlags::SHARED,
            Self::Packed => LayoutFlags::PACKED,
            Self::Std140 => LayoutFlags::STD140,
            Self::Std430 => LayoutFlags::STD430,
        }
    }

    /// Whether reported offsets must match the reference byte-for-byte.
    pub fn is_standard(self) -> bool {
        matches!(self, Self::Std140 | Self::Std430)
    }

    /// Whether array, struct and matrix alignments round up to 16 bytes.
    pub fn rounds_to_vec4(self) -> bool {
        self == Self::Std140
    }
}

impl fmt::Display for PackingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shared => "shared",
            Self::Packed => "packed",
            Self::Std140 => "std140",
            Self::Std430 => "std430",
        })
    }
}
