//! Scalar values and their encoding in buffer memory.
//!
//! Every component is one native-endian 32-bit word.

use std::fmt;

use crate::types::ScalarKind;

/// Tolerance for float comparisons. Only integral values are generated, so
/// anything closer than this is the same value.
pub const FLOAT_THRESHOLD: f32 = 0.1;

/// A decoded scalar component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Float(f32),
    Int(i32),
    Uint(u32),
    Bool(bool),
}

impl Value {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Float(_) => ScalarKind::Float,
            Self::Int(_) => ScalarKind::Int,
            Self::Uint(_) => ScalarKind::Uint,
            Self::Bool(_) => ScalarKind::Bool,
        }
    }

    /// Bit pattern stored in memory. `true` is stored as 1.
    pub fn to_bits(self) -> u32 {
        match self {
            Self::Float(value) => value.to_bits(),
            Self::Int(value) => bytemuck::cast(value),
            Self::Uint(value) => value,
            Self::Bool(value) => value as u32,
        }
    }

    /// Whether two values of the same kind are considered equal.
    ///
    /// Floats compare within [`FLOAT_THRESHOLD`]; booleans compare by truth
    /// value, which decoding already normalizes.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => (a - b).abs() <= FLOAT_THRESHOLD,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Uint(a), Self::Uint(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Uint(value) => write!(f, "{value}u"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl ScalarKind {
    /// Interpret a stored bit pattern. Any non-zero word is `true`.
    pub fn decode(self, bits: u32) -> Value {
        match self {
            Self::Float => Value::Float(f32::from_bits(bits)),
            Self::Int => Value::Int(bytemuck::cast(bits)),
            Self::Uint => Value::Uint(bits),
            Self::Bool => Value::Bool(bits != 0),
        }
    }

    /// Bit pattern of `value`, or `None` if it is of another kind.
    pub fn encode(self, value: Value) -> Option<u32> {
        (value.kind() == self).then(|| value.to_bits())
    }
}

/// Read the word at `offset`, or `None` if it does not fit in `bytes`.
pub fn read_word(bytes: &[u8], offset: u64) -> Option<u32> {
    let start = usize::try_from(offset).ok()?;
    let word = bytes.get(start..start.checked_add(4)?)?;
    Some(bytemuck::pod_read_unaligned(word))
}

/// Write `bits` at `offset`. Returns `false` if the word does not fit.
pub fn write_word(bytes: &mut [u8], offset: u64, bits: u32) -> bool {
    let Ok(start) = usize::try_from(offset) else {
        return false;
    };
    let Some(end) = start.checked_add(4) else {
        return false;
    };
    match bytes.get_mut(start..end) {
        Some(word) => {
            word.copy_from_slice(bytemuck::bytes_of(&bits));
            true
        }
        None => false,
    }
}
