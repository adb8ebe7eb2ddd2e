//! Verification of an implementation against the reference layout.
//!
//! - [`validate`]: structural checks on a reported layout.
//! - [`compare`]: reported layout against the reference layout.
//! - [`content`]: buffer contents before and after execution.
//!
//! Every check collects all discrepancies it finds into a
//! [`VerificationReport`] instead of stopping at the first one.

pub mod compare;
pub mod content;
pub mod validate;

use std::fmt;

use log::warn;

use crate::error::VerificationError;

pub use compare::{compare_shared_blocks, compare_std_blocks, compare_types, LayoutComparator};
pub use content::{compare_data, copy_data, copy_non_written_data, generate_values, ContentVerifier};
pub use validate::{
    check_block_data_sizes, check_block_overlaps, check_index_queries, check_layout_bounds,
    check_layout_indices, check_overlaps,
};

/// Discrepancies collected by one or more verification passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    errors: Vec<VerificationError>,
}

impl VerificationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a discrepancy.
    pub fn push(&mut self, error: VerificationError) {
        warn!("{error}");
        self.errors.push(error);
    }

    /// Whether no discrepancy was found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[VerificationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Append the discrepancies of `other`.
    pub fn merge(&mut self, other: VerificationReport) {
        self.errors.extend(other.errors);
    }

    /// Number of discrepancies matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&VerificationError) -> bool) -> usize {
        self.errors.iter().filter(|error| predicate(error)).count()
    }

    pub fn into_errors(self) -> Vec<VerificationError> {
        self.errors
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "no discrepancies");
        }
        writeln!(f, "{} discrepancies:", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  {error}")?;
        }
        Ok(())
    }
}

impl Extend<VerificationError> for VerificationReport {
    fn extend<T: IntoIterator<Item = VerificationError>>(&mut self, iter: T) {
        for error in iter {
            self.push(error);
        }
    }
}
