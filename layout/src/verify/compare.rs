//! Comparison of a reported layout against the reference layout.
//!
//! Blocks and variables are matched by name. Name identity and types are
//! checked for every block; std140/std430 blocks must match the reference
//! exactly, while shared blocks only need a self-consistent layout. Packed
//! blocks get the identity checks alone, since unused members may be
//! eliminated and their layout is free.

use std::collections::HashSet;

use log::debug;

use super::VerificationReport;
use crate::error::VerificationError;
use crate::flags::PackingRule;
use crate::interface::{BufferBlock, ShaderInterface};
use crate::layout::{BufferLayout, BufferVarLayoutEntry, ReferenceLayout};

/// Compare names, types and array sizes of every block.
///
/// This is the only pass that reports missing or duplicated blocks and
/// variables; the family-specific passes skip what it cannot match.
pub fn compare_types(reference: &BufferLayout, reported: &BufferLayout) -> VerificationReport {
    let mut report = VerificationReport::new();
    // Instances of a block array share variables; types are checked once per
    // reported variable, lookups once per block entry.
    let mut typed = HashSet::new();

    for (ref_block_index, ref_block) in reference.blocks.iter().enumerate() {
        let block_index = match lookup_block(reported, &ref_block.name) {
            Ok(index) => index,
            Err(error) => {
                report.push(error);
                continue;
            }
        };

        let mut all_found = true;
        for (_, ref_var) in reference.block_variables(ref_block_index) {
            let var_index = match lookup_variable(reported, block_index, &ref_var.name) {
                Ok(index) => index,
                Err(error) => {
                    all_found = false;
                    report.push(error);
                    continue;
                }
            };
            if !typed.insert(var_index) {
                continue;
            }

            let var = &reported.buffer_vars[var_index];
            if var.ty != ref_var.ty {
                report.push(VerificationError::TypeMismatch {
                    name: ref_var.name.clone(),
                    expected: ref_var.ty,
                    actual: var.ty,
                });
            }
            if var.array_size != ref_var.array_size {
                report.push(VerificationError::ArraySizeMismatch {
                    name: ref_var.name.clone(),
                    expected: ref_var.array_size,
                    actual: var.array_size,
                });
            }
            if var.top_level_array_size != ref_var.top_level_array_size {
                report.push(VerificationError::TopLevelArraySizeMismatch {
                    name: ref_var.name.clone(),
                    expected: ref_var.top_level_array_size,
                    actual: var.top_level_array_size,
                });
            }
        }

        // Only extra variables are left to detect once every name matched.
        let expected = ref_block.active_var_indices.len();
        let actual = reported.blocks[block_index].active_var_indices.len();
        if all_found && expected != actual {
            report.push(VerificationError::ActiveVariableCountMismatch {
                block: ref_block.name.clone(),
                expected,
                actual,
            });
        }
    }
    report
}

/// Require exact layouts for every std140 and std430 block.
pub fn compare_std_blocks(
    reference: &ReferenceLayout,
    reported: &BufferLayout,
) -> VerificationReport {
    let mut report = VerificationReport::new();
    let ref_layout = reference.layout();
    let mut checked = HashSet::new();

    for (ref_block_index, instance) in reference.instances().iter().enumerate() {
        if !instance.rule.is_standard() {
            continue;
        }
        let block_name = &ref_layout.blocks[ref_block_index].name;
        let Ok(block_index) = lookup_block(reported, block_name) else {
            continue;
        };
        for (_, ref_var) in ref_layout.block_variables(ref_block_index) {
            let Ok(var_index) = lookup_variable(reported, block_index, &ref_var.name) else {
                continue;
            };
            if !checked.insert(var_index) {
                continue;
            }
            let var = &reported.buffer_vars[var_index];
            if !same_layout(ref_var, var) {
                report.push(VerificationError::LayoutMismatch {
                    name: ref_var.name.clone(),
                    expected: Box::new(ref_var.clone()),
                    actual: Box::new(var.clone()),
                });
            }
        }
    }
    report
}

/// Check shared blocks for declared majorness, ordered non-overlapping
/// offsets, and consistency between identically declared blocks.
pub fn compare_shared_blocks(
    reference: &ReferenceLayout,
    interface: &ShaderInterface,
    reported: &BufferLayout,
) -> VerificationReport {
    let mut report = VerificationReport::new();
    let ref_layout = reference.layout();
    let mut checked = HashSet::new();

    for (ref_block_index, instance) in reference.instances().iter().enumerate() {
        if instance.rule != PackingRule::Shared {
            continue;
        }
        let block_name = &ref_layout.blocks[ref_block_index].name;
        let Ok(block_index) = lookup_block(reported, block_name) else {
            continue;
        };

        let mut previous: Option<(&str, u64)> = None;
        for (_, ref_var) in ref_layout.block_variables(ref_block_index) {
            let Ok(var_index) = lookup_variable(reported, block_index, &ref_var.name) else {
                continue;
            };
            let var = &reported.buffer_vars[var_index];
            let first_check = checked.insert(var_index);

            if first_check && ref_var.ty.is_matrix() && var.is_row_major != ref_var.is_row_major {
                report.push(VerificationError::MajornessMismatch {
                    name: ref_var.name.clone(),
                    expected_row_major: ref_var.is_row_major,
                });
            }
            if let Some((previous_name, previous_end)) = previous {
                if first_check && (var.offset as u64) < previous_end {
                    report.push(VerificationError::OffsetOrder {
                        block: block_name.clone(),
                        previous: previous_name.to_string(),
                        previous_end,
                        name: ref_var.name.clone(),
                        offset: var.offset,
                    });
                }
            }
            previous = Some((var.name.as_str(), var.offset as u64 + var.element_byte_size()));
        }
    }

    report.merge(compare_shared_declarations(reference, interface, reported));
    report
}

/// Identically declared shared blocks must receive identical member layouts.
fn compare_shared_declarations(
    reference: &ReferenceLayout,
    interface: &ShaderInterface,
    reported: &BufferLayout,
) -> VerificationReport {
    let mut report = VerificationReport::new();
    let ref_layout = reference.layout();

    // First block entry of every shared declaration.
    let mut shared: Vec<(&BufferBlock, usize)> = Vec::new();
    for handle in interface.block_handles() {
        let Some(first_entry) = reference.block_entries(handle).next() else {
            continue;
        };
        let is_shared = reference
            .instance(first_entry)
            .is_some_and(|instance| instance.rule == PackingRule::Shared);
        if let (true, Ok(block)) = (is_shared, interface.block(handle)) {
            shared.push((block, first_entry));
        }
    }

    for (position, &(first, first_entry)) in shared.iter().enumerate() {
        for &(second, second_entry) in &shared[position + 1..] {
            if first.flags() != second.flags() || first.variables() != second.variables() {
                continue;
            }
            debug!(
                "Checking shared blocks {} and {} for consistency",
                first.block_name(),
                second.block_name()
            );
            let pairs = ref_layout
                .block_variables(first_entry)
                .zip(ref_layout.block_variables(second_entry));
            for ((_, first_ref), (_, second_ref)) in pairs {
                let first_block = &ref_layout.blocks[first_entry].name;
                let second_block = &ref_layout.blocks[second_entry].name;
                let first_var = reported_variable(reported, first_block, &first_ref.name);
                let second_var = reported_variable(reported, second_block, &second_ref.name);
                if let (Some(a), Some(b)) = (first_var, second_var) {
                    if !same_layout(a, b) {
                        report.push(VerificationError::SharedLayoutInconsistent {
                            name: second_ref.name.clone(),
                            first_block: first.block_name().to_string(),
                            second_block: second.block_name().to_string(),
                        });
                    }
                }
            }
        }
    }
    report
}

/// Runs every comparison pass for one interface.
#[derive(Debug, Clone, Copy)]
pub struct LayoutComparator<'a> {
    reference: &'a ReferenceLayout,
    interface: &'a ShaderInterface,
}

impl<'a> LayoutComparator<'a> {
    pub fn new(reference: &'a ReferenceLayout, interface: &'a ShaderInterface) -> Self {
        Self {
            reference,
            interface,
        }
    }

    /// Compare `reported` against the reference layout.
    pub fn compare(&self, reported: &BufferLayout) -> VerificationReport {
        let mut report = compare_types(self.reference.layout(), reported);
        report.merge(compare_std_blocks(self.reference, reported));
        report.merge(compare_shared_blocks(self.reference, self.interface, reported));
        debug!("Layout comparison found {} discrepancies", report.len());
        report
    }
}

/// Every field but name and block index matches.
fn same_layout(a: &BufferVarLayoutEntry, b: &BufferVarLayoutEntry) -> bool {
    a.ty == b.ty
        && a.offset == b.offset
        && a.array_size == b.array_size
        && a.array_stride == b.array_stride
        && a.matrix_stride == b.matrix_stride
        && a.top_level_array_size == b.top_level_array_size
        && a.top_level_array_stride == b.top_level_array_stride
        && a.is_row_major == b.is_row_major
}

fn lookup_block(layout: &BufferLayout, name: &str) -> Result<usize, VerificationError> {
    let mut matches = layout
        .blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| block.name == name)
        .map(|(index, _)| index);
    match (matches.next(), matches.next()) {
        (Some(index), None) => Ok(index),
        (None, _) => Err(VerificationError::MissingBlock {
            name: name.to_string(),
        }),
        (Some(_), Some(_)) => Err(VerificationError::DuplicateBlock {
            name: name.to_string(),
        }),
    }
}

fn lookup_variable(
    layout: &BufferLayout,
    block_index: usize,
    name: &str,
) -> Result<usize, VerificationError> {
    let mut matches = layout
        .block_variables(block_index)
        .filter(|(_, var)| var.name == name)
        .map(|(index, _)| index);
    let block = || {
        layout
            .blocks
            .get(block_index)
            .map_or_else(String::new, |block| block.name.clone())
    };
    match (matches.next(), matches.next()) {
        (Some(index), None) => Ok(index),
        (None, _) => Err(VerificationError::MissingVariable {
            block: block(),
            name: name.to_string(),
        }),
        (Some(_), Some(_)) => Err(VerificationError::DuplicateVariable {
            block: block(),
            name: name.to_string(),
        }),
    }
}

fn reported_variable<'l>(
    layout: &'l BufferLayout,
    block_name: &str,
    name: &str,
) -> Option<&'l BufferVarLayoutEntry> {
    let block_index = lookup_block(layout, block_name).ok()?;
    let var_index = lookup_variable(layout, block_index, name).ok()?;
    layout.buffer_vars.get(var_index)
}
