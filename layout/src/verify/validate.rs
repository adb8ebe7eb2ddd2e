//! Structural checks on a reported layout.
//!
//! These run before any comparison: a layout with dangling indices or
//! overlapping variables makes byte-level verification meaningless.

use std::collections::HashSet;

use super::VerificationReport;
use crate::error::VerificationError;
use crate::layout::BufferLayout;
use crate::program::ProgramResources;
use crate::storage::{BlockPlacement, BufferStorage};
use crate::types::ScalarKind;

/// Check block indices of variables and active variable indices of blocks.
///
/// Every variable must point at an existing block and be listed by at least
/// one block; a block may not list a variable twice.
pub fn check_layout_indices(layout: &BufferLayout) -> VerificationReport {
    let mut report = VerificationReport::new();
    let num_vars = layout.buffer_vars.len();
    let mut referenced = vec![false; num_vars];

    for var in &layout.buffer_vars {
        if var.block_index >= layout.blocks.len() {
            report.push(VerificationError::InvalidBlockIndex {
                name: var.name.clone(),
                index: var.block_index,
            });
        }
    }

    for block in &layout.blocks {
        let mut seen = HashSet::new();
        for &index in &block.active_var_indices {
            if index >= num_vars {
                report.push(VerificationError::InvalidActiveVariableIndex {
                    block: block.name.clone(),
                    index,
                });
                continue;
            }
            if !seen.insert(index) {
                report.push(VerificationError::DuplicateActiveVariable {
                    block: block.name.clone(),
                    index,
                });
            }
            referenced[index] = true;
        }
    }

    for (var, used) in layout.buffer_vars.iter().zip(referenced) {
        if !used {
            report.push(VerificationError::UnreferencedVariable {
                name: var.name.clone(),
            });
        }
    }
    report
}

/// Check that every sized variable ends inside its block.
pub fn check_layout_bounds(layout: &BufferLayout) -> VerificationReport {
    let mut report = VerificationReport::new();
    for (block_index, block) in layout.blocks.iter().enumerate() {
        for (_, var) in layout.block_variables(block_index) {
            if var.is_unsized() {
                continue;
            }
            let end = (var.offset as u64).saturating_add(var.byte_size(0));
            if end > block.size as u64 {
                report.push(VerificationError::OutOfBounds {
                    name: var.name.clone(),
                    end,
                    block_size: block.size as u64,
                });
            }
        }
    }
    report
}

/// Check the data size of every block instance and the runtime-sized arrays
/// that extend it.
///
/// `unsized_lens[i]` is the runtime array length of block entry `i`. A block
/// larger than [`BufferStorage::MAX_BLOCK_DATA_SIZE`] is reported instead of
/// its variables. An unsized array must step by at least one element and
/// end inside the instance data.
pub fn check_block_data_sizes(layout: &BufferLayout, unsized_lens: &[u32]) -> VerificationReport {
    let mut report = VerificationReport::new();
    for (block_index, block) in layout.blocks.iter().enumerate() {
        let unsized_len = unsized_lens.get(block_index).copied().unwrap_or(0);
        let data_size = layout.block_data_size(block_index, unsized_len);
        if data_size > BufferStorage::MAX_BLOCK_DATA_SIZE {
            report.push(VerificationError::BlockTooLarge {
                block: block.name.clone(),
                size: data_size,
                limit: BufferStorage::MAX_BLOCK_DATA_SIZE,
            });
            continue;
        }

        for (_, var) in layout.block_variables(block_index) {
            let (Some(stride), Some(element_size)) =
                (var.unsized_stride(), var.unsized_element_byte_size())
            else {
                continue;
            };
            if (stride as u64) < element_size {
                report.push(VerificationError::InvalidUnsizedStride {
                    name: var.name.clone(),
                    stride,
                    element_size,
                });
                continue;
            }
            let end = (var.offset as u64).saturating_add(var.byte_size(unsized_len));
            if end > data_size {
                report.push(VerificationError::OutOfBounds {
                    name: var.name.clone(),
                    end,
                    block_size: data_size,
                });
            }
        }
    }
    report
}

/// Check that the stored vectors of distinct variables never share a byte.
///
/// A runtime-sized array is checked with one element. Each overlapping pair
/// is reported once per block.
pub fn check_overlaps(layout: &BufferLayout) -> VerificationReport {
    let mut report = VerificationReport::new();
    for (block_index, block) in layout.blocks.iter().enumerate() {
        let mut spans = Vec::new();
        for (var_index, var) in layout.block_variables(block_index) {
            let extent = var.byte_size(1);
            if !var.is_unsized() && (var.offset as u64).saturating_add(extent) > block.size as u64 {
                // Reported by the bounds check.
                continue;
            }
            let (top, inner) = var.resolved_sizes(1);
            let (num_vecs, vec_size) = var.ty.memory_vectors(var.is_row_major);
            let vec_bytes = (vec_size * ScalarKind::BYTE_SIZE) as u64;
            let stored = (top as u64 * inner as u64)
                .saturating_mul(num_vecs as u64)
                .saturating_mul(vec_bytes);
            if stored > extent {
                report.push(VerificationError::IndexOverlap {
                    first: var.name.clone(),
                    second: var.name.clone(),
                    offset: var.offset as u64,
                });
                continue;
            }
            spans.extend(
                var.vector_spans(1)
                    .into_iter()
                    .map(|(start, end)| (start, end, var_index)),
            );
        }
        for (first, second, offset) in sweep_overlaps(spans) {
            report.push(VerificationError::IndexOverlap {
                first: layout.buffer_vars[first].name.clone(),
                second: layout.buffer_vars[second].name.clone(),
                offset,
            });
        }
    }
    report
}

/// Check that variables of different blocks placed in the same buffer do not
/// overlap.
///
/// `placements` and `unsized_lens` are indexed by block entry, as produced by
/// [`BufferStorage`](crate::storage::BufferStorage).
pub fn check_block_overlaps(
    layout: &BufferLayout,
    placements: &[BlockPlacement],
    unsized_lens: &[u32],
) -> VerificationReport {
    let mut report = VerificationReport::new();
    let num_buffers = placements.iter().map(|p| p.buffer + 1).max().unwrap_or(0);

    for buffer in 0..num_buffers {
        let mut spans = Vec::new();
        for (block_index, placement) in placements.iter().enumerate() {
            if placement.buffer != buffer {
                continue;
            }
            let unsized_len = unsized_lens.get(block_index).copied().unwrap_or(0);
            for (_, var) in layout.block_variables(block_index) {
                spans.extend(var.vector_spans(unsized_len).into_iter().map(|(start, end)| {
                    (placement.offset + start, placement.offset + end, block_index)
                }));
            }
        }
        for (first, second, _) in sweep_overlaps(spans) {
            report.push(VerificationError::BlockOverlap {
                first: layout.blocks[first].name.clone(),
                second: layout.blocks[second].name.clone(),
                buffer,
            });
        }
    }
    report
}

/// Check that name queries against the program agree with the positions of
/// blocks and variables in the reported layout.
pub fn check_index_queries<P: ProgramResources + ?Sized>(
    layout: &BufferLayout,
    program: &P,
) -> VerificationReport {
    let mut report = VerificationReport::new();
    for (index, block) in layout.blocks.iter().enumerate() {
        let actual = program.block_index(&block.name);
        if actual.map(|i| i as usize) != Some(index) {
            report.push(VerificationError::IndexQueryMismatch {
                name: block.name.clone(),
                expected: index,
                actual,
            });
        }
    }
    for (index, var) in layout.buffer_vars.iter().enumerate() {
        let actual = program.variable_index(&var.name);
        if actual.map(|i| i as usize) != Some(index) {
            report.push(VerificationError::IndexQueryMismatch {
                name: var.name.clone(),
                expected: index,
                actual,
            });
        }
    }
    report
}

/// Find overlapping `[start, end)` spans with different owners.
///
/// Returns each unordered owner pair once, in order of discovery, with the
/// first overlapping byte.
fn sweep_overlaps(mut spans: Vec<(u64, u64, usize)>) -> Vec<(usize, usize, u64)> {
    spans.sort_unstable();
    let mut found = Vec::new();
    let mut reported = HashSet::new();
    // Spans still open at the current start position.
    let mut open: Vec<(u64, usize)> = Vec::new();

    for (start, end, owner) in spans {
        open.retain(|&(open_end, _)| open_end > start);
        for &(_, other) in &open {
            if other != owner && reported.insert((other.min(owner), other.max(owner))) {
                found.push((other, owner, start));
            }
        }
        open.push((end, owner));
    }
    found
}
