//! Buffer contents: value generation, layout-to-layout copies and comparison.
//!
//! Values are always generated in the reference layout. They reach an
//! implementation's layout by copying variable by variable, matched by block
//! and variable name, and come back the same way after execution.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::VerificationReport;
use crate::error::{LayoutResult, VerificationError};
use crate::interface::ShaderInterface;
use crate::layout::{BufferLayout, BufferVarLayoutEntry, ReferenceLayout};
use crate::storage::{BufferMode, BufferStorage};
use crate::types::ScalarKind;
use crate::value::{read_word, write_word};

/// Seed offset separating post-execution values from initial values.
const WRITE_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Fill every variable of `layout` in `storage` with seeded values.
///
/// Each variable of each block instance draws from its own generator, keyed
/// by `seed` and the block and variable names, so values do not depend on
/// declaration order.
pub fn generate_values(layout: &BufferLayout, storage: &mut BufferStorage, seed: u64) {
    for (block_index, block) in layout.blocks.iter().enumerate() {
        let unsized_len = storage.unsized_len(block_index);
        let Some(bytes) = storage.block_mut(block_index) else {
            continue;
        };
        for (_, var) in layout.block_variables(block_index) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed ^ name_seed(&block.name, &var.name));
            let components = var.component_offsets();
            for element in var.element_offsets(unsized_len) {
                for &component in &components {
                    let bits = generate_bits(&mut rng, var.scalar_kind());
                    write_word(bytes, element + component, bits);
                }
            }
        }
    }
}

/// Copy every variable from `src` to `dst`, matching blocks and variables by
/// name. Variables absent from either layout are left untouched.
pub fn copy_data(
    dst_layout: &BufferLayout,
    dst: &mut BufferStorage,
    src_layout: &BufferLayout,
    src: &BufferStorage,
) {
    copy_selected(dst_layout, dst, src_layout, src, |_| true);
}

/// Copy the values of variables the program does not write from `src` to
/// `dst`, both in the reference layout.
///
/// Applied to freshly generated data, this yields the storage expected after
/// execution.
pub fn copy_non_written_data(
    reference: &ReferenceLayout,
    interface: &ShaderInterface,
    src: &BufferStorage,
    dst: &mut BufferStorage,
) -> LayoutResult<()> {
    let written = written_variables(reference, interface)?;
    let layout = reference.layout();
    copy_selected(layout, dst, layout, src, |index| !written[index]);
    Ok(())
}

/// Whether each reference variable is flagged `ACCESS_WRITE`.
pub fn written_variables(
    reference: &ReferenceLayout,
    interface: &ShaderInterface,
) -> LayoutResult<Vec<bool>> {
    let mut written = Vec::with_capacity(reference.layout().buffer_vars.len());
    for index in 0..reference.layout().buffer_vars.len() {
        let is_written = match reference.source(index) {
            Some(source) => interface
                .block(source.block)?
                .variables()
                .get(source.member)
                .is_some_and(|var| var.flags().is_written()),
            None => false,
        };
        written.push(is_written);
    }
    Ok(written)
}

/// Compare two storages of the same layout component by component.
///
/// Floats match within 0.1, integers exactly and booleans by truth value.
pub fn compare_data(
    layout: &BufferLayout,
    expected: &BufferStorage,
    actual: &BufferStorage,
) -> VerificationReport {
    let mut report = VerificationReport::new();
    for (block_index, block) in layout.blocks.iter().enumerate() {
        let (Some(expected_bytes), Some(actual_bytes)) =
            (expected.block(block_index), actual.block(block_index))
        else {
            report.push(VerificationError::MissingBlock {
                name: block.name.clone(),
            });
            continue;
        };

        let expected_len = expected.unsized_len(block_index);
        let actual_len = actual.unsized_len(block_index);
        if expected_len != actual_len {
            report.push(VerificationError::UnsizedArraySizeMismatch {
                block: block.name.clone(),
                expected: expected_len,
                actual: actual_len,
            });
        }
        let unsized_len = expected_len.min(actual_len);

        for (_, var) in layout.block_variables(block_index) {
            compare_variable(
                &mut report,
                &block.name,
                var,
                unsized_len,
                expected_bytes,
                actual_bytes,
            );
        }
    }
    report
}

fn compare_variable(
    report: &mut VerificationReport,
    block_name: &str,
    var: &BufferVarLayoutEntry,
    unsized_len: u32,
    expected: &[u8],
    actual: &[u8],
) {
    let kind = var.scalar_kind();
    let components = var.component_offsets();
    for (element_index, element) in var.element_offsets(unsized_len).into_iter().enumerate() {
        for (component_index, &component) in components.iter().enumerate() {
            let offset = element + component;
            let (Some(expected_bits), Some(actual_bits)) =
                (read_word(expected, offset), read_word(actual, offset))
            else {
                report.push(VerificationError::OutOfBounds {
                    name: var.name.clone(),
                    end: offset + ScalarKind::BYTE_SIZE as u64,
                    block_size: expected.len().min(actual.len()) as u64,
                });
                return;
            };
            let expected_value = kind.decode(expected_bits);
            let actual_value = kind.decode(actual_bits);
            if !expected_value.matches(&actual_value) {
                report.push(VerificationError::ValueMismatch {
                    name: var.name.clone(),
                    location: format!(
                        "(block {block_name}, element {element_index}, component {component_index})"
                    ),
                    expected: expected_value,
                    actual: actual_value,
                });
            }
        }
    }
}

/// Seeded content generation and checking for one interface.
#[derive(Debug, Clone, Copy)]
pub struct ContentVerifier<'a> {
    reference: &'a ReferenceLayout,
    interface: &'a ShaderInterface,
    seed: u64,
}

impl<'a> ContentVerifier<'a> {
    pub fn new(reference: &'a ReferenceLayout, interface: &'a ShaderInterface, seed: u64) -> Self {
        Self {
            reference,
            interface,
            seed,
        }
    }

    /// Storage holding the values uploaded before execution, in the
    /// reference layout.
    pub fn initial_data(&self) -> BufferStorage {
        let mut storage = self.reference_storage();
        generate_values(self.reference.layout(), &mut storage, self.seed);
        storage
    }

    /// Storage expected after execution, in the reference layout: fresh
    /// values for written variables, `initial` values for the rest.
    pub fn expected_data(&self, initial: &BufferStorage) -> LayoutResult<BufferStorage> {
        let mut storage = self.reference_storage();
        generate_values(
            self.reference.layout(),
            &mut storage,
            self.seed ^ WRITE_SEED_SALT,
        );
        copy_non_written_data(self.reference, self.interface, initial, &mut storage)?;
        Ok(storage)
    }

    /// Runtime array lengths for the block entries of `reported`, taken from
    /// the reference block of the same name.
    pub fn unsized_lens_for(&self, reported: &BufferLayout) -> Vec<u32> {
        let ref_layout = self.reference.layout();
        reported
            .blocks
            .iter()
            .map(|block| {
                ref_layout
                    .block_index(&block.name)
                    .and_then(|index| self.reference.instance(index))
                    .map_or(0, |instance| instance.last_unsized_array_size)
            })
            .collect()
    }

    /// Lay `initial` out in the reported layout, ready for upload.
    pub fn upload(
        &self,
        initial: &BufferStorage,
        reported: &BufferLayout,
        mode: BufferMode,
        offset_alignment: u64,
    ) -> BufferStorage {
        let lens = self.unsized_lens_for(reported);
        let mut storage = BufferStorage::new(reported, &lens, mode, offset_alignment);
        copy_data(reported, &mut storage, self.reference.layout(), initial);
        storage
    }

    /// Read `actual` back through the reported layout and compare it with
    /// `expected`.
    pub fn verify(
        &self,
        expected: &BufferStorage,
        reported: &BufferLayout,
        actual: &BufferStorage,
    ) -> VerificationReport {
        let mut readback = self.reference_storage();
        copy_data(self.reference.layout(), &mut readback, reported, actual);
        let report = compare_data(self.reference.layout(), expected, &readback);
        debug!("Content verification found {} discrepancies", report.len());
        report
    }

    fn reference_storage(&self) -> BufferStorage {
        BufferStorage::new(
            self.reference.layout(),
            &self.reference.unsized_array_sizes(),
            BufferMode::PerBlock,
            0,
        )
    }
}

/// Copy variables whose source index passes `select`.
pub(crate) fn copy_selected(
    dst_layout: &BufferLayout,
    dst: &mut BufferStorage,
    src_layout: &BufferLayout,
    src: &BufferStorage,
    select: impl Fn(usize) -> bool,
) {
    for (dst_block_index, dst_block) in dst_layout.blocks.iter().enumerate() {
        let Some(src_block_index) = src_layout.block_index(&dst_block.name) else {
            continue;
        };
        let dst_len = dst.unsized_len(dst_block_index);
        let src_len = src.unsized_len(src_block_index);
        let (Some(dst_bytes), Some(src_bytes)) =
            (dst.block_mut(dst_block_index), src.block(src_block_index))
        else {
            continue;
        };

        for (_, dst_var) in dst_layout.block_variables(dst_block_index) {
            let Some((src_index, src_var)) = src_layout
                .block_variables(src_block_index)
                .find(|(_, var)| var.name == dst_var.name)
            else {
                continue;
            };
            if !select(src_index) || src_var.ty != dst_var.ty {
                continue;
            }
            copy_variable(dst_bytes, dst_var, dst_len, src_bytes, src_var, src_len);
        }
    }
}

fn copy_variable(
    dst: &mut [u8],
    dst_var: &BufferVarLayoutEntry,
    dst_len: u32,
    src: &[u8],
    src_var: &BufferVarLayoutEntry,
    src_len: u32,
) {
    let dst_components = dst_var.component_offsets();
    let src_components = src_var.component_offsets();
    let elements = dst_var
        .element_offsets(dst_len)
        .into_iter()
        .zip(src_var.element_offsets(src_len));
    for (dst_element, src_element) in elements {
        for (&dst_component, &src_component) in dst_components.iter().zip(&src_components) {
            if let Some(bits) = read_word(src, src_element + src_component) {
                write_word(dst, dst_element + dst_component, bits);
            }
        }
    }
}

fn generate_bits(rng: &mut ChaCha8Rng, kind: ScalarKind) -> u32 {
    match kind {
        ScalarKind::Float => (rng.gen_range(-9i32..=9) as f32).to_bits(),
        ScalarKind::Int => rng.gen_range(-9i32..=9) as u32,
        ScalarKind::Uint => rng.gen_range(0u32..=9),
        ScalarKind::Bool => {
            if rng.gen_bool(0.5) {
                rng.gen::<u32>() | 1
            } else {
                0
            }
        }
    }
}

/// FNV-1a hash of `block` and `var`, joined with a `.`.
fn name_seed(block: &str, var: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    block
        .bytes()
        .chain(std::iter::once(b'.'))
        .chain(var.bytes())
        .fold(OFFSET_BASIS, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::LayoutFlags;
    use crate::interface::BufferVar;
    use crate::layout::LayoutComputer;
    use crate::types::{BasicType, VarType};
    use crate::value::Value;

    fn interface() -> ShaderInterface {
        let mut interface = ShaderInterface::new();
        let handle = interface.alloc_block("Block").unwrap();
        let block = interface.block_mut(handle).unwrap();
        block.set_flags(LayoutFlags::STD430);
        block.add_member(BufferVar::new("m", BasicType::mat(2, 3), LayoutFlags::ACCESS_READ));
        block.add_member(BufferVar::new(
            "u",
            BasicType::UVEC2,
            LayoutFlags::ACCESS_READ | LayoutFlags::ACCESS_WRITE,
        ));
        block.add_member(BufferVar::new(
            "data",
            VarType::unsized_array(BasicType::BOOL.into()),
            LayoutFlags::ACCESS_WRITE,
        ));
        block.set_last_unsized_array_size(0, 4).unwrap();
        interface
    }

    #[test]
    fn test_generation_is_deterministic_and_in_range() {
        let interface = interface();
        let reference = LayoutComputer::new(&interface).compute().unwrap();
        let verifier = ContentVerifier::new(&reference, &interface, 7);
        let first = verifier.initial_data();
        assert_eq!(first, verifier.initial_data());
        assert_ne!(first, ContentVerifier::new(&reference, &interface, 8).initial_data());

        let bytes = first.block(0).unwrap();
        let m = &reference.layout().buffer_vars[0];
        for offset in m.component_offsets() {
            let bits = read_word(bytes, offset).unwrap();
            let Value::Float(value) = ScalarKind::Float.decode(bits) else {
                unreachable!()
            };
            assert!((-9.0..=9.0).contains(&value) && value.fract() == 0.0);
        }
    }

    #[test]
    fn test_expected_data_keeps_read_only_values() {
        let interface = interface();
        let reference = LayoutComputer::new(&interface).compute().unwrap();
        let verifier = ContentVerifier::new(&reference, &interface, 1);
        let initial = verifier.initial_data();
        let expected = verifier.expected_data(&initial).unwrap();

        let layout = reference.layout();
        let m = &layout.buffer_vars[0];
        let m_end = (m.offset as u64 + m.byte_size(0)) as usize;
        assert_eq!(initial.block(0).unwrap()[..m_end], expected.block(0).unwrap()[..m_end]);
        assert_eq!(written_variables(&reference, &interface).unwrap(), vec![false, true, true]);
    }

    #[test]
    fn test_copy_between_layouts_round_trips() {
        let interface = interface();
        let reference = LayoutComputer::new(&interface).compute().unwrap();
        let verifier = ContentVerifier::new(&reference, &interface, 3);
        let initial = verifier.initial_data();

        // Same names, different offsets and majorness.
        let mut reported = reference.layout().clone();
        reported.buffer_vars[0].is_row_major = true;
        reported.buffer_vars[0].offset = 64;
        reported.buffer_vars[1].offset = 112;
        reported.buffer_vars[2].offset = 128;
        reported.buffer_vars[2].array_stride = 16;
        reported.blocks[0].size = 128;

        let uploaded = verifier.upload(&initial, &reported, BufferMode::Single, 256);
        assert!(verifier.verify(&initial, &reported, &uploaded).is_ok());
    }

    #[test]
    fn test_value_mismatch_names_location() {
        let interface = interface();
        let reference = LayoutComputer::new(&interface).compute().unwrap();
        let verifier = ContentVerifier::new(&reference, &interface, 5);
        let initial = verifier.initial_data();
        let mut actual = initial.clone();
        let u = &reference.layout().buffer_vars[1];
        write_word(actual.block_mut(0).unwrap(), u.offset as u64 + 4, 100);

        let report = compare_data(reference.layout(), &initial, &actual);
        assert!(matches!(
            report.errors(),
            [VerificationError::ValueMismatch { name, location, actual: Value::Uint(100), .. }]
                if name == "u" && location.contains("component 1")
        ));
    }

    #[test]
    fn test_bool_compared_by_truth_value() {
        let interface = interface();
        let reference = LayoutComputer::new(&interface).compute().unwrap();
        let layout = reference.layout();
        let storage = || BufferStorage::new(layout, &[4], BufferMode::PerBlock, 0);
        let data = &layout.buffer_vars[2];

        let mut expected = storage();
        let mut actual = storage();
        write_word(expected.block_mut(0).unwrap(), data.offset as u64, 0x8000_0001);
        write_word(actual.block_mut(0).unwrap(), data.offset as u64, 1);
        assert!(compare_data(layout, &expected, &actual).is_ok());
    }
}
