//! Integration tests for verifying reported layouts and buffer contents.
//!
//! Each test runs a [`LayoutCase`] against a [`DummyProgram`] that is either
//! correct or broken in one specific way, and checks the discrepancies the
//! verifier reports.
//!
//! # Test Categories
//!
//! - **Conformance**: correct programs pass in every buffer mode
//! - **Identity**: missing or renamed blocks and variables
//! - **Layout**: std mismatches, overlaps and shared block consistency
//! - **Content**: value mismatches after execution
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ssbo-layout --test verification_tests
//! ```

mod common;

use rstest::rstest;

use common::{
    add_block, case, entry_mut, remove_variable, single_block, single_unsized_block, var, var_with,
};
use ssbo_layout::verify::check_block_overlaps;
use ssbo_layout::{
    BasicType, BlockPlacement, BufferMode, BufferStorage, BufferVar, CaseConfig, Features,
    InterfaceGenerator, LayoutFlags, ShaderInterface, VarType, Verdict, VerificationError,
};

fn two_member_block(flags: LayoutFlags) -> ShaderInterface {
    let mut interface = ShaderInterface::new();
    add_block(
        &mut interface,
        "Block",
        Some("block"),
        flags,
        vec![
            var_with("a", BasicType::VEC4, LayoutFlags::ACCESS_READ),
            var_with("b", BasicType::FLOAT, LayoutFlags::ACCESS_WRITE),
            var("c", BasicType::IVEC2),
        ],
    );
    interface
}

/// A two-instance block array `Block blocks[2]`.
fn block_array(flags: LayoutFlags, members: Vec<BufferVar>) -> ShaderInterface {
    let mut interface = ShaderInterface::new();
    add_block(&mut interface, "Block", Some("blocks"), flags, members);
    let handle = interface.block_handles().next().unwrap();
    interface.block_mut(handle).unwrap().set_array_size(2);
    interface
}

/// Two SHARED blocks with identical member lists.
fn twin_shared_blocks() -> ShaderInterface {
    let mut interface = ShaderInterface::new();
    for (name, instance) in [("A", "a"), ("B", "b")] {
        add_block(
            &mut interface,
            name,
            Some(instance),
            LayoutFlags::SHARED,
            vec![var("m", BasicType::VEC4), var("f", BasicType::FLOAT)],
        );
    }
    interface
}

// ============================================================================
// Conformance
// ============================================================================

#[rstest]
#[case::per_block(BufferMode::PerBlock, 7)]
#[case::per_block_other_seed(BufferMode::PerBlock, 8)]
#[case::single(BufferMode::Single, 7)]
#[case::single_unaligned(BufferMode::Single, 9)]
fn test_dummy_program_passes_generated_cases(#[case] mode: BufferMode, #[case] seed: u64) {
    let offset_alignment = if seed == 9 { 4 } else { 256 };
    let mut generator = InterfaceGenerator::new(seed, Features::all());
    for index in 0..32u64 {
        let interface = generator.generate().unwrap();
        let config = CaseConfig::new()
            .with_buffer_mode(mode)
            .with_offset_alignment(offset_alignment)
            .with_seed(seed * 1000 + index);
        let case = case(interface, config);
        let mut program = case.dummy_program();

        let verdict = case.run(&mut program);
        assert_eq!(verdict, Verdict::Pass, "case {index}:\n{}", case.reference().layout());
        assert_eq!(program.executions(), 1);
    }
}

#[test]
fn test_read_only_interface_passes_without_writes() {
    let interface = single_block(
        LayoutFlags::STD430,
        vec![
            var_with("x", BasicType::UVEC3, LayoutFlags::ACCESS_READ),
            var_with(
                "y",
                VarType::array(BasicType::BOOL.into(), 4),
                LayoutFlags::ACCESS_READ,
            ),
        ],
    );
    let case = case(interface, CaseConfig::new());
    let mut program = case.dummy_program().with_skipped_writes();
    assert!(case.run(&mut program).is_pass());
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_missing_variable_is_single_discrepancy() {
    let case = case(two_member_block(LayoutFlags::STD430), CaseConfig::new());
    let mut reported = case.reference().layout().clone();
    remove_variable(&mut reported, "Block.b");
    let mut program = case.dummy_program().with_layout(reported);

    let verdict = case.run(&mut program);
    let report = verdict.report().unwrap();
    assert!(matches!(
        report.errors(),
        [VerificationError::MissingVariable { block, name }] if block == "Block" && name == "Block.b"
    ));
    assert_eq!(program.executions(), 0);
}

#[test]
fn test_variable_missing_from_one_instance() {
    let interface = block_array(
        LayoutFlags::STD430,
        vec![var("a", BasicType::VEC4), var("b", BasicType::FLOAT)],
    );
    for seed in 0..32 {
        let case = case(interface.clone(), CaseConfig::new().with_seed(seed));
        let mut reported = case.reference().layout().clone();
        reported.blocks[1].active_var_indices = vec![0];
        let mut program = case.dummy_program().with_layout(reported);

        let verdict = case.run(&mut program);
        assert!(
            matches!(
                verdict.report().map(|report| report.errors()),
                Some([VerificationError::MissingVariable { block, name }])
                    if block == "Block[1]" && name == "Block.b"
            ),
            "seed {seed}: {verdict}"
        );
        assert_eq!(program.executions(), 0);
    }
}

#[test]
fn test_renamed_block_is_missing() {
    let case = case(two_member_block(LayoutFlags::STD140), CaseConfig::new());
    let mut reported = case.reference().layout().clone();
    reported.blocks[0].name = "Other".to_string();
    let mut program = case.dummy_program().with_layout(reported);

    let report = case.run(&mut program).report().cloned().unwrap();
    assert!(report
        .errors()
        .contains(&VerificationError::MissingBlock { name: "Block".to_string() }));
    assert_eq!(program.executions(), 0);
}

#[test]
fn test_index_query_mismatch() {
    let case = case(two_member_block(LayoutFlags::STD140), CaseConfig::new());
    let mut program = case
        .dummy_program()
        .with_index_override("Block.c", Some(0))
        .with_index_override("Block", None);

    let report = case.run(&mut program).report().cloned().unwrap();
    assert_eq!(
        report.errors(),
        &[
            VerificationError::IndexQueryMismatch {
                name: "Block".to_string(),
                expected: 0,
                actual: None,
            },
            VerificationError::IndexQueryMismatch {
                name: "Block.c".to_string(),
                expected: 2,
                actual: Some(0),
            },
        ]
    );
    assert_eq!(program.executions(), 0);
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_std_offset_mismatch() {
    let case = case(two_member_block(LayoutFlags::STD140), CaseConfig::new());
    let mut reported = case.reference().layout().clone();
    // Still inside the block and clear of the other members.
    entry_mut(&mut reported, "Block.c").offset = 20;
    let mut program = case.dummy_program().with_layout(reported);

    let verdict = case.run(&mut program);
    let report = verdict.report().unwrap();
    assert!(matches!(
        report.errors(),
        [VerificationError::LayoutMismatch { name, expected, actual }]
            if name == "Block.c" && expected.offset == 24 && actual.offset == 20
    ));
    assert_eq!(program.executions(), 1);
}

#[test]
fn test_overlapping_variables_skip_execution() {
    let case = case(two_member_block(LayoutFlags::STD430), CaseConfig::new());
    let mut reported = case.reference().layout().clone();
    entry_mut(&mut reported, "Block.b").offset = 8;
    let mut program = case.dummy_program().with_layout(reported);

    let verdict = case.run(&mut program);
    let report = verdict.report().unwrap();
    assert!(report.errors().contains(&VerificationError::IndexOverlap {
        first: "Block.a".to_string(),
        second: "Block.b".to_string(),
        offset: 8,
    }));
    assert_eq!(
        report.count(|e| matches!(e, VerificationError::LayoutMismatch { .. })),
        1
    );
    assert_eq!(program.executions(), 0);
}

#[test]
fn test_variable_past_block_end() {
    let case = case(two_member_block(LayoutFlags::STD430), CaseConfig::new());
    let mut reported = case.reference().layout().clone();
    reported.blocks[0].size = 20;
    let mut program = case.dummy_program().with_layout(reported);

    let verdict = case.run(&mut program);
    let report = verdict.report().unwrap();
    assert!(report.errors().contains(&VerificationError::OutOfBounds {
        name: "Block.c".to_string(),
        end: 32,
        block_size: 20,
    }));
    assert_eq!(program.executions(), 0);
}

#[rstest]
#[case::per_block(BufferMode::PerBlock)]
#[case::single(BufferMode::Single)]
fn test_huge_unsized_stride_fails_without_allocating(#[case] mode: BufferMode) {
    let interface = single_unsized_block(
        LayoutFlags::STD430,
        vec![
            var("a", BasicType::FLOAT),
            var("data", VarType::unsized_array(BasicType::FLOAT.into())),
        ],
        1000,
    );
    let case = case(interface, CaseConfig::new().with_buffer_mode(mode));
    let mut reported = case.reference().layout().clone();
    entry_mut(&mut reported, "data[0]").array_stride = u32::MAX;
    let mut program = case.dummy_program().with_layout(reported);

    let verdict = case.run(&mut program);
    let report = verdict.report().unwrap();
    assert!(report.errors().contains(&VerificationError::BlockTooLarge {
        block: "Block".to_string(),
        size: 4 + 1000 * u32::MAX as u64,
        limit: BufferStorage::MAX_BLOCK_DATA_SIZE,
    }));
    assert_eq!(program.executions(), 0);
}

#[test]
fn test_short_unsized_stride_skips_execution() {
    let interface = single_unsized_block(
        LayoutFlags::SHARED,
        vec![
            var("a", BasicType::FLOAT),
            var("data", VarType::unsized_array(BasicType::VEC2.into())),
        ],
        6,
    );
    let case = case(interface, CaseConfig::new());
    let mut reported = case.reference().layout().clone();
    entry_mut(&mut reported, "data[0]").array_stride = 4;
    let mut program = case.dummy_program().with_layout(reported);

    let verdict = case.run(&mut program);
    assert!(matches!(
        verdict.report().map(|report| report.errors()),
        Some([VerificationError::InvalidUnsizedStride { name, stride: 4, element_size: 8 }])
            if name == "data[0]"
    ));
    assert_eq!(program.executions(), 0);
}

#[test]
fn test_type_mismatch() {
    let case = case(two_member_block(LayoutFlags::STD430), CaseConfig::new());
    let mut reported = case.reference().layout().clone();
    entry_mut(&mut reported, "Block.c").ty = BasicType::UVEC2;
    let mut program = case.dummy_program().with_layout(reported);

    let verdict = case.run(&mut program);
    assert!(verdict.report().unwrap().errors().contains(&VerificationError::TypeMismatch {
        name: "Block.c".to_string(),
        expected: BasicType::IVEC2,
        actual: BasicType::UVEC2,
    }));
    assert_eq!(program.executions(), 0);
}

#[test]
fn test_array_size_mismatch_skips_execution() {
    let interface = single_block(
        LayoutFlags::STD430,
        vec![var("v", VarType::array(BasicType::FLOAT.into(), 4))],
    );
    let case = case(interface, CaseConfig::new());
    let mut reported = case.reference().layout().clone();
    entry_mut(&mut reported, "v[0]").array_size = 3;
    let mut program = case.dummy_program().with_layout(reported);

    let verdict = case.run(&mut program);
    let report = verdict.report().unwrap();
    assert!(report.errors().contains(&VerificationError::ArraySizeMismatch {
        name: "v[0]".to_string(),
        expected: 4,
        actual: 3,
    }));
    assert_eq!(program.executions(), 0);
}

#[test]
fn test_shared_blocks_in_single_buffer_do_not_overlap() {
    let interface = twin_shared_blocks();
    let config = CaseConfig::new()
        .with_buffer_mode(BufferMode::Single)
        .with_offset_alignment(16);
    let case = case(interface, config);
    assert!(case.run(&mut case.dummy_program()).is_pass());

    let layout = case.reference().layout();
    let storage = BufferStorage::new(layout, &[], BufferMode::Single, 16);
    let placements = storage.placements();
    assert_eq!(storage.buffers().len(), 1);
    assert!(placements[1].offset >= placements[0].end());
    assert!(check_block_overlaps(layout, placements, &[]).is_ok());

    let overlapping = [BlockPlacement::new(0, 0, 32), BlockPlacement::new(0, 16, 32)];
    let report = check_block_overlaps(layout, &overlapping, &[]);
    assert_eq!(
        report.errors(),
        &[VerificationError::BlockOverlap {
            first: "A".to_string(),
            second: "B".to_string(),
            buffer: 0,
        }]
    );
}

#[test]
fn test_identical_shared_blocks_must_agree() {
    let case = case(twin_shared_blocks(), CaseConfig::new());
    let mut reported = case.reference().layout().clone();
    entry_mut(&mut reported, "B.f").offset = 20;
    let mut program = case.dummy_program().with_layout(reported);

    let verdict = case.run(&mut program);
    assert!(matches!(
        verdict.report().unwrap().errors(),
        [VerificationError::SharedLayoutInconsistent { name, first_block, second_block }]
            if name == "B.f" && first_block == "A" && second_block == "B"
    ));
}

#[test]
fn test_shared_matrix_majorness_mismatch() {
    let interface = single_block(
        LayoutFlags::SHARED | LayoutFlags::ROW_MAJOR,
        vec![var("m", BasicType::MAT2), var("v", BasicType::VEC2)],
    );
    let case = case(interface, CaseConfig::new());
    let mut reported = case.reference().layout().clone();
    entry_mut(&mut reported, "m").is_row_major = false;
    let mut program = case.dummy_program().with_layout(reported);

    let verdict = case.run(&mut program);
    assert_eq!(
        verdict.report().unwrap().errors(),
        &[VerificationError::MajornessMismatch {
            name: "m".to_string(),
            expected_row_major: true,
        }]
    );
}

#[test]
fn test_shared_members_out_of_order() {
    let interface = single_block(
        LayoutFlags::SHARED,
        vec![var("x", BasicType::FLOAT), var("y", BasicType::FLOAT)],
    );
    let case = case(interface, CaseConfig::new());
    let mut reported = case.reference().layout().clone();
    entry_mut(&mut reported, "x").offset = 4;
    entry_mut(&mut reported, "y").offset = 0;
    let mut program = case.dummy_program().with_layout(reported);

    let verdict = case.run(&mut program);
    assert!(matches!(
        verdict.report().unwrap().errors(),
        [VerificationError::OffsetOrder { previous, name, .. }] if previous == "x" && name == "y"
    ));
}

// ============================================================================
// Content
// ============================================================================

#[rstest]
#[case::std140(LayoutFlags::STD140)]
#[case::std430(LayoutFlags::STD430)]
#[case::shared(LayoutFlags::SHARED)]
fn test_skipped_writes_report_written_values(#[case] flags: LayoutFlags) {
    let case = case(two_member_block(flags), CaseConfig::new().with_seed(3));
    let mut program = case.dummy_program().with_skipped_writes();

    let verdict = case.run(&mut program);
    let report = verdict.report().unwrap();
    // `b` is write-only; `c` is read-write. Only their values may differ.
    for error in report.errors() {
        match error {
            VerificationError::ValueMismatch { name, .. } => {
                assert!(name == "Block.b" || name == "Block.c", "{error}");
            }
            other => panic!("unexpected {other}"),
        }
    }
    assert_eq!(program.executions(), 1);
}

#[test]
fn test_expected_data_differs_only_in_written_variables() {
    let case = case(two_member_block(LayoutFlags::STD430), CaseConfig::new().with_seed(5));
    let initial = case.initial_data().block(0).unwrap();
    let expected = case.expected_data().block(0).unwrap();

    // `a` is read-only and occupies the first 16 bytes.
    assert_eq!(&initial[..16], &expected[..16]);
}
