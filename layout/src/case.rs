//! One layout test case, from declared interface to verdict.

use std::fmt;

use log::{debug, info};

use crate::error::{LayoutResult, VerificationError};
use crate::interface::ShaderInterface;
use crate::layout::{LayoutComputer, ReferenceLayout};
use crate::program::{DummyProgram, ProgramUnderTest};
use crate::storage::{BufferMode, BufferStorage};
use crate::verify::{
    check_block_data_sizes, check_block_overlaps, check_index_queries, check_layout_bounds,
    check_layout_indices, check_overlaps, content, ContentVerifier, LayoutComparator,
    VerificationReport,
};

/// Settings of a [`LayoutCase`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaseConfig {
    /// How block instances are bound to buffers.
    pub buffer_mode: BufferMode,
    /// Alignment of block offsets inside a single buffer.
    pub offset_alignment: u64,
    /// Seed of the generated buffer contents.
    pub seed: u64,
}

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            buffer_mode: BufferMode::PerBlock,
            offset_alignment: BufferStorage::DEFAULT_OFFSET_ALIGNMENT,
            seed: 0,
        }
    }
}

impl CaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffer binding mode.
    pub fn with_buffer_mode(mut self, buffer_mode: BufferMode) -> Self {
        self.buffer_mode = buffer_mode;
        self
    }

    /// Set the alignment of block offsets in [`BufferMode::Single`].
    pub fn with_offset_alignment(mut self, offset_alignment: u64) -> Self {
        self.offset_alignment = offset_alignment;
        self
    }

    /// Set the content seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of running a case against a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass,
    Fail(VerificationReport),
}

impl Verdict {
    fn from_report(report: VerificationReport) -> Self {
        if report.is_ok() {
            Self::Pass
        } else {
            Self::Fail(report)
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Discrepancies behind a failure.
    pub fn report(&self) -> Option<&VerificationReport> {
        match self {
            Self::Pass => None,
            Self::Fail(report) => Some(report),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail(report) => write!(f, "fail: {report}"),
        }
    }
}

/// A declared interface with its reference layout and buffer contents.
///
/// Construction computes everything that does not depend on the program
/// under test, so an illegal interface fails early with a [`LayoutError`].
///
/// [`LayoutError`]: crate::LayoutError
#[derive(Debug)]
pub struct LayoutCase {
    name: String,
    interface: ShaderInterface,
    config: CaseConfig,
    reference: ReferenceLayout,
    initial: BufferStorage,
    expected: BufferStorage,
    written: Vec<bool>,
}

impl LayoutCase {
    /// Create a case for `interface`.
    pub fn new(
        name: impl Into<String>,
        interface: ShaderInterface,
        config: CaseConfig,
    ) -> LayoutResult<Self> {
        let name = name.into();
        let reference = LayoutComputer::new(&interface).compute()?;
        let verifier = ContentVerifier::new(&reference, &interface, config.seed);
        let initial = verifier.initial_data();
        let expected = verifier.expected_data(&initial)?;
        let written = content::written_variables(&reference, &interface)?;
        debug!(
            "Case {name}: {} block entries, {} variables",
            reference.layout().blocks.len(),
            reference.layout().buffer_vars.len()
        );

        Ok(Self {
            name,
            interface,
            config,
            reference,
            initial,
            expected,
            written,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interface(&self) -> &ShaderInterface {
        &self.interface
    }

    pub fn config(&self) -> &CaseConfig {
        &self.config
    }

    pub fn reference(&self) -> &ReferenceLayout {
        &self.reference
    }

    /// Values uploaded before execution, in the reference layout.
    pub fn initial_data(&self) -> &BufferStorage {
        &self.initial
    }

    /// Values expected after execution, in the reference layout.
    pub fn expected_data(&self) -> &BufferStorage {
        &self.expected
    }

    /// A dummy program that behaves correctly for this case.
    pub fn dummy_program(&self) -> DummyProgram {
        DummyProgram::new(&self.reference, self.expected.clone(), self.written.clone())
    }

    /// Verify `program` against the case.
    ///
    /// Structural checks run first; if they fail, or if blocks, variables,
    /// types or array sizes do not match the reference, the program is not
    /// executed and contents are not compared.
    pub fn run(&self, program: &mut dyn ProgramUnderTest) -> Verdict {
        let reported = program.buffer_layout().clone();
        let verifier = ContentVerifier::new(&self.reference, &self.interface, self.config.seed);
        let unsized_lens = verifier.unsized_lens_for(&reported);

        let mut structural = check_layout_indices(&reported);
        if structural.is_ok() {
            structural.merge(check_layout_bounds(&reported));
            let sizes = check_block_data_sizes(&reported, &unsized_lens);
            // Overlap sweeps visit every element.
            if sizes.is_ok() {
                structural.merge(check_overlaps(&reported));
            }
            structural.merge(sizes);
        }
        structural.merge(check_index_queries(&reported, &*program));

        let comparison = LayoutComparator::new(&self.reference, &self.interface).compare(&reported);
        let incomparable = comparison.count(|error| {
            matches!(
                error,
                VerificationError::MissingBlock { .. }
                    | VerificationError::DuplicateBlock { .. }
                    | VerificationError::MissingVariable { .. }
                    | VerificationError::DuplicateVariable { .. }
                    | VerificationError::TypeMismatch { .. }
                    | VerificationError::ArraySizeMismatch { .. }
                    | VerificationError::TopLevelArraySizeMismatch { .. }
            )
        });

        let structural_ok = structural.is_ok();
        let mut report = structural;
        report.merge(comparison);

        if !structural_ok || incomparable > 0 {
            info!("Case {}: skipping content verification", self.name);
        } else {
            let mut storage = verifier.upload(
                &self.initial,
                &reported,
                self.config.buffer_mode,
                self.config.offset_alignment,
            );
            // Placements follow the checked block sizes, so this only fails
            // if packing into the storage itself is wrong.
            report.merge(check_block_overlaps(&reported, storage.placements(), &unsized_lens));
            program.execute(&mut storage);
            report.merge(verifier.verify(&self.expected, &reported, &storage));
        }

        let verdict = Verdict::from_report(report);
        match &verdict {
            Verdict::Pass => info!("Case {}: pass", self.name),
            Verdict::Fail(report) => {
                info!("Case {}: fail ({} discrepancies)", self.name, report.len())
            }
        }
        verdict
    }
}
