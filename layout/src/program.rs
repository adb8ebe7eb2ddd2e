//! The program under test, as seen by the verifier.
//!
//! Compilation, reflection queries and dispatch belong to the implementation
//! being tested. The verifier only needs the reported layout, name-to-index
//! queries and a way to run the program over host-visible storage.

use std::collections::HashMap;

use crate::layout::{BufferLayout, ReferenceLayout};
use crate::storage::BufferStorage;
use crate::verify::content::copy_selected;

/// Name-based resource index queries on a linked program.
pub trait ProgramResources {
    /// Index of the buffer block named `name`, if active.
    fn block_index(&self, name: &str) -> Option<u32>;

    /// Index of the buffer variable named `name`, if active.
    fn variable_index(&self, name: &str) -> Option<u32>;
}

/// A linked program whose buffer layout and behavior are being verified.
pub trait ProgramUnderTest: ProgramResources {
    /// Layout of every active block and buffer variable, as reported by the
    /// implementation's reflection.
    fn buffer_layout(&self) -> &BufferLayout;

    /// Run the program once over `storage`, laid out as
    /// [`buffer_layout`](Self::buffer_layout).
    fn execute(&mut self, storage: &mut BufferStorage);
}

/// Positions in the layout are the indices.
impl ProgramResources for BufferLayout {
    fn block_index(&self, name: &str) -> Option<u32> {
        BufferLayout::block_index(self, name).and_then(|index| u32::try_from(index).ok())
    }

    fn variable_index(&self, name: &str) -> Option<u32> {
        BufferLayout::variable_index(self, name).and_then(|index| u32::try_from(index).ok())
    }
}

/// Dummy program for testing and development.
///
/// Reports the reference layout unless told otherwise and "executes" by
/// storing the expected values of every written variable.
#[derive(Debug, Clone)]
pub struct DummyProgram {
    layout: BufferLayout,
    reference: BufferLayout,
    expected: BufferStorage,
    written: Vec<bool>,
    index_overrides: HashMap<String, Option<u32>>,
    skip_writes: bool,
    executions: usize,
}

impl DummyProgram {
    /// Create a dummy program.
    ///
    /// `expected` holds the post-execution values in the reference layout and
    /// `written[i]` tells whether reference variable `i` is written.
    pub fn new(reference: &ReferenceLayout, expected: BufferStorage, written: Vec<bool>) -> Self {
        Self {
            layout: reference.layout().clone(),
            reference: reference.layout().clone(),
            expected,
            written,
            index_overrides: HashMap::new(),
            skip_writes: false,
            executions: 0,
        }
    }

    /// Get the program name.
    pub fn name(&self) -> &'static str {
        "Dummy Program"
    }

    /// Report `layout` instead of the reference layout.
    pub fn with_layout(mut self, layout: BufferLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Answer index queries for `name` with `index`.
    pub fn with_index_override(mut self, name: impl Into<String>, index: Option<u32>) -> Self {
        self.index_overrides.insert(name.into(), index);
        self
    }

    /// Leave storage untouched on execution.
    pub fn with_skipped_writes(mut self) -> Self {
        self.skip_writes = true;
        self
    }

    /// Reported layout, for modification before the program is run.
    pub fn layout_mut(&mut self) -> &mut BufferLayout {
        &mut self.layout
    }

    /// Number of times the program has been executed.
    pub fn executions(&self) -> usize {
        self.executions
    }
}

impl ProgramResources for DummyProgram {
    fn block_index(&self, name: &str) -> Option<u32> {
        match self.index_overrides.get(name) {
            Some(&index) => index,
            None => ProgramResources::block_index(&self.layout, name),
        }
    }

    fn variable_index(&self, name: &str) -> Option<u32> {
        match self.index_overrides.get(name) {
            Some(&index) => index,
            None => ProgramResources::variable_index(&self.layout, name),
        }
    }
}

impl ProgramUnderTest for DummyProgram {
    fn buffer_layout(&self) -> &BufferLayout {
        &self.layout
    }

    fn execute(&mut self, storage: &mut BufferStorage) {
        self.executions += 1;
        log::trace!("DummyProgram: execution {}", self.executions);
        if self.skip_writes {
            return;
        }
        let written = &self.written;
        copy_selected(&self.layout, storage, &self.reference, &self.expected, |index| {
            written.get(index).copied().unwrap_or(false)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BlockLayoutEntry, BufferVarLayoutEntry};
    use crate::types::BasicType;

    #[test]
    fn test_layout_answers_index_queries() {
        let mut layout = BufferLayout::new();
        layout.blocks.push(BlockLayoutEntry::new("Block", 16));
        layout
            .buffer_vars
            .push(BufferVarLayoutEntry::new("Block.v", BasicType::VEC4, 0, 0));

        assert_eq!(ProgramResources::block_index(&layout, "Block"), Some(0));
        assert_eq!(ProgramResources::variable_index(&layout, "Block.v"), Some(0));
        assert_eq!(ProgramResources::variable_index(&layout, "v"), None);
    }
}
