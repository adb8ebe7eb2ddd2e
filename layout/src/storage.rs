//! Host-side buffer memory for block instances.
//!
//! Every block entry of a [`BufferLayout`] gets a byte region sized for its
//! static part plus its runtime-sized array. Regions are either each placed in
//! their own buffer or packed one after another into a single buffer.

use std::fmt;

use log::debug;

use crate::layout::BufferLayout;

/// How block instances are bound to buffer objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferMode {
    /// One buffer per block instance.
    #[default]
    PerBlock,
    /// All block instances share one buffer at aligned offsets.
    Single,
}

impl fmt::Display for BufferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerBlock => write!(f, "per-block"),
            Self::Single => write!(f, "single"),
        }
    }
}

/// Where a block instance lives in buffer memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPlacement {
    /// Index of the buffer holding the block.
    pub buffer: usize,
    /// Byte offset of the block inside its buffer.
    pub offset: u64,
    /// Size of the block region in bytes.
    pub size: u64,
}

impl BlockPlacement {
    pub fn new(buffer: usize, offset: u64, size: u64) -> Self {
        Self {
            buffer,
            offset,
            size,
        }
    }

    /// Get the end offset (offset + size).
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Zero-initialized buffers holding every block instance of a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferStorage {
    buffers: Vec<Vec<u8>>,
    placements: Vec<BlockPlacement>,
    unsized_lens: Vec<u32>,
}

impl BufferStorage {
    /// Default alignment of block offsets in [`BufferMode::Single`].
    ///
    /// Matches the largest storage buffer offset alignment common hardware
    /// requires.
    pub const DEFAULT_OFFSET_ALIGNMENT: u64 = 256;

    /// Largest data size of one block instance a case will allocate.
    pub const MAX_BLOCK_DATA_SIZE: u64 = 1 << 24;

    /// Allocate storage for every block entry of `layout`.
    ///
    /// `unsized_lens[i]` is the runtime array length of block entry `i`;
    /// missing entries count as 0.
    pub fn new(
        layout: &BufferLayout,
        unsized_lens: &[u32],
        mode: BufferMode,
        offset_alignment: u64,
    ) -> Self {
        let lens: Vec<u32> = (0..layout.blocks.len())
            .map(|index| unsized_lens.get(index).copied().unwrap_or(0))
            .collect();

        let mut buffers = Vec::new();
        let mut placements = Vec::with_capacity(lens.len());
        match mode {
            BufferMode::PerBlock => {
                for (index, &len) in lens.iter().enumerate() {
                    let size = layout.block_data_size(index, len);
                    placements.push(BlockPlacement::new(buffers.len(), 0, size));
                    buffers.push(vec![0; size as usize]);
                }
            }
            BufferMode::Single => {
                let mut cursor = 0u64;
                for (index, &len) in lens.iter().enumerate() {
                    let size = layout.block_data_size(index, len);
                    let offset = align_offset(cursor, offset_alignment);
                    placements.push(BlockPlacement::new(0, offset, size));
                    cursor = offset + size;
                }
                buffers.push(vec![0; cursor as usize]);
            }
        }

        debug!(
            "Allocated {} buffer(s) for {} block(s) in {mode} mode ({} bytes)",
            buffers.len(),
            placements.len(),
            buffers.iter().map(Vec::len).sum::<usize>()
        );

        Self {
            buffers,
            placements,
            unsized_lens: lens,
        }
    }

    /// Number of block regions.
    pub fn block_count(&self) -> usize {
        self.placements.len()
    }

    pub fn placement(&self, block_index: usize) -> Option<&BlockPlacement> {
        self.placements.get(block_index)
    }

    pub fn placements(&self) -> &[BlockPlacement] {
        &self.placements
    }

    /// Runtime array length of block entry `block_index`.
    pub fn unsized_len(&self, block_index: usize) -> u32 {
        self.unsized_lens.get(block_index).copied().unwrap_or(0)
    }

    /// Bytes of block entry `block_index`.
    pub fn block(&self, block_index: usize) -> Option<&[u8]> {
        let placement = self.placements.get(block_index)?;
        let buffer = self.buffers.get(placement.buffer)?;
        buffer.get(placement.offset as usize..placement.end() as usize)
    }

    /// Mutable bytes of block entry `block_index`.
    pub fn block_mut(&mut self, block_index: usize) -> Option<&mut [u8]> {
        let placement = *self.placements.get(block_index)?;
        let buffer = self.buffers.get_mut(placement.buffer)?;
        buffer.get_mut(placement.offset as usize..placement.end() as usize)
    }

    /// Underlying buffers, as they would be uploaded.
    pub fn buffers(&self) -> &[Vec<u8>] {
        &self.buffers
    }
}

fn align_offset(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}
