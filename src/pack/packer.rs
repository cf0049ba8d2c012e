// src/pack/packer.rs
//! Fixed-length block packing.
//!
//! Sequences are appended whole to an accumulator. When the next sequence
//! does not fit, the accumulator is padded to `block_size` and flushed first.
//! Callers must keep every sequence at most `block_size` long; the packer
//! does not split sequences to enforce it.

use std::path::Path;
use tracing::info;

use crate::data::{parse_token_line, JsonlLines, JsonlWriter, TokenRecord};
use crate::error::{PipeError, Result};

pub struct FixedBlockPacker {
    block_size: usize,
    pad_id: u32,
    buffer: Vec<u32>,
}

impl FixedBlockPacker {
    pub fn new(block_size: usize, pad_id: u32) -> Result<Self> {
        if block_size == 0 {
            return Err(PipeError::Config("block_size must be at least 1".into()));
        }
        Ok(Self {
            block_size,
            pad_id,
            buffer: Vec::with_capacity(block_size),
        })
    }

    fn flush(&mut self) -> TokenRecord {
        let mut block = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.block_size));
        let fill = self.block_size.saturating_sub(block.len());
        block.extend(std::iter::repeat(self.pad_id).take(fill));
        TokenRecord::new(block)
    }

    /// Adds one sequence, returning the block it pushed out, if any.
    pub fn push(&mut self, ids: &[u32]) -> Option<TokenRecord> {
        let flushed = if !self.buffer.is_empty() && self.buffer.len() + ids.len() > self.block_size
        {
            Some(self.flush())
        } else {
            None
        };
        self.buffer.extend_from_slice(ids);
        flushed
    }

    /// Pads and returns whatever is left.
    pub fn finish(mut self) -> Option<TokenRecord> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.flush())
        }
    }
}

/// Packs every sequence of `input` into `output`. Returns the number of blocks.
pub fn pack_to_fixed_blocks(input: &Path, output: &Path, block_size: usize, pad_id: u32) -> Result<usize> {
    let mut packer = FixedBlockPacker::new(block_size, pad_id)?;
    let mut writer = JsonlWriter::create(output)?;

    for line in JsonlLines::open(input)? {
        let seq = parse_token_line(input, line?)?;
        if let Some(block) = packer.push(&seq.input_ids) {
            writer.write_record(&block)?;
        }
    }
    if let Some(block) = packer.finish() {
        writer.write_record(&block)?;
    }

    let total = writer.finish()?;
    info!(blocks = total, block_size, "fixed-length packing done");
    Ok(total)
}
