//! Diagnose Command
//!
//! Verifies every packed block has exactly `block_size` ids.

use std::path::Path;

use corpus_pipe::error::Result;
use corpus_pipe::pack::diagnose_packed_lengths;
use corpus_pipe::utils::format_count;

use super::{banner, footer};

pub fn execute(tokenized: &Path, packed: &Path, block_size: usize) -> Result<()> {
    banner("🩻 Packed Length Diagnostics");
    println!("  Tokenized: {:?}", tokenized);
    println!("  Packed: {:?}", packed);
    println!("  block_size: {}", block_size);
    println!();

    let d = diagnose_packed_lengths(tokenized, packed, block_size)?;

    println!("  Original sequences: {}", format_count(d.docs));
    println!("  min: {} | max: {} | mean: {:.1}", d.min_len, d.max_len, d.mean_len);
    println!("  Packed blocks: {}", format_count(d.blocks));
    println!("  Distinct block lengths: {:?}", d.unique_lengths);
    println!("  ✅ All blocks are {} tokens", block_size);
    footer();
    Ok(())
}
