//! Pack Command
//!
//! Concatenates sequences into blocks of exactly `block_size` ids.

use std::path::Path;

use corpus_pipe::config::PipelineConfig;
use corpus_pipe::error::Result;
use corpus_pipe::pack::pack_to_fixed_blocks;
use corpus_pipe::pipeline::build_adapter;
use corpus_pipe::utils::format_count;

use super::{banner, footer};

pub fn execute(input: &Path, output: &Path, config: &PipelineConfig) -> Result<()> {
    banner("🧱 Fixed-Block Packing");
    println!("  Input: {:?}", input);
    println!("  Output: {:?}", output);
    println!("  block_size: {}", config.block_size);

    // the pad id sits above the encoder vocabulary
    let pad = build_adapter(config)?.special().pad;
    println!("  PAD: {}", pad);
    println!();

    let blocks = pack_to_fixed_blocks(input, output, config.block_size, pad)?;

    println!("  Blocks: {}", format_count(blocks));
    footer();
    Ok(())
}
