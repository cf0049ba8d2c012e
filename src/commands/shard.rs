//! Shard Command
//!
//! Splits packed blocks into train/val/test shard files.

use std::path::Path;

use corpus_pipe::config::SplitRatios;
use corpus_pipe::error::Result;
use corpus_pipe::shard::{shard_packed_dataset, Split};
use corpus_pipe::utils::format_count;

use super::{banner, footer};

pub fn execute(
    input: &Path,
    out_dir: &Path,
    ratios: &SplitRatios,
    shard_size: usize,
    block_size: usize,
) -> Result<()> {
    banner("🗂  Train/Val/Test Sharding");
    println!("  Input: {:?}", input);
    println!("  Output: {:?}", out_dir);
    println!(
        "  Ratios: {:.4}/{:.4}/{:.4} | shard_size: {} | block_size: {}",
        ratios.train, ratios.val, ratios.test, shard_size, block_size
    );
    println!();

    let summary = shard_packed_dataset(input, out_dir, ratios, shard_size, block_size)?;

    println!("  Total blocks: {}", format_count(summary.total_blocks));
    for split in Split::ALL {
        let c = summary.counts.get(split);
        println!(
            "    {:<5} {:>10} blocks in {} shard(s)",
            split.name(),
            format_count(c.blocks),
            c.shards
        );
    }
    footer();
    Ok(())
}
