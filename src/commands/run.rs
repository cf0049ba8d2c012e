//! Run Command
//!
//! Whole pipeline, raw JSONL to shards and `meta.json`.

use corpus_pipe::config::PipelineConfig;
use corpus_pipe::data::Outcome;
use corpus_pipe::error::Result;
use corpus_pipe::pipeline::run_pipeline;
use corpus_pipe::shard::Split;
use corpus_pipe::utils::{format_count, format_duration};

use super::{banner, footer};

pub fn execute(config: &PipelineConfig) -> Result<()> {
    banner("🚀 Corpus Pipeline");
    println!("  Raw: {:?}", config.raw_path);
    println!("  Encoder: {:?}", config.encoder);
    println!(
        "  block_size: {} | max_seq_len: {} | shard_size: {}",
        config.block_size, config.max_seq_len, config.shard_size
    );
    println!(
        "  Ratios: {:.4}/{:.4}/{:.4}",
        config.ratios.train, config.ratios.val, config.ratios.test
    );
    println!("  Near-dedup: {}", config.near_dedup);
    println!();

    let summary = run_pipeline(config)?;

    println!("  Dedup kept: {} (dropped {})", format_count(summary.dedup.kept), format_count(summary.dedup.dropped));
    if let Some(near) = &summary.near_dedup {
        println!("  Near-dedup kept: {} (dropped {})", format_count(near.kept), format_count(near.dropped));
    }
    println!("  Cleaning:");
    for outcome in Outcome::ALL {
        println!("    {:<14} {:>10}", outcome.label(), format_count(summary.cleaning.get(outcome)));
    }
    println!("  Sequences: {}", format_count(summary.tokenize.written_docs));
    println!("  Blocks: {}", format_count(summary.total_blocks));
    for split in Split::ALL {
        let c = summary.shards.counts.get(split);
        println!("    {:<5} {:>10} blocks in {} shard(s)", split.name(), format_count(c.blocks), c.shards);
    }
    println!("  Metadata: {:?}", summary.meta_path);
    println!("  ✅ Done in {}", format_duration(summary.elapsed_secs));
    footer();
    Ok(())
}
