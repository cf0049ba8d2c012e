//! Token Stats Command

use std::path::Path;

use corpus_pipe::config::PipelineConfig;
use corpus_pipe::data::write_json_pretty;
use corpus_pipe::error::Result;
use corpus_pipe::pipeline::build_adapter;
use corpus_pipe::report::token_length_stats;
use corpus_pipe::utils::format_count;

use super::{banner, footer};

pub fn execute(input: &Path, config: &PipelineConfig, max_docs: Option<usize>, output: Option<&Path>) -> Result<()> {
    banner("📏 Token Length Stats");
    println!("  Input: {:?}", input);

    let adapter = build_adapter(config)?;
    println!("  Encoder: {}", adapter.encoder().name());
    println!();

    let stats = token_length_stats(input, adapter.encoder(), max_docs)?;

    println!("  Docs: {}", format_count(stats.docs_counted));
    println!("  avg: {:.1} | median: {:.1}", stats.avg_tokens, stats.median_tokens);
    println!("  p95: {:.1} | p99: {:.1} | max: {}", stats.p95_tokens, stats.p99_tokens, stats.max_tokens);

    if let Some(path) = output {
        write_json_pretty(path, &stats)?;
        println!();
        println!("  Report: {:?}", path);
    }
    footer();
    Ok(())
}
