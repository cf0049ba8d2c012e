//! Clean Command
//!
//! Runs the filter chain and writes `{"text": ...}` records.

use std::path::Path;

use corpus_pipe::config::FilterConfig;
use corpus_pipe::data::{clean_dataset, write_json_pretty, FilterChain, Outcome};
use corpus_pipe::detect::Detectors;
use corpus_pipe::error::Result;
use corpus_pipe::utils::format_count;

use super::{banner, footer};

pub fn execute(input: &Path, output: &Path, filter: FilterConfig, summary: Option<&Path>) -> Result<()> {
    banner("🧼 Document Cleaning");
    println!("  Input: {:?}", input);
    println!("  Output: {:?}", output);
    println!(
        "  chars: {}..={} | code threshold: {:.2}",
        filter.min_chars, filter.max_chars, filter.code_threshold
    );
    println!();

    let chain = FilterChain::new(Detectors::heuristic(), filter);
    let counters = clean_dataset(input, output, &chain)?;

    println!("  CLEANING SUMMARY");
    for outcome in Outcome::ALL {
        println!("    {:<14} {:>10}", outcome.label(), format_count(counters.get(outcome)));
    }

    if let Some(path) = summary {
        write_json_pretty(path, &counters)?;
        println!();
        println!("  Summary: {:?}", path);
    }
    footer();
    Ok(())
}
