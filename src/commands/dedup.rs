//! Dedup Command
//!
//! Exact deduplication by content hash.

use std::path::Path;

use corpus_pipe::data::dedup_exact;
use corpus_pipe::error::Result;
use corpus_pipe::utils::format_count;

use super::{banner, footer};

pub fn execute(input: &Path, output: &Path) -> Result<()> {
    banner("🧹 Exact Deduplication (SHA-256)");
    println!("  Input: {:?}", input);
    println!("  Output: {:?}", output);
    println!();

    let stats = dedup_exact(input, output)?;

    println!("  Kept: {}", format_count(stats.kept));
    println!("  Duplicates dropped: {}", format_count(stats.dropped));
    println!("  Malformed skipped: {}", format_count(stats.malformed));
    footer();
    Ok(())
}
