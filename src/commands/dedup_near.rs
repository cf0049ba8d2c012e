//! Near-Dedup Command
//!
//! SimHash near-duplicate removal. Compares against every kept signature,
//! so it is meant for small batches.

use std::path::Path;

use corpus_pipe::data::dedup_near;
use corpus_pipe::error::Result;
use corpus_pipe::utils::format_count;

use super::{banner, footer};

pub fn execute(input: &Path, output: &Path, threshold: u32) -> Result<()> {
    banner("🧹 Near-Duplicate Removal (SimHash)");
    println!("  Input: {:?}", input);
    println!("  Output: {:?}", output);
    println!("  Hamming threshold: {}", threshold);
    println!();

    let stats = dedup_near(input, output, threshold)?;

    println!("  Kept: {}", format_count(stats.kept));
    println!("  Near-duplicates dropped: {}", format_count(stats.dropped));
    println!("  Malformed skipped: {}", format_count(stats.malformed));
    footer();
    Ok(())
}
