//! Inspect Command
//!
//! File overview, text length distribution and exclusive categories.

use std::path::Path;

use corpus_pipe::config::FilterConfig;
use corpus_pipe::data::write_json_pretty;
use corpus_pipe::detect::Detectors;
use corpus_pipe::error::Result;
use corpus_pipe::report::{quick_stats, summarize_exclusive};
use corpus_pipe::utils::{format_bytes, format_count, format_percent};

use super::{banner, footer};

pub fn execute(input: &Path, sample_size: usize, filter: &FilterConfig, report_dir: Option<&Path>) -> Result<()> {
    banner("🔎 Corpus Inspection");
    println!("  Input: {:?}", input);
    println!("  Sample: first {} lines", format_count(sample_size));
    println!();

    let stats = quick_stats(input, sample_size)?;

    println!("  FILE OVERVIEW");
    println!("  File size: {}", format_bytes(stats.file_size_bytes));
    println!("  Total lines: {}", format_count(stats.total_lines));
    println!("  Sampled: {}", format_count(stats.sampled));
    println!();
    println!("  KEYS");
    for (key, count) in &stats.top_keys {
        println!("    {:<20} {}", key, format_count(*count));
    }
    println!();
    match &stats.text_length {
        Some(len) => {
            println!("  TEXT LENGTH (chars)");
            println!("    mean: {:.2} | median: {:.2}", len.mean, len.median);
            println!("    p10: {:.2} | p90: {:.2}", len.p10, len.p90);
            println!("    min: {} | max: {}", len.min, len.max);
        }
        None => println!("  TEXT LENGTH: no texts in sample"),
    }
    println!();
    println!("  NOISE INDICATORS");
    println!("    Empty: {} ({})", stats.empty, format_percent(stats.empty, stats.sampled));
    println!("    Short (<100 chars): {} ({})", stats.short, format_percent(stats.short, stats.sampled));
    println!("    Malformed: {} ({})", stats.malformed, format_percent(stats.malformed, stats.sampled));
    println!();

    let detectors = Detectors::heuristic();
    let categories = summarize_exclusive(input, sample_size, &detectors, filter)?;
    println!("  CATEGORIES (exclusive)");
    for (category, pct) in &categories.percentages {
        println!(
            "    {:<18} {:>8} ({:.2}%)",
            category.label(),
            format_count(categories.count(*category)),
            pct
        );
    }

    if let Some(dir) = report_dir {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "input".to_string());
        let stats_path = dir.join(format!("{}_doc_stats.json", stem));
        let pct_path = dir.join(format!("{}_category_pct.json", stem));
        write_json_pretty(&stats_path, &stats)?;
        write_json_pretty(&pct_path, &categories)?;
        println!();
        println!("  Reports: {:?}, {:?}", stats_path, pct_path);
    }
    footer();
    Ok(())
}
