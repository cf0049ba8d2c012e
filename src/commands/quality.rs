//! Quality Command
//!
//! PII, toxicity, perplexity proxy and language mix over a seeded sample.

use std::path::Path;

use corpus_pipe::data::write_json_pretty;
use corpus_pipe::detect::StopwordLanguageDetector;
use corpus_pipe::error::Result;
use corpus_pipe::report::{audit_quality, ScoreSummary};

use super::{banner, footer};

fn show(name: &str, s: &ScoreSummary) {
    let fmt = |v: Option<f64>| v.map(|x| format!("{:.4}", x)).unwrap_or_else(|| "n/a".into());
    println!(
        "  {:<12} avg: {} | median: {} | max: {} | failed: {}",
        name,
        fmt(s.avg),
        fmt(s.median),
        fmt(s.max),
        s.failed
    );
}

pub fn execute(input: &Path, sample_size: usize, seed: u64, output: Option<&Path>) -> Result<()> {
    banner("🩺 Quality Report");
    println!("  Input: {:?}", input);
    println!("  Sample: {} (seed {})", sample_size, seed);
    println!();

    let report = audit_quality(input, sample_size, seed, &StopwordLanguageDetector::new())?;

    println!("  Samples analyzed: {}", report.samples_analyzed);
    println!("  PII hits: {:?}", report.pii_hits);
    show("toxicity", &report.toxicity);
    show("perplexity", &report.perplexity);
    println!("  Languages: {:?}", report.language_distribution);
    println!("  Time: {:.2}s", report.analysis_time_sec);

    if let Some(path) = output {
        write_json_pretty(path, &report)?;
        println!();
        println!("  Report: {:?}", path);
    }
    footer();
    Ok(())
}
