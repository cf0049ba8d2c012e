//! Common test utilities and helpers
//!
//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use corpus_pipe::{PipelineConfig, TokenRecord, TokenizerAdapter, WordEncoder};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The short English document that passes every filter once its `<p>` is stripped.
pub const SCENARIO_DOC: &str = "<p>Hello world, this is a sufficiently long piece of English prose that \
exceeds two hundred characters so it passes the length filter after html stripping and should be \
kept for pretraining purposes absolutely.</p>";

/// Writes one JSON value per line
pub fn write_jsonl(path: &Path, rows: &[serde_json::Value]) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    let mut file = std::fs::File::create(path).expect("Failed to create jsonl file");
    for row in rows {
        writeln!(file, "{}", row).expect("Failed to write row");
    }
    path.to_path_buf()
}

/// Writes `{"text": ...}` records
pub fn write_texts(path: &Path, texts: &[&str]) -> PathBuf {
    let rows: Vec<serde_json::Value> = texts.iter().map(|t| serde_json::json!({ "text": t })).collect();
    write_jsonl(path, &rows)
}

pub fn write_sequences(path: &Path, seqs: &[Vec<u32>]) -> PathBuf {
    let rows: Vec<serde_json::Value> = seqs
        .iter()
        .map(|s| serde_json::to_value(TokenRecord::new(s.clone())).expect("serializable"))
        .collect();
    write_jsonl(path, &rows)
}

/// Word-per-id adapter with a small vocabulary
pub fn word_adapter() -> TokenizerAdapter {
    TokenizerAdapter::new(Box::new(WordEncoder::with_capacity(1_000)))
}

/// Config rooted in a temp dir, using the word encoder
pub fn test_config(root: &Path, raw: &Path) -> PipelineConfig {
    PipelineConfig::new()
        .with_raw_path(raw)
        .with_work_dir(root)
        .with_encoder(corpus_pipe::EncoderKind::Words)
        .with_samples(100, 50)
}

/// Random sequences of length `1..=max_len`, ids below `vocab`
pub fn random_sequences(count: usize, max_len: usize, vocab: u32, seed: u64) -> Vec<Vec<u32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.gen_range(1..=max_len);
            (0..len).map(|_| rng.gen_range(0..vocab)).collect()
        })
        .collect()
}

/// Every `shard_*.jsonl` under `dir`, in name order
pub fn shard_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|rd| rd.flatten().map(|e| e.path()).collect())
        .unwrap_or_default();
    files.retain(|p| p.extension().map_or(false, |e| e == "jsonl"));
    files.sort();
    files
}
