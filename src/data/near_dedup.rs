// src/data/near_dedup.rs
//! Near-duplicate removal with 64-bit SimHash signatures.
//!
//! Every candidate is compared against all previously kept signatures, so the
//! cost is quadratic in the number of kept documents. Meant for small batches.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::info;

use super::dedup::DedupStats;
use super::record::{JsonlLines, JsonlWriter, Line, TextField};
use crate::error::Result;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Words per shingle
const SHINGLE_WORDS: usize = 8;

pub const DEFAULT_HAMMING_THRESHOLD: u32 = 3;

fn feature_hash(feature: &str) -> u64 {
    let digest = Sha256::digest(feature.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// SimHash over lower-cased alphanumeric word shingles.
pub fn simhash(text: &str) -> u64 {
    let lowered = text.to_lowercase();
    let cleaned = NON_ALNUM.replace_all(&lowered, " ");
    let words: Vec<&str> = cleaned.split_whitespace().collect();

    let mut acc = [0i64; 64];
    for chunk in words.chunks(SHINGLE_WORDS) {
        let h = feature_hash(&chunk.join(" "));
        for (bit, slot) in acc.iter_mut().enumerate() {
            *slot += if (h >> bit) & 1 == 1 { 1 } else { -1 };
        }
    }

    if words.is_empty() {
        return 0;
    }

    acc.iter()
        .enumerate()
        .filter(|(_, v)| **v > 0)
        .fold(0u64, |out, (bit, _)| out | (1u64 << bit))
}

pub fn hamming(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

pub struct NearDeduplicator {
    signatures: Vec<u64>,
    threshold: u32,
}

impl NearDeduplicator {
    pub fn new(threshold: u32) -> Self {
        Self {
            signatures: Vec::new(),
            threshold,
        }
    }

    /// Returns `true` and remembers the signature if no kept document is within the threshold.
    pub fn admit(&mut self, text: &str) -> bool {
        let sig = simhash(text);
        if self
            .signatures
            .iter()
            .any(|prev| hamming(sig, *prev) <= self.threshold)
        {
            return false;
        }
        self.signatures.push(sig);
        true
    }
}

pub fn dedup_near(input: &Path, output: &Path, threshold: u32) -> Result<DedupStats> {
    let mut dedup = NearDeduplicator::new(threshold);
    let mut writer = JsonlWriter::create(output)?;
    let mut stats = DedupStats::default();

    for line in JsonlLines::open(input)? {
        let content = match line? {
            Line::Text { content, .. } => content,
            Line::Undecodable { .. } => {
                stats.malformed += 1;
                continue;
            }
        };
        let row: Value = match serde_json::from_str(&content) {
            Ok(v @ Value::Object(_)) => v,
            _ => {
                stats.malformed += 1;
                continue;
            }
        };
        let text = match TextField::of(&row) {
            TextField::Text(s) => s,
            _ => "",
        };

        if dedup.admit(text) {
            writer.write_line(&content)?;
            stats.kept += 1;
        } else {
            stats.dropped += 1;
        }
    }

    writer.finish()?;
    info!(
        kept = stats.kept,
        dropped = stats.dropped,
        threshold,
        "near dedup done"
    );
    Ok(stats)
}
