// src/data/dedup.rs
//! Exact deduplication by SHA-256 of the raw document text.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use super::record::{JsonlLines, JsonlWriter, Line, TextField};
use crate::error::Result;

/// Fixed-width digest of a document's raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        Self(digest.into())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    pub kept: usize,
    pub dropped: usize,
    pub malformed: usize,
}

/// In-memory set of hashes seen during one run.
///
/// Grows with the number of distinct documents; the whole set has to fit in memory.
#[derive(Debug, Default)]
pub struct ExactDeduplicator {
    seen: HashSet<ContentHash>,
}

impl ExactDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `text` is seen.
    pub fn admit(&mut self, text: &str) -> bool {
        self.seen.insert(ContentHash::of(text))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Text the hash is computed over. Records without a string `text` hash its JSON form.
fn dedup_key(row: &Value) -> std::borrow::Cow<'_, str> {
    match TextField::of(row) {
        TextField::Text(s) => s.into(),
        TextField::Missing => "".into(),
        TextField::NotText => row["text"].to_string().into(),
    }
}

/// Streams `input` to `output`, dropping records whose raw text was already seen.
/// Kept lines are copied byte-for-byte; unparseable lines are skipped.
pub fn dedup_exact(input: &Path, output: &Path) -> Result<DedupStats> {
    let mut dedup = ExactDeduplicator::new();
    let mut writer = JsonlWriter::create(output)?;
    let mut stats = DedupStats::default();

    for line in JsonlLines::open(input)? {
        let (number, content) = match line? {
            Line::Text { number, content } => (number, content),
            Line::Undecodable { number } => {
                debug!(line = number, "skipping undecodable line");
                stats.malformed += 1;
                continue;
            }
        };

        let row: Value = match serde_json::from_str(&content) {
            Ok(v @ Value::Object(_)) => v,
            _ => {
                debug!(line = number, "skipping malformed record");
                stats.malformed += 1;
                continue;
            }
        };

        if dedup.admit(&dedup_key(&row)) {
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
        malformed = stats.malformed,
        "exact dedup done"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_hash_is_stable_hex() {
        let a = ContentHash::of("hello");
        assert_eq!(a, ContentHash::of("hello"));
        assert_ne!(a, ContentHash::of("hello "));
        assert_eq!(
            a.to_string(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_dedup_keeps_first_and_passthrough_fields() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("raw.jsonl");
        let output = dir.path().join("dedup.jsonl");
        std::fs::write(
            &input,
            concat!(
                "{\"text\":\"a\",\"id\":1}\n",
                "not json\n",
                "{\"text\":\"b\"}\n",
                "{\"text\":\"a\",\"id\":2}\n",
            ),
        )
        .unwrap();

        let stats = dedup_exact(&input, &output).unwrap();
        assert_eq!(stats, DedupStats { kept: 2, dropped: 1, malformed: 1 });

        let out = std::fs::read_to_string(&output).unwrap();
        assert_eq!(out, "{\"text\":\"a\",\"id\":1}\n{\"text\":\"b\"}\n");
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("raw.jsonl");
        let once = dir.path().join("once.jsonl");
        let twice = dir.path().join("twice.jsonl");
        std::fs::write(&input, "{\"text\":\"x\"}\n{\"text\":\"x\"}\n{\"text\":\"y\"}\n[1]\n").unwrap();

        dedup_exact(&input, &once).unwrap();
        let second = dedup_exact(&once, &twice).unwrap();

        assert_eq!(second.dropped, 0);
        assert_eq!(second.malformed, 0);
        assert_eq!(
            std::fs::read_to_string(&once).unwrap(),
            std::fs::read_to_string(&twice).unwrap()
        );
    }
}
