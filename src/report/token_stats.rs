// src/report/token_stats.rs

use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::info;

use super::stats::{mean, median, percentile, sorted_lengths};
use crate::data::{JsonlLines, Line, TextField};
use crate::error::Result;
use crate::tokenizer::Encoder;

/// Encoder token counts per cleaned document, sentinels excluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenLengthStats {
    pub docs_counted: usize,
    pub avg_tokens: f64,
    pub median_tokens: f64,
    pub p95_tokens: f64,
    pub p99_tokens: f64,
    pub max_tokens: usize,
}

pub fn token_length_stats(path: &Path, encoder: &dyn Encoder, max_docs: Option<usize>) -> Result<TokenLengthStats> {
    let mut lengths: Vec<usize> = Vec::new();

    for line in JsonlLines::open(path)?.take(max_docs.unwrap_or(usize::MAX)) {
        let Line::Text { content, .. } = line? else {
            continue;
        };
        let Ok(row) = serde_json::from_str::<Value>(&content) else {
            continue;
        };
        let TextField::Text(text) = TextField::of(&row) else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }
        lengths.push(encoder.encode(text).len());
    }

    let sorted = sorted_lengths(&lengths);

    let stats = TokenLengthStats {
        docs_counted: lengths.len(),
        avg_tokens: mean(&sorted).unwrap_or(0.0),
        median_tokens: median(&sorted).unwrap_or(0.0),
        p95_tokens: percentile(&sorted, 95.0).unwrap_or(0.0),
        p99_tokens: percentile(&sorted, 99.0).unwrap_or(0.0),
        max_tokens: lengths.iter().copied().max().unwrap_or(0),
    };
    info!(
        docs = stats.docs_counted,
        avg = format!("{:.1}", stats.avg_tokens),
        max = stats.max_tokens,
        "token length stats"
    );
    Ok(stats)
}
