// src/report/inspect.rs
//! Corpus inspection: file overview, text length distribution and an
//! exclusive category breakdown over the first `sample_size` lines.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::info;

use super::stats::{mean, median, percentile, sorted_lengths};
use crate::config::FilterConfig;
use crate::data::{count_lines, JsonlLines, Line, TextField};
use crate::detect::Detectors;
use crate::error::{PipeError, Result};

/// Texts shorter than this count as short in the noise indicators.
const SHORT_TEXT_CHARS: usize = 100;
const TOP_KEYS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthStats {
    pub mean: f64,
    pub median: f64,
    pub p10: f64,
    pub p90: f64,
    pub min: usize,
    pub max: usize,
}

impl LengthStats {
    fn from_lengths(lengths: &[usize]) -> Option<Self> {
        let sorted = sorted_lengths(lengths);
        Some(Self {
            mean: mean(&sorted)?,
            median: median(&sorted)?,
            p10: percentile(&sorted, 10.0)?,
            p90: percentile(&sorted, 90.0)?,
            min: lengths.iter().copied().min()?,
            max: lengths.iter().copied().max()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickStats {
    pub path: PathBuf,
    pub file_size_bytes: u64,
    pub total_lines: usize,
    pub sampled: usize,
    pub top_keys: Vec<(String, usize)>,
    /// Character lengths of `text`; absent when no sampled line had one.
    pub text_length: Option<LengthStats>,
    pub empty: usize,
    pub short: usize,
    pub malformed: usize,
}

/// File overview plus length statistics of the first `sample_size` lines.
pub fn quick_stats(path: &Path, sample_size: usize) -> Result<QuickStats> {
    let file_size_bytes = std::fs::metadata(path)
        .map_err(|_| PipeError::FileNotFound(path.to_path_buf()))?
        .len();
    let total_lines = count_lines(path)?;

    let mut key_counts: HashMap<String, usize> = HashMap::new();
    let mut lengths = Vec::new();
    let mut sampled = 0usize;
    let mut empty = 0usize;
    let mut short = 0usize;
    let mut malformed = 0usize;

    for line in JsonlLines::open(path)?.take(sample_size) {
        sampled += 1;
        let row = match parse_object(line?) {
            Some(row) => row,
            None => {
                malformed += 1;
                continue;
            }
        };
        if let Value::Object(map) = &row {
            for key in map.keys() {
                *key_counts.entry(key.clone()).or_insert(0) += 1;
            }
        }

        let len = match TextField::of(&row) {
            TextField::Text(s) => s.chars().count(),
            TextField::Missing => 0,
            TextField::NotText => {
                malformed += 1;
                continue;
            }
        };
        lengths.push(len);
        if len == 0 {
            empty += 1;
        }
        if len < SHORT_TEXT_CHARS {
            short += 1;
        }
    }

    let mut top_keys: Vec<(String, usize)> = key_counts.into_iter().collect();
    top_keys.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_keys.truncate(TOP_KEYS);

    let stats = QuickStats {
        path: path.to_path_buf(),
        file_size_bytes,
        total_lines,
        sampled,
        top_keys,
        text_length: LengthStats::from_lengths(&lengths),
        empty,
        short,
        malformed,
    };
    info!(
        path = %path.display(),
        lines = total_lines,
        sampled,
        empty,
        short,
        malformed,
        "inspection done"
    );
    Ok(stats)
}

fn parse_object(line: Line) -> Option<Value> {
    match line {
        Line::Text { content, .. } => match serde_json::from_str::<Value>(&content) {
            Ok(row @ Value::Object(_)) => Some(row),
            _ => None,
        },
        Line::Undecodable { .. } => None,
    }
}

/// Exactly one category per document, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Malformed,
    Empty,
    Html,
    CodeHeavy,
    NonEnglishLang,
    GoodEnglish,
    ShortEnglish,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Malformed => "MALFORMED",
            Category::Empty => "EMPTY",
            Category::Html => "HTML",
            Category::CodeHeavy => "CODE_HEAVY",
            Category::NonEnglishLang => "NON_ENGLISH_LANG",
            Category::GoodEnglish => "GOOD_ENGLISH",
            Category::ShortEnglish => "SHORT_ENGLISH",
        }
    }
}

/// Classifies a non-empty, trimmed text.
pub fn classify(text: &str, detectors: &Detectors, config: &FilterConfig) -> Category {
    if detectors.html.has_html(text) {
        return Category::Html;
    }
    if detectors.code.code_fraction(text) > config.code_threshold {
        return Category::CodeHeavy;
    }
    if !detectors.lang.detect_lang(text).is_english() {
        return Category::NonEnglishLang;
    }
    if text.chars().count() >= config.min_chars {
        Category::GoodEnglish
    } else {
        Category::ShortEnglish
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub sampled: usize,
    pub counts: BTreeMap<Category, usize>,
    /// Share of `sampled`, in percent.
    pub percentages: BTreeMap<Category, f64>,
}

impl CategorySummary {
    pub fn count(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }
}

pub fn summarize_exclusive(
    path: &Path,
    sample_size: usize,
    detectors: &Detectors,
    config: &FilterConfig,
) -> Result<CategorySummary> {
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    let mut sampled = 0usize;

    for line in JsonlLines::open(path)?.take(sample_size) {
        sampled += 1;
        let category = match parse_object(line?) {
            None => Category::Malformed,
            Some(row) => match TextField::of(&row) {
                TextField::NotText => Category::Malformed,
                TextField::Missing => Category::Empty,
                TextField::Text(s) if s.trim().is_empty() => Category::Empty,
                TextField::Text(s) => classify(s.trim(), detectors, config),
            },
        };
        *counts.entry(category).or_insert(0) += 1;
    }

    let percentages = counts
        .iter()
        .map(|(&k, &v)| (k, v as f64 / sampled.max(1) as f64 * 100.0))
        .collect();

    Ok(CategorySummary {
        sampled,
        counts,
        percentages,
    })
}
