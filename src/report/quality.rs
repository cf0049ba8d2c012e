// src/report/quality.rs
//! Quality audit of a cleaned corpus sample: PII hits, toxicity, a perplexity
//! proxy and the language mix. Read-only; nothing here filters documents.

use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::stats::{mean, median};
use crate::data::{JsonlLines, Line, TextField};
use crate::detect::LanguageDetector;
use crate::error::Result;

static PII: Lazy<PiiPatterns> = Lazy::new(PiiPatterns::new);

struct PiiPatterns {
    email: Regex,
    phone: Regex,
    credit_card: Regex,
}

impl PiiPatterns {
    fn new() -> Self {
        Self {
            email: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            phone: Regex::new(r"\b(\+?\d[\d\-\s]{7,}\d)\b").unwrap(),
            credit_card: Regex::new(r"\b(?:\d[ -]*?){13,16}\b").unwrap(),
        }
    }
}

/// Kinds of personal data found in `text`.
pub fn detect_pii(text: &str) -> Vec<&'static str> {
    let p = &*PII;
    let mut found = Vec::new();
    if p.email.is_match(text) {
        found.push("email");
    }
    if p.phone.is_match(text) {
        found.push("phone");
    }
    if p.credit_card.is_match(text) {
        found.push("credit_card");
    }
    found
}

/// A per-document score, or why it could not be computed.
#[derive(Debug, Clone, PartialEq)]
pub enum Score {
    Value(f64),
    Failed(String),
}

pub trait QualityScorer {
    fn name(&self) -> &str;
    fn score(&self, text: &str) -> Score;
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

const TOXIC_WORDS: &[&str] = &[
    "idiot", "idiots", "stupid", "moron", "morons", "dumb", "loser", "losers", "hate",
    "kill", "pathetic", "disgusting", "worthless", "scum", "trash", "crap", "damn",
    "shut", "ugly", "fool", "fools", "jerk", "bastard", "freak",
];

/// Share of words found in a small abuse lexicon, in `[0, 1]`.
pub struct LexiconToxicity {
    lexicon: HashSet<&'static str>,
}

impl LexiconToxicity {
    pub fn new() -> Self {
        Self {
            lexicon: TOXIC_WORDS.iter().copied().collect(),
        }
    }
}

impl Default for LexiconToxicity {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityScorer for LexiconToxicity {
    fn name(&self) -> &str {
        "lexicon_toxicity"
    }

    fn score(&self, text: &str) -> Score {
        let mut total = 0usize;
        let mut hits = 0usize;
        for w in words(text) {
            total += 1;
            if self.lexicon.contains(w.as_str()) {
                hits += 1;
            }
        }
        if total == 0 {
            return Score::Failed("no words".into());
        }
        Score::Value(hits as f64 / total as f64)
    }
}

/// Word-unigram perplexity with add-one smoothing, fitted on a reference sample.
pub struct UnigramPerplexity {
    counts: HashMap<String, usize>,
    total: usize,
}

impl UnigramPerplexity {
    pub fn fit<S: AsRef<str>>(docs: &[S]) -> Self {
        let mut counts = HashMap::new();
        let mut total = 0usize;
        for doc in docs {
            for w in words(doc.as_ref()) {
                *counts.entry(w).or_insert(0) += 1;
                total += 1;
            }
        }
        Self { counts, total }
    }

    fn log_prob(&self, word: &str) -> f64 {
        let count = self.counts.get(word).copied().unwrap_or(0);
        // one extra slot for unseen words
        let denom = (self.total + self.counts.len() + 1) as f64;
        ((count + 1) as f64 / denom).ln()
    }
}

impl QualityScorer for UnigramPerplexity {
    fn name(&self) -> &str {
        "unigram_perplexity"
    }

    fn score(&self, text: &str) -> Score {
        let mut n = 0usize;
        let mut log_sum = 0.0;
        for w in words(text) {
            n += 1;
            log_sum += self.log_prob(&w);
        }
        if n == 0 {
            return Score::Failed("no words".into());
        }
        Score::Value((-log_sum / n as f64).exp())
    }
}

/// Uniform sample of up to `n` non-blank texts, reproducible for a given seed.
pub fn reservoir_sample(path: &Path, n: usize, seed: u64) -> Result<Vec<String>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut reservoir: Vec<String> = Vec::with_capacity(n);
    let mut seen = 0usize;

    for line in JsonlLines::open(path)? {
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

        seen += 1;
        if reservoir.len() < n {
            reservoir.push(text.to_string());
        } else {
            let j = rng.gen_range(0..seen);
            if j < n {
                reservoir[j] = text.to_string();
            }
        }
    }

    debug!(seen, sampled = reservoir.len(), "reservoir sample drawn");
    Ok(reservoir)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub avg: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
    /// Documents whose score could not be computed.
    pub failed: usize,
}

impl ScoreSummary {
    fn from_scores(scores: &mut [f64], failed: usize) -> Self {
        scores.sort_by(|a, b| a.total_cmp(b));
        Self {
            avg: mean(scores),
            max: scores.last().copied(),
            median: median(scores),
            failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub samples_analyzed: usize,
    pub pii_hits: BTreeMap<String, usize>,
    pub toxicity: ScoreSummary,
    pub perplexity: ScoreSummary,
    pub language_distribution: BTreeMap<String, usize>,
    pub analysis_time_sec: f64,
}

fn collect_scores(docs: &[String], scorer: &dyn QualityScorer) -> ScoreSummary {
    let mut values = Vec::with_capacity(docs.len());
    let mut failed = 0usize;
    for doc in docs {
        match scorer.score(doc) {
            Score::Value(v) if v.is_finite() => values.push(v),
            Score::Value(v) => {
                debug!(scorer = scorer.name(), value = v, "non-finite score dropped");
                failed += 1;
            }
            Score::Failed(reason) => {
                debug!(scorer = scorer.name(), %reason, "score failed");
                failed += 1;
            }
        }
    }
    ScoreSummary::from_scores(&mut values, failed)
}

/// Scores an in-memory sample.
pub fn quality_report(
    docs: &[String],
    lang: &dyn LanguageDetector,
    toxicity: &dyn QualityScorer,
    perplexity: &dyn QualityScorer,
) -> QualityReport {
    let start = Instant::now();

    let mut pii_hits = BTreeMap::new();
    let mut language_distribution = BTreeMap::new();
    for doc in docs {
        for kind in detect_pii(doc) {
            *pii_hits.entry(kind.to_string()).or_insert(0) += 1;
        }
        let label = lang.detect_lang(doc).label().to_string();
        *language_distribution.entry(label).or_insert(0) += 1;
    }

    let toxicity = collect_scores(docs, toxicity);
    let perplexity = collect_scores(docs, perplexity);

    let elapsed = start.elapsed().as_secs_f64();
    QualityReport {
        samples_analyzed: docs.len(),
        pii_hits,
        toxicity,
        perplexity,
        language_distribution,
        analysis_time_sec: (elapsed * 100.0).round() / 100.0,
    }
}

/// Samples `path` and scores it with the shipped scorers.
pub fn audit_quality(
    path: &Path,
    sample_size: usize,
    seed: u64,
    lang: &dyn LanguageDetector,
) -> Result<QualityReport> {
    let docs = reservoir_sample(path, sample_size, seed)?;
    let toxicity = LexiconToxicity::new();
    let perplexity = UnigramPerplexity::fit(&docs);
    let report = quality_report(&docs, lang, &toxicity, &perplexity);
    info!(
        samples = report.samples_analyzed,
        secs = report.analysis_time_sec,
        "quality audit done"
    );
    Ok(report)
}
