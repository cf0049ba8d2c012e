// src/data/cleaner.rs
//! Ordered document filter chain.
//!
//! Rules run in a fixed order and the first terminal rule decides a document's
//! fate. HTML stripping is the only non-terminal rule: it rewrites the text and
//! lets the document continue.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, trace};

use super::normalize::TextNormalizer;
use super::record::{CleanDoc, JsonlLines, JsonlWriter, Line, TextField};
use crate::config::FilterConfig;
use crate::detect::{Detectors, LangDetection};
use crate::error::Result;

/// Per-document outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Empty,
    HtmlStripped,
    NonEnglish,
    CodeHeavy,
    TooShort,
    TooLong,
    Malformed,
    Error,
    Kept,
}

impl Outcome {
    pub const ALL: [Outcome; 9] = [
        Outcome::Empty,
        Outcome::HtmlStripped,
        Outcome::NonEnglish,
        Outcome::CodeHeavy,
        Outcome::TooShort,
        Outcome::TooLong,
        Outcome::Malformed,
        Outcome::Error,
        Outcome::Kept,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Empty => "EMPTY",
            Outcome::HtmlStripped => "HTML_STRIPPED",
            Outcome::NonEnglish => "NON_ENGLISH",
            Outcome::CodeHeavy => "CODE_HEAVY",
            Outcome::TooShort => "TOO_SHORT",
            Outcome::TooLong => "TOO_LONG",
            Outcome::Malformed => "MALFORMED",
            Outcome::Error => "ERROR",
            Outcome::Kept => "KEPT",
        }
    }
}

/// Outcome tally for one cleaning run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CleaningCounters(BTreeMap<Outcome, usize>);

impl CleaningCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome) {
        *self.0.entry(outcome).or_insert(0) += 1;
    }

    pub fn get(&self, outcome: Outcome) -> usize {
        self.0.get(&outcome).copied().unwrap_or(0)
    }

    /// Sum over all labels. HTML_STRIPPED overlaps with the terminal labels.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Outcome, usize)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// What the chain decided for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Terminal label: `Kept` or the reason for dropping.
    pub outcome: Outcome,
    pub html_stripped: bool,
    /// Normalized text, present only when kept.
    pub text: Option<String>,
}

impl Verdict {
    fn drop(outcome: Outcome, html_stripped: bool) -> Self {
        Self {
            outcome,
            html_stripped,
            text: None,
        }
    }

    pub fn is_kept(&self) -> bool {
        self.outcome == Outcome::Kept
    }
}

pub struct FilterChain {
    detectors: Detectors,
    config: FilterConfig,
    normalizer: TextNormalizer,
}

impl FilterChain {
    pub fn new(detectors: Detectors, config: FilterConfig) -> Self {
        Self {
            detectors,
            config,
            normalizer: TextNormalizer::new(),
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn detectors(&self) -> &Detectors {
        &self.detectors
    }

    /// Runs every rule on a document's text.
    pub fn evaluate(&self, raw: &str) -> Verdict {
        // 1. Empty
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Verdict::drop(Outcome::Empty, false);
        }

        // 2. HTML
        let mut html_stripped = false;
        let stripped;
        let text = if self.detectors.html.has_html(trimmed) {
            html_stripped = true;
            stripped = self.detectors.html.strip_html(trimmed);
            stripped.as_str()
        } else {
            trimmed
        };

        // 3. Language
        match self.detectors.lang.detect_lang(text) {
            LangDetection::Failed(reason) => {
                debug!(%reason, "language detector failed");
                return Verdict::drop(Outcome::Error, html_stripped);
            }
            lang if !lang.is_english() => {
                trace!(lang = lang.label(), "non-english");
                return Verdict::drop(Outcome::NonEnglish, html_stripped);
            }
            _ => {}
        }

        // 4. Code
        if self.detectors.code.code_fraction(text) > self.config.code_threshold {
            return Verdict::drop(Outcome::CodeHeavy, html_stripped);
        }

        // 5. Length, in characters
        let len = text.chars().count();
        if len < self.config.min_chars {
            return Verdict::drop(Outcome::TooShort, html_stripped);
        }
        if len > self.config.max_chars {
            return Verdict::drop(Outcome::TooLong, html_stripped);
        }

        // 6. Normalize
        Verdict {
            outcome: Outcome::Kept,
            html_stripped,
            text: Some(self.normalizer.normalize(text)),
        }
    }

    /// Evaluates a parsed record and tallies the result.
    pub fn apply(&self, row: &Value, counters: &mut CleaningCounters) -> Option<String> {
        let text = match (row, TextField::of(row)) {
            (Value::Object(_), TextField::Text(s)) => s,
            _ => {
                counters.record(Outcome::Malformed);
                return None;
            }
        };

        let verdict = self.evaluate(text);
        if verdict.html_stripped {
            counters.record(Outcome::HtmlStripped);
        }
        counters.record(verdict.outcome);
        verdict.text
    }
}

/// Cleans `input` into `output` (`{"text": ...}` per line) and returns the tally.
pub fn clean_dataset(input: &Path, output: &Path, chain: &FilterChain) -> Result<CleaningCounters> {
    let mut counters = CleaningCounters::new();
    let mut writer = JsonlWriter::create(output)?;

    for line in JsonlLines::open(input)? {
        let content = match line? {
            Line::Text { content, .. } => content,
            Line::Undecodable { number } => {
                debug!(line = number, "undecodable line");
                counters.record(Outcome::Malformed);
                continue;
            }
        };

        let row: Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(_) => {
                counters.record(Outcome::Malformed);
                continue;
            }
        };

        if let Some(text) = chain.apply(&row, &mut counters) {
            writer.write_record(&CleanDoc { text })?;
        }
    }

    let written = writer.finish()?;
    info!(kept = written, "cleaning finished");
    for (outcome, count) in counters.iter() {
        info!("{:>13}: {}", outcome.label(), count);
    }
    Ok(counters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{CodeScorer, LanguageDetector};

    struct FixedLang(LangDetection);
    impl LanguageDetector for FixedLang {
        fn detect_lang(&self, _text: &str) -> LangDetection {
            self.0.clone()
        }
    }

    struct FixedCode(f64);
    impl CodeScorer for FixedCode {
        fn code_fraction(&self, _text: &str) -> f64 {
            self.0
        }
    }

    fn chain(lang: LangDetection, code: f64) -> FilterChain {
        let detectors = Detectors::heuristic()
            .with_lang(FixedLang(lang))
            .with_code(FixedCode(code));
        FilterChain::new(detectors, FilterConfig::default())
    }

    fn english() -> LangDetection {
        LangDetection::Detected("EN".into())
    }

    #[test]
    fn test_empty_first() {
        let v = chain(LangDetection::Failed("x".into()), 1.0).evaluate("   \n\t ");
        assert_eq!(v, Verdict::drop(Outcome::Empty, false));
    }

    #[test]
    fn test_detector_failure_is_error_not_kept() {
        let v = chain(LangDetection::Failed("model crashed".into()), 0.0).evaluate(&"word ".repeat(100));
        assert_eq!(v.outcome, Outcome::Error);
        assert!(v.text.is_none());
    }

    #[test]
    fn test_unknown_language_dropped() {
        let v = chain(LangDetection::Unknown, 0.0).evaluate(&"word ".repeat(100));
        assert_eq!(v.outcome, Outcome::NonEnglish);
    }

    #[test]
    fn test_code_threshold_is_strict() {
        let text = "a".repeat(300);
        assert_eq!(chain(english(), 0.40).evaluate(&text).outcome, Outcome::Kept);
        assert_eq!(chain(english(), 0.41).evaluate(&text).outcome, Outcome::CodeHeavy);
    }

    #[test]
    fn test_length_bounds_in_chars() {
        let c = chain(english(), 0.0);
        assert_eq!(c.evaluate(&"é".repeat(199)).outcome, Outcome::TooShort);
        assert_eq!(c.evaluate(&"é".repeat(200)).outcome, Outcome::Kept);
        assert_eq!(c.evaluate(&"x".repeat(50_000)).outcome, Outcome::Kept);
        assert_eq!(c.evaluate(&"x".repeat(50_001)).outcome, Outcome::TooLong);
    }

    #[test]
    fn test_html_is_stripped_and_counted_even_when_dropped() {
        let c = chain(english(), 0.0);
        let v = c.evaluate("<b>short</b>");
        assert_eq!(v, Verdict::drop(Outcome::TooShort, true));

        let mut counters = CleaningCounters::new();
        let row = serde_json::json!({"text": "<b>short</b>"});
        assert!(c.apply(&row, &mut counters).is_none());
        assert_eq!(counters.get(Outcome::HtmlStripped), 1);
        assert_eq!(counters.get(Outcome::TooShort), 1);
    }

    #[test]
    fn test_missing_text_is_malformed() {
        let c = chain(english(), 0.0);
        let mut counters = CleaningCounters::new();
        c.apply(&serde_json::json!({"body": "x"}), &mut counters);
        c.apply(&serde_json::json!({"text": 12}), &mut counters);
        c.apply(&serde_json::json!(["text"]), &mut counters);
        assert_eq!(counters.get(Outcome::Malformed), 3);
    }

    #[test]
    fn test_verdict_is_deterministic() {
        let c = FilterChain::new(Detectors::heuristic(), FilterConfig::default());
        let text = "The committee met on Tuesday and the members of the board agreed that \
                    the budget for the coming year should be reviewed again in spring, \
                    because the costs of the new building were far higher than what \
                    had been planned at the start of the project.";
        let first = c.evaluate(text);
        for _ in 0..5 {
            assert_eq!(c.evaluate(text), first);
        }
        assert_eq!(first.outcome, Outcome::Kept);
    }

    #[test]
    fn test_counters_serialize_with_labels() {
        let mut counters = CleaningCounters::new();
        counters.record(Outcome::Kept);
        counters.record(Outcome::Empty);
        counters.record(Outcome::Kept);
        let json = serde_json::to_string(&counters).unwrap();
        assert_eq!(json, "{\"EMPTY\":1,\"KEPT\":2}");
        assert_eq!(counters.total(), 3);
    }
}
