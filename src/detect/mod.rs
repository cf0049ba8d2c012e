//! Document detectors consumed by the filter chain and the reports.
//!
//! Each detector sits behind a trait so the chain only sees its verdict. The
//! heuristic implementations shipped here are regex/lexicon based.

mod code;
mod html;
mod language;

pub use code::{is_code_line, LineCodeScorer};
pub use html::RegexHtmlDetector;
pub use language::StopwordLanguageDetector;

/// Threshold above which a document counts as code-heavy.
pub const CODE_HEAVY_THRESHOLD: f64 = 0.40;

pub trait HtmlDetector {
    /// Markup tags, entities or script/style blocks present.
    fn has_html(&self, text: &str) -> bool;
    fn strip_html(&self, text: &str) -> String;
}

/// Outcome of a language-identification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LangDetection {
    /// ISO 639-1 code, upper case ("EN", "FR", ...).
    Detected(String),
    Unknown,
    Failed(String),
}

impl LangDetection {
    pub fn label(&self) -> &str {
        match self {
            LangDetection::Detected(code) => code,
            LangDetection::Unknown => "UNKNOWN",
            LangDetection::Failed(_) => "ERROR",
        }
    }

    /// Only a positive English verdict counts; failures never do.
    pub fn is_english(&self) -> bool {
        matches!(self, LangDetection::Detected(code) if code == "EN")
    }
}

pub trait LanguageDetector {
    fn detect_lang(&self, text: &str) -> LangDetection;
}

pub trait CodeScorer {
    /// Fraction in `[0, 1]` of non-blank lines that look like source code.
    fn code_fraction(&self, text: &str) -> f64;
}

/// The detector services for one run.
pub struct Detectors {
    pub html: Box<dyn HtmlDetector>,
    pub lang: Box<dyn LanguageDetector>,
    pub code: Box<dyn CodeScorer>,
}

impl Detectors {
    pub fn heuristic() -> Self {
        Self {
            html: Box::new(RegexHtmlDetector),
            lang: Box::new(StopwordLanguageDetector::new()),
            code: Box::new(LineCodeScorer),
        }
    }

    pub fn with_html(mut self, html: impl HtmlDetector + 'static) -> Self {
        self.html = Box::new(html);
        self
    }

    pub fn with_lang(mut self, lang: impl LanguageDetector + 'static) -> Self {
        self.lang = Box::new(lang);
        self
    }

    pub fn with_code(mut self, code: impl CodeScorer + 'static) -> Self {
        self.code = Box::new(code);
        self
    }
}

impl Default for Detectors {
    fn default() -> Self {
        Self::heuristic()
    }
}
