// src/detect/language.rs
//! Stopword-profile language identification.
//!
//! Scores each candidate language by the share of words found in its stopword
//! list. Documents written mostly in a non-Latin script are classified by
//! script instead.

use std::collections::HashSet;

use super::{LangDetection, LanguageDetector};

/// Below this many words there is no reliable signal.
const MIN_WORDS: usize = 3;
/// Minimum share of stopwords for the winning profile.
const MIN_STOPWORD_SHARE: f64 = 0.05;

const PROFILES: &[(&str, &[&str])] = &[
    (
        "EN",
        &[
            "the", "of", "and", "to", "in", "is", "that", "for", "it", "was", "on", "with",
            "as", "be", "by", "this", "are", "or", "from", "at", "which", "but", "not",
            "have", "has", "an", "they", "you", "he", "she", "we", "his", "her", "their",
            "were", "been", "would", "there", "what", "so", "if", "can", "will", "about",
        ],
    ),
    (
        "FR",
        &[
            "le", "la", "les", "des", "et", "est", "une", "un", "du", "que", "qui", "dans",
            "pour", "pas", "sur", "au", "avec", "ce", "il", "elle", "nous", "vous", "sont",
            "mais", "ou", "aux", "cette", "par",
        ],
    ),
    (
        "ES",
        &[
            "el", "la", "los", "las", "de", "y", "que", "en", "un", "una", "es", "por",
            "con", "para", "del", "se", "su", "al", "lo", "como", "pero", "sus", "le",
            "ya", "muy", "fue",
        ],
    ),
    (
        "PT",
        &[
            "o", "a", "os", "as", "de", "e", "que", "em", "um", "uma", "do", "da", "dos",
            "das", "no", "na", "para", "com", "por", "se", "não", "mais", "foi", "ao",
            "como", "seu", "sua",
        ],
    ),
    (
        "DE",
        &[
            "der", "die", "das", "und", "ist", "nicht", "ein", "eine", "zu", "den", "mit",
            "von", "sich", "des", "auf", "für", "im", "dem", "auch", "es", "wird", "sind",
            "wie", "oder", "aber",
        ],
    ),
    (
        "IT",
        &[
            "il", "lo", "gli", "di", "che", "è", "e", "un", "una", "per", "non", "sono",
            "del", "della", "con", "si", "da", "nel", "anche", "come", "ma", "questo",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Latin,
    Cyrillic,
    Greek,
    Arabic,
    Hebrew,
    Devanagari,
    Han,
    Kana,
    Hangul,
    Thai,
    Other,
}

fn script_of(c: char) -> Option<Script> {
    if !c.is_alphabetic() {
        return None;
    }
    let script = match c as u32 {
        0x0041..=0x024F | 0x1E00..=0x1EFF => Script::Latin,
        0x0370..=0x03FF => Script::Greek,
        0x0400..=0x052F => Script::Cyrillic,
        0x0590..=0x05FF => Script::Hebrew,
        0x0600..=0x06FF | 0x0750..=0x077F => Script::Arabic,
        0x0900..=0x097F => Script::Devanagari,
        0x0E00..=0x0E7F => Script::Thai,
        0x3040..=0x30FF => Script::Kana,
        0xAC00..=0xD7AF | 0x1100..=0x11FF => Script::Hangul,
        0x4E00..=0x9FFF | 0x3400..=0x4DBF => Script::Han,
        _ => Script::Other,
    };
    Some(script)
}

fn script_code(script: Script) -> Option<&'static str> {
    match script {
        Script::Cyrillic => Some("RU"),
        Script::Greek => Some("EL"),
        Script::Arabic => Some("AR"),
        Script::Hebrew => Some("HE"),
        Script::Devanagari => Some("HI"),
        Script::Han => Some("ZH"),
        Script::Kana => Some("JA"),
        Script::Hangul => Some("KO"),
        Script::Thai => Some("TH"),
        Script::Latin | Script::Other => None,
    }
}

pub struct StopwordLanguageDetector {
    profiles: Vec<(&'static str, HashSet<&'static str>)>,
}

impl StopwordLanguageDetector {
    pub fn new() -> Self {
        let profiles = PROFILES
            .iter()
            .map(|(code, words)| (*code, words.iter().copied().collect()))
            .collect();
        Self { profiles }
    }

    fn dominant_script(text: &str) -> Option<Script> {
        let mut counts: Vec<(Script, usize)> = Vec::new();
        for script in text.chars().filter_map(script_of) {
            match counts.iter_mut().find(|(s, _)| *s == script) {
                Some((_, n)) => *n += 1,
                None => counts.push((script, 1)),
            }
        }
        counts.into_iter().max_by_key(|(_, n)| *n).map(|(s, _)| s)
    }
}

impl Default for StopwordLanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for StopwordLanguageDetector {
    fn detect_lang(&self, text: &str) -> LangDetection {
        let script = match Self::dominant_script(text) {
            Some(s) => s,
            None => return LangDetection::Unknown,
        };
        if let Some(code) = script_code(script) {
            return LangDetection::Detected(code.to_string());
        }
        if script != Script::Latin {
            return LangDetection::Unknown;
        }

        let words: Vec<String> = text
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        if words.len() < MIN_WORDS {
            return LangDetection::Unknown;
        }

        let total = words.len() as f64;
        let best = self
            .profiles
            .iter()
            .map(|(code, stop)| {
                let hits = words.iter().filter(|w| stop.contains(w.as_str())).count();
                (*code, hits as f64 / total)
            })
            .fold(None, |best: Option<(&str, f64)>, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            });

        match best {
            Some((code, share)) if share >= MIN_STOPWORD_SHARE => {
                LangDetection::Detected(code.to_string())
            }
            _ => LangDetection::Unknown,
        }
    }
}
