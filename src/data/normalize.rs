// src/data/normalize.rs

use once_cell::sync::Lazy;
use regex::Regex;

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Final rewrite applied to every kept document.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, text: &str) -> String {
        // 1. Line endings to \n
        let text = text.replace("\r\n", "\n").replace('\r', "\n");

        // 2. Zero-width chars and BOM dropped, NBSP to space, other controls to space
        let result: String = text
            .chars()
            .filter(|c| !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
            .map(|c| match c {
                '\u{00A0}' => ' ',
                '\n' | '\t' => c,
                c if c.is_control() => ' ',
                c => c,
            })
            .collect();

        // 3. Runs of spaces/tabs collapse, newlines survive
        let result = MULTI_SPACE.replace_all(&result, " ");

        // 4. Paragraph breaks capped at one blank line
        let result = MULTI_NEWLINE.replace_all(&result, "\n\n");

        result.trim().to_string()
    }
}

/// Convenience wrapper around [`TextNormalizer::normalize`].
pub fn normalize_text(text: &str) -> String {
    TextNormalizer.normalize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invisible_chars_removed() {
        assert_eq!(normalize_text("\u{FEFF}ab\u{200B}c\u{200D}d"), "abcd");
    }

    #[test]
    fn test_nbsp_and_controls_become_spaces() {
        assert_eq!(normalize_text("a\u{00A0}\u{00A0}b\u{0007}c\u{0085}d"), "a b c d");
    }

    #[test]
    fn test_whitespace_collapse_keeps_newlines() {
        let text = "  hello    world\t\ttabs\n\n\n\n\nnext\npara \t ";
        assert_eq!(normalize_text(text), "hello world tabs\n\nnext\npara");
    }

    #[test]
    fn test_crlf() {
        assert_eq!(normalize_text("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_text(" x \u{00A0}\n\n\n\ty\u{200C} ");
        assert_eq!(normalize_text(&once), once);
    }
}
