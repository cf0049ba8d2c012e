// src/detect/html.rs

use once_cell::sync::Lazy;
use regex::Regex;

use super::HtmlDetector;

static PATTERNS: Lazy<HtmlPatterns> = Lazy::new(HtmlPatterns::new);

struct HtmlPatterns {
    tag: Regex,
    entity: Regex,
    script_style_open: Regex,
    script_style_block: Regex,
    comment: Regex,
    whitespace: Regex,
}

impl HtmlPatterns {
    fn new() -> Self {
        Self {
            tag: Regex::new(r"</?[A-Za-z][A-Za-z0-9]*(\s+[^>]*)?>").unwrap(),
            entity: Regex::new(r"&[A-Za-z]+;|&#\d+;").unwrap(),
            script_style_open: Regex::new(r"(?i)<(script|style)[\s>]").unwrap(),
            script_style_block: Regex::new(
                r"(?is)<script.*?>.*?</script>|<style.*?>.*?</style>",
            )
            .unwrap(),
            comment: Regex::new(r"(?s)<!--.*?-->").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }
}

/// Decodes named and numeric character references. Text holding a reference
/// that cannot be decoded is returned as written.
pub fn decode_entities(text: &str) -> String {
    match quick_xml::escape::unescape(text) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Regex-based markup detector.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexHtmlDetector;

impl HtmlDetector for RegexHtmlDetector {
    fn has_html(&self, text: &str) -> bool {
        PATTERNS.tag.is_match(text)
            || PATTERNS.entity.is_match(text)
            || PATTERNS.script_style_open.is_match(text)
    }

    fn strip_html(&self, text: &str) -> String {
        let result = PATTERNS.script_style_block.replace_all(text, " ");
        let result = PATTERNS.comment.replace_all(&result, " ");
        let result = PATTERNS.tag.replace_all(&result, " ");
        let result = decode_entities(&result);
        let result = PATTERNS.whitespace.replace_all(&result, " ");
        result.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_tags_entities_scripts() {
        let d = RegexHtmlDetector;
        assert!(d.has_html("<p>hi</p>"));
        assert!(d.has_html("fish &amp; chips"));
        assert!(d.has_html("x &#169; y"));
        assert!(d.has_html("<STYLE>body{}</STYLE>"));
        assert!(!d.has_html("a < b and c > d"));
        assert!(!d.has_html("plain prose"));
    }

    #[test]
    fn test_strip_removes_scripts_comments_and_decodes() {
        let d = RegexHtmlDetector;
        let input = "<html><script type=\"x\">var a = 1;</script><!-- note -->\
                     <p>Fish &amp; chips&nbsp;&#8212; &#x41;</p>\n\n<style>p{}</style></html>";
        let out = d.strip_html(input);
        // the decoded NBSP is whitespace too and collapses
        assert_eq!(out, "Fish & chips \u{2014} A");
    }

    #[test]
    fn test_html5_named_entities_decoded() {
        let d = RegexHtmlDetector;
        let out = d.strip_html("<p>caf&eacute; &Eacute;cole &frac12; &rarr; &hearts;</p>");
        assert_eq!(out, "caf\u{00E9} \u{00C9}cole \u{00BD} \u{2192} \u{2665}");
    }

    #[test]
    fn test_undecodable_text_kept_as_written() {
        assert_eq!(decode_entities("a &bogus; b &lt;"), "a &bogus; b &lt;");
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
    }
}
