// src/detect/code.rs

use once_cell::sync::Lazy;
use regex::Regex;

use super::CodeScorer;

static PATTERNS: Lazy<CodePatterns> = Lazy::new(CodePatterns::new);

struct CodePatterns {
    fenced: Regex,
    call_like: Regex,
    symbol_only: Regex,
    trailing_semicolon: Regex,
    brace: Regex,
    assignment: Regex,
    keyword: Regex,
    code_punct: Regex,
    python_def: Regex,
    python_import: Regex,
}

impl CodePatterns {
    fn new() -> Self {
        Self {
            // Markdown fences and <code>/<pre> wrappers
            fenced: Regex::new(r"```|</?code>|</?pre>").unwrap(),
            call_like: Regex::new(r"[A-Za-z]\w*\s*\(").unwrap(),
            symbol_only: Regex::new(r"^[^A-Za-z0-9]{4,}$").unwrap(),
            trailing_semicolon: Regex::new(r";\s*$").unwrap(),
            brace: Regex::new(r"[{}]").unwrap(),
            assignment: Regex::new(r"(^|\s)\w+\s*=\s*[^=\s]").unwrap(),
            keyword: Regex::new(
                r"(#include\b|\b(?:function|var|let|const|class|return|import|export|enum|extends|implements|namespace|public|private|protected|static|void|try|catch|finally|throw|new|template|typename|struct|typedef|using|switch|case|break|continue|async|await|yield|lambda|fn|match|crate|pub|impl|trait)\b)",
            )
            .unwrap(),
            code_punct: Regex::new(r"[()\[\]<>=:;]").unwrap(),
            python_def: Regex::new(r"^\s*def\s+\w+\s*\(").unwrap(),
            python_import: Regex::new(r"^\s*(from\s+\w+(\.\w+)*\s+import\b|import\s+\w+)").unwrap(),
        }
    }
}

/// True when a single line looks like source code.
pub fn is_code_line(raw: &str) -> bool {
    let line = raw.trim();
    if line.is_empty() {
        return false;
    }
    let p = &*PATTERNS;

    if p.fenced.is_match(line) {
        return true;
    }
    // indentation is checked on the untrimmed line
    if (raw.starts_with("    ") || raw.starts_with('\t')) && p.call_like.is_match(line) {
        return true;
    }
    if p.symbol_only.is_match(line)
        || p.trailing_semicolon.is_match(line)
        || p.brace.is_match(line)
        || p.assignment.is_match(line)
    {
        return true;
    }
    // keywords are common English words too ("new", "case", "match"), so they
    // only count next to code punctuation
    if p.keyword.is_match(line) && p.code_punct.is_match(line) {
        return true;
    }
    p.python_def.is_match(line) || p.python_import.is_match(line)
}

/// Share of non-blank lines flagged by [`is_code_line`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LineCodeScorer;

impl CodeScorer for LineCodeScorer {
    fn code_fraction(&self, text: &str) -> f64 {
        let mut total = 0usize;
        let mut code = 0usize;
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            total += 1;
            if is_code_line(line) {
                code += 1;
            }
        }
        if total == 0 {
            return 0.0;
        }
        code as f64 / total as f64
    }
}
