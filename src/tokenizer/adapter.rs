// src/tokenizer/adapter.rs
//! Sentinel-wrapping tokenizer front end.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use super::Encoder;
use crate::data::{JsonlLines, JsonlWriter, Line, TextField, TokenRecord};
use crate::error::{PipeError, Result};

pub const BOS_TOKEN: &str = "<|bos|>";
pub const EOS_TOKEN: &str = "<|eos|>";
pub const PAD_TOKEN: &str = "<|pad|>";
pub const UNK_TOKEN: &str = "<|unk|>";

/// Sentinel ids, all at or above the encoder's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpecialTokens {
    pub bos: u32,
    pub eos: u32,
    pub pad: u32,
    pub unk: u32,
}

impl SpecialTokens {
    /// Allocates the four ids directly after the encoder's range.
    pub fn above_vocab(vocab_size: usize) -> Self {
        let start = vocab_size as u32;
        Self {
            bos: start,
            eos: start + 1,
            pad: start + 2,
            unk: start + 3,
        }
    }

    pub fn as_map(&self) -> BTreeMap<String, u32> {
        [
            (BOS_TOKEN, self.bos),
            (EOS_TOKEN, self.eos),
            (PAD_TOKEN, self.pad),
            (UNK_TOKEN, self.unk),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    pub fn is_special(&self, id: u32) -> bool {
        id == self.bos || id == self.eos || id == self.pad || id == self.unk
    }
}

pub struct TokenizerAdapter {
    encoder: Box<dyn Encoder>,
    special: SpecialTokens,
}

impl TokenizerAdapter {
    pub fn new(encoder: Box<dyn Encoder>) -> Self {
        let special = SpecialTokens::above_vocab(encoder.vocab_size());
        Self { encoder, special }
    }

    pub fn special(&self) -> SpecialTokens {
        self.special
    }

    pub fn encoder(&self) -> &dyn Encoder {
        self.encoder.as_ref()
    }

    /// Encoder vocabulary plus the sentinels.
    pub fn vocab_size(&self) -> usize {
        self.encoder.vocab_size() + 4
    }

    pub fn name(&self) -> String {
        format!("{}_extended", self.encoder.name())
    }

    /// `[bos] + encode(text) + [eos]`, cut to `max_len` with the last id forced to `eos`.
    ///
    /// Blank text, or text the encoder maps to no ids, produces no sequence at all.
    pub fn tokenize(&self, text: &str, max_len: usize) -> Result<Option<TokenRecord>> {
        Ok(self.tokenize_traced(text, max_len)?.map(|(seq, _)| seq))
    }

    /// Like [`tokenize`](Self::tokenize), also reporting whether the sequence was cut.
    pub fn tokenize_traced(&self, text: &str, max_len: usize) -> Result<Option<(TokenRecord, bool)>> {
        if max_len < 2 {
            return Err(PipeError::Config(format!(
                "max_len must be at least 2, got {}",
                max_len
            )));
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let body = self.encoder.encode(text);
        if body.is_empty() {
            return Ok(None);
        }
        let mut ids = Vec::with_capacity(body.len() + 2);
        ids.push(self.special.bos);
        ids.extend(body);
        ids.push(self.special.eos);

        let truncated = ids.len() > max_len;
        if truncated {
            ids.truncate(max_len);
            if let Some(last) = ids.last_mut() {
                *last = self.special.eos;
            }
        }

        Ok(Some((TokenRecord::new(ids), truncated)))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenizeStats {
    pub read_docs: usize,
    pub written_docs: usize,
    pub skipped: usize,
    pub truncated: usize,
    pub total_tokens: usize,
}

/// Tokenizes a cleaned `{"text": ...}` file into `{"input_ids", "length"}` records.
pub fn tokenize_to_jsonl(
    input: &Path,
    output: &Path,
    adapter: &TokenizerAdapter,
    max_len: usize,
) -> Result<TokenizeStats> {
    let mut writer = JsonlWriter::create(output)?;
    let mut stats = TokenizeStats::default();

    for line in JsonlLines::open(input)? {
        let content = match line? {
            Line::Text { content, .. } => content,
            Line::Undecodable { number } => {
                debug!(line = number, "undecodable line");
                stats.skipped += 1;
                continue;
            }
        };
        let row: Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(_) => {
                stats.skipped += 1;
                continue;
            }
        };
        let text = match TextField::of(&row) {
            TextField::Text(s) => s,
            _ => {
                stats.skipped += 1;
                continue;
            }
        };
        stats.read_docs += 1;

        let Some((seq, truncated)) = adapter.tokenize_traced(text, max_len)? else {
            stats.skipped += 1;
            continue;
        };
        if truncated {
            stats.truncated += 1;
        }
        stats.total_tokens += seq.length;
        writer.write_record(&seq)?;
        stats.written_docs += 1;
    }

    writer.finish()?;
    info!(
        read = stats.read_docs,
        written = stats.written_docs,
        truncated = stats.truncated,
        tokens = stats.total_tokens,
        "tokenization done"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WordEncoder;

    fn adapter() -> TokenizerAdapter {
        TokenizerAdapter::new(Box::new(WordEncoder::with_capacity(100)))
    }

    #[test]
    fn test_special_ids_outside_vocab_and_distinct() {
        let a = adapter();
        let s = a.special();
        assert_eq!((s.bos, s.eos, s.pad, s.unk), (100, 101, 102, 103));
        assert_eq!(a.vocab_size(), 104);
        assert_eq!(s.as_map()["<|pad|>"], 102);
    }

    #[test]
    fn test_wraps_with_sentinels() {
        let a = adapter();
        let seq = a.tokenize("one two three", 16).unwrap().unwrap();
        assert_eq!(seq.input_ids, vec![100, 0, 1, 2, 101]);
        assert_eq!(seq.length, 5);
    }

    #[test]
    fn test_truncation_keeps_eos_last() {
        let a = adapter();
        let seq = a.tokenize("w1 w2 w3 w4 w5 w6", 4).unwrap().unwrap();
        assert_eq!(seq.input_ids, vec![100, 0, 1, 101]);
        assert_eq!(seq.length, 4);
    }

    #[test]
    fn test_exact_fit_not_truncated() {
        let a = adapter();
        let seq = a.tokenize("a b", 4).unwrap().unwrap();
        assert_eq!(seq.input_ids, vec![100, 0, 1, 101]);
    }

    #[test]
    fn test_blank_text_yields_nothing() {
        assert_eq!(adapter().tokenize(" \n\t", 8).unwrap(), None);
    }

    struct SilentEncoder;
    impl Encoder for SilentEncoder {
        fn encode(&self, _text: &str) -> Vec<u32> {
            Vec::new()
        }
        fn vocab_size(&self) -> usize {
            10
        }
        fn name(&self) -> &str {
            "silent"
        }
    }

    #[test]
    fn test_text_encoding_to_nothing_yields_nothing() {
        let a = TokenizerAdapter::new(Box::new(SilentEncoder));
        assert_eq!(a.tokenize("visible words", 8).unwrap(), None);
    }

    #[test]
    fn test_max_len_below_two_rejected() {
        assert!(adapter().tokenize("a", 1).is_err());
    }
}
