use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::Encoder;
use crate::error::{PipeError, Result};

const MAX_CACHE_SIZE: usize = 100_000;
/// Marks a word that followed whitespace.
const SPACE_MARK: char = '\u{0120}';

#[derive(Serialize, Deserialize, Clone)]
pub struct BpeVocab {
    #[serde(default = "default_name")]
    pub name: String,
    pub id_to_token: Vec<Vec<u8>>,
    #[serde(default)]
    pub merges: Vec<(u32, u32)>,
}

fn default_name() -> String {
    "byte_bpe".to_string()
}

impl BpeVocab {
    /// 256 single-byte tokens, no merges.
    pub fn byte_level() -> Self {
        Self {
            name: "byte_level".to_string(),
            id_to_token: (0u8..=255).map(|b| vec![b]).collect(),
            merges: Vec::new(),
        }
    }

    pub fn build_token_to_id(&self) -> HashMap<Vec<u8>, u32> {
        self.id_to_token
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32))
            .collect()
    }
}

struct LruCache {
    map: HashMap<String, Vec<u32>>,
    order: VecDeque<String>,
    max_size: usize,
}

impl LruCache {
    fn new(max_size: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            max_size,
        }
    }

    fn get(&self, key: &str) -> Option<Vec<u32>> {
        self.map.get(key).cloned()
    }

    fn insert(&mut self, key: String, value: Vec<u32>) {
        if self.map.len() >= self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        if self.map.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
    }
}

/// Byte-level BPE encoder.
pub struct BpeEncoder {
    name: String,
    id_to_token: Vec<Vec<u8>>,
    token_to_id: HashMap<Vec<u8>, u32>,
    /// merge pair -> (rank, merged id)
    merge_ranks: HashMap<(u32, u32), (usize, u32)>,
    byte_ids: [u32; 256],
    cache: RwLock<LruCache>,
}

impl BpeEncoder {
    pub fn from_vocab(vocab: BpeVocab) -> Result<Self> {
        let token_to_id = vocab.build_token_to_id();

        let mut byte_ids = [0u32; 256];
        for b in 0..=255u8 {
            byte_ids[b as usize] = *token_to_id.get(&vec![b]).ok_or_else(|| {
                PipeError::TokenizerLoad(format!("vocabulary has no token for byte {:#04x}", b))
            })?;
        }

        let mut merge_ranks = HashMap::with_capacity(vocab.merges.len());
        for (rank, &(a, b)) in vocab.merges.iter().enumerate() {
            let (left, right) = match (
                vocab.id_to_token.get(a as usize),
                vocab.id_to_token.get(b as usize),
            ) {
                (Some(l), Some(r)) => (l, r),
                _ => {
                    return Err(PipeError::TokenizerLoad(format!(
                        "merge #{} references unknown id ({}, {})",
                        rank, a, b
                    )))
                }
            };
            let mut merged = left.clone();
            merged.extend(right);
            let merged_id = *token_to_id.get(&merged).ok_or_else(|| {
                PipeError::TokenizerLoad(format!("merge #{} produces a token missing from the vocabulary", rank))
            })?;
            merge_ranks.entry((a, b)).or_insert((rank, merged_id));
        }

        Ok(Self {
            name: vocab.name,
            id_to_token: vocab.id_to_token,
            token_to_id,
            merge_ranks,
            byte_ids,
            cache: RwLock::new(LruCache::new(MAX_CACHE_SIZE)),
        })
    }

    pub fn byte_level() -> Self {
        // the byte vocabulary always covers every byte
        match Self::from_vocab(BpeVocab::byte_level()) {
            Ok(encoder) => encoder,
            Err(e) => unreachable!("byte-level vocabulary rejected: {}", e),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| PipeError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let vocab: BpeVocab = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| PipeError::TokenizerLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_vocab(vocab)
    }

    pub fn decode(&self, ids: &[u32]) -> String {
        let bytes: Vec<u8> = ids
            .iter()
            .filter_map(|&id| self.id_to_token.get(id as usize))
            .flatten()
            .copied()
            .collect();

        String::from_utf8_lossy(&bytes).replace(SPACE_MARK, " ")
    }

    fn pre_tokenize(text: &str) -> Vec<String> {
        let mut words = Vec::new();
        let mut current = String::new();
        let mut after_space = false;

        for c in text.chars() {
            match c {
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        words.push(std::mem::take(&mut current));
                    }
                    after_space = true;
                }
                '.' | ',' | '!' | '?' | ':' | ';' | '(' | ')' | '"' | '\'' | '-' => {
                    if !current.is_empty() {
                        words.push(std::mem::take(&mut current));
                    }
                    let mut punct = String::new();
                    if after_space {
                        punct.push(SPACE_MARK);
                    }
                    punct.push(c);
                    words.push(punct);
                    after_space = false;
                }
                _ => {
                    if current.is_empty() && after_space {
                        current.push(SPACE_MARK);
                    }
                    current.push(c);
                    after_space = false;
                }
            }
        }

        if !current.is_empty() {
            words.push(current);
        }
        words
    }

    fn encode_word(&self, word: &str) -> Vec<u32> {
        let mut tokens: Vec<u32> = word.bytes().map(|b| self.byte_ids[b as usize]).collect();

        while tokens.len() >= 2 {
            let best = tokens
                .windows(2)
                .enumerate()
                .filter_map(|(i, w)| self.merge_ranks.get(&(w[0], w[1])).map(|&(rank, id)| (rank, i, id)))
                .min();

            match best {
                Some((_, idx, merged)) => {
                    tokens[idx] = merged;
                    tokens.remove(idx + 1);
                }
                None => break,
            }
        }

        tokens
    }
}

impl Encoder for BpeEncoder {
    fn encode(&self, text: &str) -> Vec<u32> {
        let mut result = Vec::new();

        for word in Self::pre_tokenize(text) {
            if let Some(cached) = self.cache.read().get(&word) {
                result.extend(cached);
                continue;
            }

            let tokens = self.encode_word(&word);
            self.cache.write().insert(word, tokens.clone());
            result.extend(tokens);
        }

        result
    }

    fn vocab_size(&self) -> usize {
        self.id_to_token.len()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab_with_merges() -> BpeVocab {
        let mut vocab = BpeVocab::byte_level();
        vocab.name = "tiny".into();
        // 256: "th", 257: "the"
        vocab.id_to_token.push(b"th".to_vec());
        vocab.id_to_token.push(b"the".to_vec());
        vocab.merges = vec![(b't' as u32, b'h' as u32), (256, b'e' as u32)];
        vocab
    }

    #[test]
    fn test_byte_level_ids_are_bytes() {
        let enc = BpeEncoder::byte_level();
        assert_eq!(enc.vocab_size(), 256);
        assert_eq!(enc.encode("ab"), vec![97, 98]);
    }

    #[test]
    fn test_merges_applied_by_rank() {
        let enc = BpeEncoder::from_vocab(vocab_with_merges()).unwrap();
        assert_eq!(enc.encode("the"), vec![257]);
        assert_eq!(enc.encode("tho"), vec![256, b'o' as u32]);
        // cached path gives the same answer
        assert_eq!(enc.encode("the"), vec![257]);
    }

    #[test]
    fn test_space_marker_roundtrip() {
        let enc = BpeEncoder::byte_level();
        let ids = enc.encode("hello world.");
        assert_eq!(enc.decode(&ids), "hello world.");
    }

    #[test]
    fn test_missing_byte_rejected() {
        let mut vocab = BpeVocab::byte_level();
        vocab.id_to_token.remove(0);
        assert!(matches!(
            BpeEncoder::from_vocab(vocab),
            Err(PipeError::TokenizerLoad(_))
        ));
    }

    #[test]
    fn test_bad_merge_rejected() {
        let mut vocab = BpeVocab::byte_level();
        vocab.merges.push((1, 2));
        assert!(BpeEncoder::from_vocab(vocab).is_err());
    }
}
