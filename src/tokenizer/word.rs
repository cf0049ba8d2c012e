use parking_lot::RwLock;
use std::collections::HashMap;

use super::Encoder;

pub const DEFAULT_WORD_CAPACITY: usize = 50_000;

/// Gives each whitespace-separated word an id, in order of first appearance.
///
/// Ids stay below `capacity`; once it is reached, unseen words share the last id.
pub struct WordEncoder {
    ids: RwLock<HashMap<String, u32>>,
    capacity: usize,
}

impl WordEncoder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WORD_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Distinct words seen so far.
    pub fn words_seen(&self) -> usize {
        self.ids.read().len()
    }

    fn id_for(&self, word: &str) -> u32 {
        if let Some(&id) = self.ids.read().get(word) {
            return id;
        }
        let mut ids = self.ids.write();
        if let Some(&id) = ids.get(word) {
            return id;
        }
        let next = ids.len();
        if next + 1 >= self.capacity {
            return (self.capacity - 1) as u32;
        }
        *ids.entry(word.to_string()).or_insert(next as u32)
    }
}

impl Default for WordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for WordEncoder {
    fn encode(&self, text: &str) -> Vec<u32> {
        text.split_whitespace().map(|w| self.id_for(w)).collect()
    }

    fn vocab_size(&self) -> usize {
        self.capacity
    }

    fn name(&self) -> &str {
        "whitespace_words"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incrementing_ids() {
        let enc = WordEncoder::new();
        assert_eq!(enc.encode("a b a c"), vec![0, 1, 0, 2]);
        assert_eq!(enc.encode("c d"), vec![2, 3]);
        assert_eq!(enc.words_seen(), 4);
    }

    #[test]
    fn test_overflow_shares_last_id() {
        let enc = WordEncoder::with_capacity(3);
        assert_eq!(enc.encode("a b c d"), vec![0, 1, 2, 2]);
        assert!(enc.encode("e f").iter().all(|&id| (id as usize) < enc.vocab_size()));
    }
}
