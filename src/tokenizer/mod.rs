mod adapter;
mod bpe;
mod word;

pub use adapter::{tokenize_to_jsonl, SpecialTokens, TokenizeStats, TokenizerAdapter};
pub use bpe::{BpeEncoder, BpeVocab};
pub use word::WordEncoder;

/// Subword encoder seen by the adapter.
pub trait Encoder {
    /// Maps text to ids in `0..vocab_size()`.
    fn encode(&self, text: &str) -> Vec<u32>;
    fn vocab_size(&self) -> usize;
    fn name(&self) -> &str;
}

impl<E: Encoder + ?Sized> Encoder for Box<E> {
    fn encode(&self, text: &str) -> Vec<u32> {
        (**self).encode(text)
    }

    fn vocab_size(&self) -> usize {
        (**self).vocab_size()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
