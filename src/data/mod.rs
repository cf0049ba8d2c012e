// src/data/mod.rs

mod cleaner;
mod dedup;
mod near_dedup;
mod normalize;
mod record;

pub use cleaner::{clean_dataset, CleaningCounters, FilterChain, Outcome, Verdict};
pub use dedup::{dedup_exact, ContentHash, DedupStats, ExactDeduplicator};
pub use near_dedup::{dedup_near, hamming, simhash, NearDeduplicator, DEFAULT_HAMMING_THRESHOLD};
pub use normalize::{normalize_text, TextNormalizer};
pub use record::{
    count_lines, read_token_records, write_json_pretty, CleanDoc, JsonlLines, JsonlWriter, Line,
    TextField, TokenRecord,
};

pub(crate) use record::parse_token_line;
