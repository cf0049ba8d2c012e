//! corpus-pipe: raw JSONL text corpora to fixed-size token blocks for LM pretraining

pub mod config;
pub mod data;
pub mod detect;
pub mod error;
pub mod logger;
pub mod pack;
pub mod pipeline;
pub mod report;
pub mod shard;
pub mod tokenizer;
pub mod utils;

// Main re-exports
pub use config::{EncoderKind, FilterConfig, PipelineConfig, SplitRatios};
pub use data::{dedup_exact, clean_dataset, CleaningCounters, FilterChain, Outcome, TokenRecord};
pub use error::{PipeError, Result};
pub use pack::{diagnose_packed_lengths, pack_to_fixed_blocks, FixedBlockPacker};
pub use pipeline::{run_pipeline, run_pipeline_with, RunSummary};
pub use shard::{shard_packed_dataset, ShardSummary};
pub use tokenizer::{BpeEncoder, Encoder, TokenizerAdapter, WordEncoder};
