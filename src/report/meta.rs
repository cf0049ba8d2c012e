// src/report/meta.rs
//! Dataset metadata written next to the final shards.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::PipelineConfig;
use crate::data::{write_json_pretty, CleaningCounters};
use crate::error::Result;
use crate::shard::ShardSummary;
use crate::tokenizer::TokenizerAdapter;

pub const PIPELINE_VERSION: &str = "1.0";
pub const META_FILE: &str = "meta.json";

#[derive(Debug, Clone, Serialize)]
pub struct TokenizerMeta {
    pub name: String,
    pub vocab_size: usize,
    pub special_tokens: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataMeta {
    pub total_blocks: usize,
    pub block_size: usize,
    pub cleaning_summary: CleaningCounters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShardMeta {
    pub train_ratio: f64,
    pub val_ratio: f64,
    pub test_ratio: f64,
    pub shard_size: usize,
    pub shard_output_dir: PathBuf,
    pub train_blocks: usize,
    pub val_blocks: usize,
    pub test_blocks: usize,
    pub train_shards: usize,
    pub val_shards: usize,
    pub test_shards: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetMeta {
    pub pipeline_version: String,
    pub timestamp: String,
    pub run_parameters: PipelineConfig,
    pub tokenizer: TokenizerMeta,
    pub data: DataMeta,
    pub shards: ShardMeta,
}

impl DatasetMeta {
    pub fn new(
        config: &PipelineConfig,
        adapter: &TokenizerAdapter,
        total_blocks: usize,
        cleaning_summary: CleaningCounters,
        shards: &ShardSummary,
    ) -> Self {
        let c = &shards.counts;
        Self {
            pipeline_version: PIPELINE_VERSION.to_string(),
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            run_parameters: config.clone(),
            tokenizer: TokenizerMeta {
                name: adapter.name(),
                vocab_size: adapter.vocab_size(),
                special_tokens: adapter.special().as_map(),
            },
            data: DataMeta {
                total_blocks,
                block_size: config.block_size,
                cleaning_summary,
            },
            shards: ShardMeta {
                train_ratio: config.ratios.train,
                val_ratio: config.ratios.val,
                test_ratio: config.ratios.test,
                shard_size: shards.shard_size,
                shard_output_dir: shards.out_dir.clone(),
                train_blocks: c.train.blocks,
                val_blocks: c.val.blocks,
                test_blocks: c.test.blocks,
                train_shards: c.train.shards,
                val_shards: c.val.shards,
                test_shards: c.test.shards,
            },
        }
    }
}

/// Writes `meta.json` into `dir` and returns its path.
pub fn write_meta(dir: &Path, meta: &DatasetMeta) -> Result<PathBuf> {
    let path = dir.join(META_FILE);
    write_json_pretty(&path, meta)?;
    info!(path = %path.display(), "metadata saved");
    Ok(path)
}
