// src/pipeline.rs
//! End-to-end run: every stage in order, each reading the previous stage's
//! file from disk.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::config::{EncoderKind, PipelineConfig};
use crate::data::{
    clean_dataset, dedup_exact, dedup_near, write_json_pretty, CleaningCounters, DedupStats, FilterChain,
};
use crate::detect::Detectors;
use crate::error::{PipeError, Result};
use crate::pack::{diagnose_packed_lengths, pack_to_fixed_blocks, PackDiagnostics};
use crate::report::{
    audit_quality, quick_stats, summarize_exclusive, token_length_stats, write_meta, DatasetMeta,
};
use crate::shard::{shard_packed_dataset, ShardSummary};
use crate::tokenizer::{tokenize_to_jsonl, BpeEncoder, Encoder, TokenizeStats, TokenizerAdapter, WordEncoder};
use crate::utils::format_duration;

pub const RAW_STATS_REPORT: &str = "raw_doc_stats.json";
pub const RAW_CATEGORY_REPORT: &str = "raw_category_pct.json";
pub const CLEANING_REPORT: &str = "cleaning_summary.json";
pub const CLEAN_CATEGORY_REPORT: &str = "clean_category_pct.json";
pub const QUALITY_REPORT: &str = "quality_report.json";
pub const TOKEN_STATS_REPORT: &str = "token_length_stats.json";

/// Builds the adapter the config asks for.
pub fn build_adapter(config: &PipelineConfig) -> Result<TokenizerAdapter> {
    let encoder: Box<dyn Encoder> = match (config.encoder, &config.tokenizer_path) {
        (EncoderKind::Words, _) => Box::new(WordEncoder::new()),
        (EncoderKind::Bpe, Some(path)) => Box::new(BpeEncoder::from_file(path)?),
        (EncoderKind::Bpe, None) => Box::new(BpeEncoder::byte_level()),
    };
    let adapter = TokenizerAdapter::new(encoder);
    info!(
        tokenizer = %adapter.name(),
        vocab_size = adapter.vocab_size(),
        "tokenizer ready"
    );
    Ok(adapter)
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub dedup: DedupStats,
    pub near_dedup: Option<DedupStats>,
    pub cleaning: CleaningCounters,
    pub tokenize: TokenizeStats,
    pub total_blocks: usize,
    pub diagnostics: PackDiagnostics,
    pub shards: ShardSummary,
    pub meta_path: PathBuf,
    pub elapsed_secs: u64,
}

fn near_dedup_path(dedup_path: &Path) -> PathBuf {
    dedup_path.with_file_name("dedup_near.jsonl")
}

/// Runs every stage with the heuristic detectors.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunSummary> {
    run_pipeline_with(config, Detectors::heuristic())
}

/// Runs every stage. Configuration problems are reported before any file is written.
pub fn run_pipeline_with(config: &PipelineConfig, detectors: Detectors) -> Result<RunSummary> {
    let start = Instant::now();

    config.validate()?;
    if !config.raw_path.is_file() {
        return Err(PipeError::FileNotFound(config.raw_path.clone()));
    }
    let adapter = build_adapter(config)?;
    let chain = FilterChain::new(detectors, config.filter.clone());
    let reports = &config.reports_dir;

    info!("=*= starting pipeline =*=");

    info!(path = %config.raw_path.display(), "inspecting raw file");
    let raw_stats = quick_stats(&config.raw_path, config.inspect_sample)?;
    write_json_pretty(&reports.join(RAW_STATS_REPORT), &raw_stats)?;
    let raw_categories =
        summarize_exclusive(&config.raw_path, config.inspect_sample, chain.detectors(), chain.config())?;
    write_json_pretty(&reports.join(RAW_CATEGORY_REPORT), &raw_categories)?;

    info!("deduplicating");
    let dedup = dedup_exact(&config.raw_path, &config.dedup_path)?;
    let (near_dedup, clean_input) = if config.near_dedup {
        let near_path = near_dedup_path(&config.dedup_path);
        let stats = dedup_near(&config.dedup_path, &near_path, config.hamming_threshold)?;
        (Some(stats), near_path)
    } else {
        (None, config.dedup_path.clone())
    };

    info!("cleaning");
    let cleaning = clean_dataset(&clean_input, &config.clean_path, &chain)?;
    write_json_pretty(&reports.join(CLEANING_REPORT), &cleaning)?;

    let clean_categories =
        summarize_exclusive(&config.clean_path, config.inspect_sample, chain.detectors(), chain.config())?;
    write_json_pretty(&reports.join(CLEAN_CATEGORY_REPORT), &clean_categories)?;

    info!("quality audit");
    let quality = audit_quality(
        &config.clean_path,
        config.quality_sample,
        config.seed,
        chain.detectors().lang.as_ref(),
    )?;
    write_json_pretty(&reports.join(QUALITY_REPORT), &quality)?;

    let token_stats = token_length_stats(&config.clean_path, adapter.encoder(), None)?;
    write_json_pretty(&reports.join(TOKEN_STATS_REPORT), &token_stats)?;

    info!("tokenizing");
    let tokenize = tokenize_to_jsonl(&config.clean_path, &config.tokenized_path, &adapter, config.max_seq_len)?;

    info!(block_size = config.block_size, "packing");
    let total_blocks = pack_to_fixed_blocks(
        &config.tokenized_path,
        &config.packed_path,
        config.block_size,
        adapter.special().pad,
    )?;
    let diagnostics = diagnose_packed_lengths(&config.tokenized_path, &config.packed_path, config.block_size)?;

    info!("sharding");
    let shards = shard_packed_dataset(
        &config.packed_path,
        &config.shard_dir,
        &config.ratios,
        config.shard_size,
        config.block_size,
    )?;

    let meta = DatasetMeta::new(config, &adapter, total_blocks, cleaning.clone(), &shards);
    let meta_path = write_meta(&config.meta_dir, &meta)?;

    let elapsed_secs = start.elapsed().as_secs();
    info!(elapsed = %format_duration(elapsed_secs), "=*= pipeline completed =*=");

    Ok(RunSummary {
        dedup,
        near_dedup,
        cleaning,
        tokenize,
        total_blocks,
        diagnostics,
        shards,
        meta_path,
        elapsed_secs,
    })
}
