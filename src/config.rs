// src/config.rs
//! Run configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::detect::CODE_HEAVY_THRESHOLD;
use crate::error::{PipeError, Result};

/// Allowed deviation of the split ratio sum from 1.0.
pub const RATIO_TOLERANCE: f64 = 1e-6;

/// Thresholds used by the filter chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Documents with a code fraction strictly above this are dropped.
    pub code_threshold: f64,
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            code_threshold: CODE_HEAVY_THRESHOLD,
            min_chars: 200,
            max_chars: 50_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl SplitRatios {
    /// Rejects negative ratios and sums that are not 1 within [`RATIO_TOLERANCE`].
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self> {
        let ratios = Self { train, val, test };
        ratios.validate()?;
        Ok(ratios)
    }

    pub fn validate(&self) -> Result<()> {
        if [self.train, self.val, self.test]
            .iter()
            .any(|r| !r.is_finite() || *r < 0.0)
        {
            return Err(PipeError::Config(format!(
                "split ratios must be non-negative, got {}/{}/{}",
                self.train, self.val, self.test
            )));
        }
        let sum = self.train + self.val + self.test;
        if (sum - 1.0).abs() > RATIO_TOLERANCE {
            return Err(PipeError::Config(format!(
                "split ratios must sum to 1, got {} ({}/{}/{})",
                sum, self.train, self.val, self.test
            )));
        }
        Ok(())
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.98,
            val: 0.01,
            test: 0.01,
        }
    }
}

/// Which encoder the tokenizer adapter wraps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    /// Byte-level BPE, from `tokenizer_path` or the plain byte vocabulary.
    #[default]
    Bpe,
    /// One id per distinct whitespace-separated word.
    Words,
}

/// Everything one end-to-end run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub raw_path: PathBuf,
    pub dedup_path: PathBuf,
    pub clean_path: PathBuf,
    pub tokenized_path: PathBuf,
    pub packed_path: PathBuf,
    pub shard_dir: PathBuf,
    pub meta_dir: PathBuf,
    pub reports_dir: PathBuf,

    pub encoder: EncoderKind,
    /// Byte-level BPE vocabulary; a plain byte vocabulary is used when absent.
    pub tokenizer_path: Option<PathBuf>,

    pub block_size: usize,
    pub max_seq_len: usize,
    pub ratios: SplitRatios,
    pub shard_size: usize,
    pub filter: FilterConfig,

    /// Drop near-duplicates after the exact pass.
    pub near_dedup: bool,
    pub hamming_threshold: u32,

    pub inspect_sample: usize,
    pub quality_sample: usize,
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from("data/raw/raw.jsonl"),
            dedup_path: PathBuf::from("data/dedup/dedup.jsonl"),
            clean_path: PathBuf::from("data/clean/clean.jsonl"),
            tokenized_path: PathBuf::from("data/final/tokenized.jsonl"),
            packed_path: PathBuf::from("data/final/packed_blocks.jsonl"),
            shard_dir: PathBuf::from("data/final/sharded_dataset"),
            meta_dir: PathBuf::from("data/final"),
            reports_dir: PathBuf::from("reports"),
            encoder: EncoderKind::default(),
            tokenizer_path: None,
            block_size: 2048,
            max_seq_len: 2048,
            ratios: SplitRatios::default(),
            shard_size: 50_000,
            filter: FilterConfig::default(),
            near_dedup: false,
            hamming_threshold: crate::data::DEFAULT_HAMMING_THRESHOLD,
            inspect_sample: 25_000,
            quality_sample: 1_500,
            seed: 42,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PipeError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| PipeError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn with_raw_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw_path = path.into();
        self
    }

    /// Points every intermediate and final output below `root`.
    pub fn with_work_dir(mut self, root: &Path) -> Self {
        self.dedup_path = root.join("dedup").join("dedup.jsonl");
        self.clean_path = root.join("clean").join("clean.jsonl");
        self.tokenized_path = root.join("final").join("tokenized.jsonl");
        self.packed_path = root.join("final").join("packed_blocks.jsonl");
        self.shard_dir = root.join("final").join("sharded_dataset");
        self.meta_dir = root.join("final");
        self.reports_dir = root.join("reports");
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderKind) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_tokenizer_path(mut self, path: Option<PathBuf>) -> Self {
        self.tokenizer_path = path;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = max_seq_len;
        self
    }

    pub fn with_ratios(mut self, ratios: SplitRatios) -> Self {
        self.ratios = ratios;
        self
    }

    pub fn with_shard_size(mut self, shard_size: usize) -> Self {
        self.shard_size = shard_size;
        self
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_near_dedup(mut self, enabled: bool) -> Self {
        self.near_dedup = enabled;
        self
    }

    pub fn with_samples(mut self, inspect: usize, quality: usize) -> Self {
        self.inspect_sample = inspect;
        self.quality_sample = quality;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Configuration errors abort the run before any output is written.
    pub fn validate(&self) -> Result<()> {
        self.ratios.validate()?;
        validate_lengths(self.block_size, self.max_seq_len)?;
        if self.shard_size == 0 {
            return Err(PipeError::Config("shard_size must be at least 1".into()));
        }
        if self.filter.min_chars > self.filter.max_chars {
            return Err(PipeError::Config(format!(
                "min_chars ({}) exceeds max_chars ({})",
                self.filter.min_chars, self.filter.max_chars
            )));
        }
        if !(0.0..=1.0).contains(&self.filter.code_threshold) {
            return Err(PipeError::Config(format!(
                "code_threshold must lie in [0, 1], got {}",
                self.filter.code_threshold
            )));
        }
        Ok(())
    }
}

/// A sequence must hold both sentinels and fit in one block.
pub fn validate_lengths(block_size: usize, max_seq_len: usize) -> Result<()> {
    if block_size == 0 {
        return Err(PipeError::Config("block_size must be at least 1".into()));
    }
    if max_seq_len < 2 {
        return Err(PipeError::Config(format!(
            "max_seq_len must be at least 2 to hold BOS and EOS, got {}",
            max_seq_len
        )));
    }
    if max_seq_len > block_size {
        return Err(PipeError::Config(format!(
            "max_seq_len ({}) exceeds block_size ({}); packed blocks would overflow",
            max_seq_len, block_size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_tolerance() {
        assert!(SplitRatios::new(0.98, 0.01, 0.01).is_ok());
        assert!(SplitRatios::new(0.8, 0.1, 0.1 + 5e-7).is_ok());
        assert!(SplitRatios::new(0.8, 0.1, 0.1 + 2e-6).is_err());
        assert!(SplitRatios::new(0.5, 0.5, 0.5).is_err());
        assert!(SplitRatios::new(1.2, -0.1, -0.1).is_err());
    }

    #[test]
    fn test_max_len_must_fit_block() {
        let cfg = PipelineConfig::new().with_block_size(1024).with_max_seq_len(2048);
        assert!(matches!(cfg.validate(), Err(PipeError::Config(_))));
        assert!(PipelineConfig::new().with_max_seq_len(1).validate().is_err());
        assert!(PipelineConfig::new().validate().is_ok());
    }

    #[test]
    fn test_zero_shard_size_rejected() {
        assert!(PipelineConfig::new().with_shard_size(0).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{"block_size": 512, "max_seq_len": 256, "filter": {"min_chars": 10}}"#)
                .unwrap();
        assert_eq!(cfg.block_size, 512);
        assert_eq!(cfg.filter.min_chars, 10);
        assert_eq!(cfg.filter.max_chars, 50_000);
        assert_eq!(cfg.ratios, SplitRatios::default());
        assert_eq!(cfg.encoder, EncoderKind::Bpe);

        let cfg: PipelineConfig = serde_json::from_str(r#"{"encoder": "words"}"#).unwrap();
        assert_eq!(cfg.encoder, EncoderKind::Words);
    }
}
