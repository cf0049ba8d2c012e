//! JSON reports: inspection, quality audit, token lengths and dataset metadata.

mod inspect;
mod meta;
mod quality;
mod stats;
mod token_stats;

pub use inspect::{classify, quick_stats, summarize_exclusive, Category, CategorySummary, LengthStats, QuickStats};
pub use meta::{write_meta, DatasetMeta, DataMeta, ShardMeta, TokenizerMeta, META_FILE, PIPELINE_VERSION};
pub use quality::{
    audit_quality, detect_pii, quality_report, reservoir_sample, LexiconToxicity, QualityReport,
    QualityScorer, Score, ScoreSummary, UnigramPerplexity,
};
pub use stats::{mean, median, percentile};
pub use token_stats::{token_length_stats, TokenLengthStats};
