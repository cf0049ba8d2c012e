mod splitter;

pub use splitter::{shard_packed_dataset, ShardSummary, Split, SplitCount, SplitCounts, SplitTargets};
