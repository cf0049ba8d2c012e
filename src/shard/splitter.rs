// src/shard/splitter.rs
//! Train/val/test sharding of packed blocks.
//!
//! Two passes over the packed file: the first counts (and checks) blocks,
//! the second assigns them in input order by running counts and writes
//! rotating shard files under `<out>/<split>/shard_NNNNN.jsonl`.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::config::SplitRatios;
use crate::data::{parse_token_line, JsonlLines, JsonlWriter, Line};
use crate::error::{PipeError, Result};
use crate::pack::offending_length;

/// Offending lengths reported in an invariant error.
const MAX_REPORTED: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Block counts per split. `test` takes whatever the floors leave over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitTargets {
    pub train: usize,
    pub val: usize,
    pub test: usize,
}

impl SplitTargets {
    pub fn compute(total: usize, ratios: &SplitRatios) -> Self {
        let train = ((total as f64 * ratios.train).floor() as usize).min(total);
        let val = ((total as f64 * ratios.val).floor() as usize).min(total - train);
        Self {
            train,
            val,
            test: total - train - val,
        }
    }

    /// Split for the next block, given how many each split already holds.
    fn assign(&self, written: &SplitCounts) -> Split {
        if written.train.blocks < self.train {
            Split::Train
        } else if written.val.blocks < self.val {
            Split::Val
        } else {
            Split::Test
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitCount {
    pub blocks: usize,
    pub shards: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitCounts {
    pub train: SplitCount,
    pub val: SplitCount,
    pub test: SplitCount,
}

impl SplitCounts {
    pub fn get(&self, split: Split) -> SplitCount {
        match split {
            Split::Train => self.train,
            Split::Val => self.val,
            Split::Test => self.test,
        }
    }

    fn get_mut(&mut self, split: Split) -> &mut SplitCount {
        match split {
            Split::Train => &mut self.train,
            Split::Val => &mut self.val,
            Split::Test => &mut self.test,
        }
    }

    pub fn total_blocks(&self) -> usize {
        self.train.blocks + self.val.blocks + self.test.blocks
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardSummary {
    pub total_blocks: usize,
    pub targets: SplitTargets,
    pub counts: SplitCounts,
    pub shard_size: usize,
    pub out_dir: PathBuf,
}

/// Writes one split's blocks, opening a new shard only when a block needs it.
struct ShardWriter {
    dir: PathBuf,
    shard_size: usize,
    written: usize,
    shards: usize,
    current: Option<JsonlWriter>,
}

impl ShardWriter {
    fn new(dir: PathBuf, shard_size: usize) -> Self {
        Self {
            dir,
            shard_size,
            written: 0,
            shards: 0,
            current: None,
        }
    }

    fn shard_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("shard_{:05}.jsonl", index))
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        if self.current.is_none() {
            self.shards += 1;
            let path = self.shard_path(self.shards);
            debug!(path = %path.display(), "opening shard");
            self.current = Some(JsonlWriter::create(&path)?);
        }
        if let Some(writer) = self.current.as_mut() {
            writer.write_line(line)?;
        }
        self.written += 1;

        if self.written % self.shard_size == 0 {
            if let Some(full) = self.current.take() {
                full.finish()?;
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<SplitCount> {
        if let Some(open) = self.current.take() {
            open.finish()?;
        }
        Ok(SplitCount {
            blocks: self.written,
            shards: self.shards,
        })
    }
}

/// Counts blocks, refusing any whose length is not `block_size`.
///
/// Every line is parsed here so an unreadable block fails the run before the
/// first shard is written.
fn count_blocks(packed: &Path, block_size: usize) -> Result<usize> {
    let mut total = 0usize;
    let mut offending = Vec::new();
    for line in JsonlLines::open(packed)? {
        let block = parse_token_line(packed, line?)?;
        if let Some(bad) = offending_length(&block, block_size) {
            if offending.len() < MAX_REPORTED {
                offending.push(bad);
            }
        }
        total += 1;
    }

    if !offending.is_empty() {
        error!(block_size, ?offending, "refusing to shard malformed blocks");
        return Err(PipeError::InvariantViolation {
            block_size,
            offending,
        });
    }
    Ok(total)
}

/// Splits `packed` into train/val/test shards below `out_dir`.
///
/// Ratios, shard size and every block's length are checked before anything
/// is created.
pub fn shard_packed_dataset(
    packed: &Path,
    out_dir: &Path,
    ratios: &SplitRatios,
    shard_size: usize,
    block_size: usize,
) -> Result<ShardSummary> {
    ratios.validate()?;
    if shard_size == 0 {
        return Err(PipeError::Config("shard_size must be at least 1".into()));
    }

    let total = count_blocks(packed, block_size)?;
    let targets = SplitTargets::compute(total, ratios);
    info!(
        total,
        train = targets.train,
        val = targets.val,
        test = targets.test,
        "split targets"
    );

    let mut writers = Vec::with_capacity(Split::ALL.len());
    for split in Split::ALL {
        let dir = out_dir.join(split.name());
        std::fs::create_dir_all(&dir).map_err(|source| PipeError::FileWrite {
            path: dir.clone(),
            source,
        })?;
        writers.push(ShardWriter::new(dir, shard_size));
    }

    let mut counts = SplitCounts::default();
    for line in JsonlLines::open(packed)? {
        let content = match line? {
            Line::Text { content, .. } => content,
            Line::Undecodable { number } => {
                return Err(PipeError::BadRecord {
                    path: packed.to_path_buf(),
                    line: number,
                    reason: "invalid UTF-8".to_string(),
                })
            }
        };
        let split = targets.assign(&counts);
        writers[split as usize].write_line(&content)?;
        counts.get_mut(split).blocks += 1;
    }

    for (split, writer) in Split::ALL.into_iter().zip(writers) {
        *counts.get_mut(split) = writer.finish()?;
    }

    for split in Split::ALL {
        let c = counts.get(split);
        info!(split = split.name(), blocks = c.blocks, shards = c.shards, "split written");
    }

    Ok(ShardSummary {
        total_blocks: total,
        targets,
        counts,
        shard_size,
        out_dir: out_dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TokenRecord;
    use tempfile::tempdir;

    fn write_blocks(path: &Path, n: usize, block_size: usize) {
        let mut w = JsonlWriter::create(path).unwrap();
        for i in 0..n {
            w.write_record(&TokenRecord::new(vec![i as u32; block_size])).unwrap();
        }
        w.finish().unwrap();
    }

    #[test]
    fn test_targets_floor_and_remainder() {
        let t = SplitTargets::compute(100, &SplitRatios::default());
        assert_eq!((t.train, t.val, t.test), (98, 1, 1));

        let t = SplitTargets::compute(7, &SplitRatios::new(0.5, 0.25, 0.25).unwrap());
        assert_eq!((t.train, t.val, t.test), (3, 1, 3));

        let t = SplitTargets::compute(0, &SplitRatios::default());
        assert_eq!((t.train, t.val, t.test), (0, 0, 0));
    }

    #[test]
    fn test_assignment_is_in_input_order() {
        let dir = tempdir().unwrap();
        let packed = dir.path().join("packed.jsonl");
        write_blocks(&packed, 10, 2);

        let ratios = SplitRatios::new(0.6, 0.2, 0.2).unwrap();
        let summary = shard_packed_dataset(&packed, &dir.path().join("out"), &ratios, 100, 2).unwrap();

        let val = crate::data::read_token_records(&dir.path().join("out/val/shard_00001.jsonl")).unwrap();
        let firsts: Vec<u32> = val.iter().map(|b| b.input_ids[0]).collect();
        assert_eq!(firsts, vec![6, 7]);
        assert_eq!(summary.counts.total_blocks(), 10);
    }

    #[test]
    fn test_rotation_without_empty_trailing_shard() {
        let dir = tempdir().unwrap();
        let packed = dir.path().join("packed.jsonl");
        let out = dir.path().join("out");
        write_blocks(&packed, 6, 1);

        let ratios = SplitRatios::new(1.0, 0.0, 0.0).unwrap();
        let summary = shard_packed_dataset(&packed, &out, &ratios, 3, 1).unwrap();

        assert_eq!(summary.counts.train, SplitCount { blocks: 6, shards: 2 });
        assert!(out.join("train/shard_00002.jsonl").exists());
        assert!(!out.join("train/shard_00003.jsonl").exists());
        // empty splits get a directory and nothing else
        assert!(out.join("val").is_dir());
        assert_eq!(std::fs::read_dir(out.join("val")).unwrap().count(), 0);
    }

    #[test]
    fn test_bad_ratios_create_nothing() {
        let dir = tempdir().unwrap();
        let packed = dir.path().join("packed.jsonl");
        let out = dir.path().join("out");
        write_blocks(&packed, 4, 1);

        let ratios = SplitRatios { train: 0.9, val: 0.2, test: 0.0 };
        assert!(matches!(
            shard_packed_dataset(&packed, &out, &ratios, 10, 1),
            Err(PipeError::Config(_))
        ));
        assert!(shard_packed_dataset(&packed, &out, &SplitRatios::default(), 0, 1).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_wrong_block_length_refused() {
        let dir = tempdir().unwrap();
        let packed = dir.path().join("packed.jsonl");
        let out = dir.path().join("out");
        write_blocks(&packed, 3, 4);

        let err = shard_packed_dataset(&packed, &out, &SplitRatios::default(), 10, 8).unwrap_err();
        assert!(matches!(err, PipeError::InvariantViolation { block_size: 8, .. }));
        assert!(!out.exists());
    }

    #[test]
    fn test_mixed_lengths_refused_before_writing() {
        let dir = tempdir().unwrap();
        let packed = dir.path().join("packed.jsonl");
        let out = dir.path().join("out");
        let mut w = JsonlWriter::create(&packed).unwrap();
        w.write_record(&TokenRecord::new(vec![1; 2048])).unwrap();
        w.write_record(&TokenRecord::new(vec![2; 7])).unwrap();
        w.finish().unwrap();

        let err = shard_packed_dataset(&packed, &out, &SplitRatios::default(), 10, 2048).unwrap_err();
        match err {
            PipeError::InvariantViolation { block_size, offending } => {
                assert_eq!(block_size, 2048);
                assert_eq!(offending, vec![7]);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!out.exists());
    }

    #[test]
    fn test_undecodable_line_rejected_before_writing() {
        let dir = tempdir().unwrap();
        let packed = dir.path().join("packed.jsonl");
        let out = dir.path().join("out");
        let mut bytes = serde_json::to_vec(&TokenRecord::new(vec![1; 2])).unwrap();
        bytes.extend_from_slice(b"\n\xff\xfe\n");
        std::fs::write(&packed, bytes).unwrap();

        let err = shard_packed_dataset(&packed, &out, &SplitRatios::default(), 10, 2).unwrap_err();
        assert!(matches!(err, PipeError::BadRecord { line: 2, .. }));
        assert!(!out.exists());
    }
}
