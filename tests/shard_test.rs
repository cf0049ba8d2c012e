//! Shard Integration Tests

mod common;

use corpus_pipe::data::read_token_records;
use corpus_pipe::shard::{shard_packed_dataset, Split};
use corpus_pipe::SplitRatios;
use tempfile::tempdir;

fn packed_blocks(dir: &std::path::Path, n: usize, block_size: usize) -> std::path::PathBuf {
    let blocks: Vec<Vec<u32>> = (0..n).map(|i| vec![i as u32; block_size]).collect();
    common::write_sequences(&dir.join("packed.jsonl"), &blocks)
}

#[test]
fn test_hundred_blocks_default_ratios() {
    let dir = tempdir().unwrap();
    let packed = packed_blocks(dir.path(), 100, 4);
    let out = dir.path().join("sharded");

    let summary = shard_packed_dataset(&packed, &out, &SplitRatios::default(), 50_000, 4).unwrap();
    assert_eq!(
        (summary.targets.train, summary.targets.val, summary.targets.test),
        (98, 1, 1)
    );
    assert_eq!(summary.counts.train.blocks, 98);
    assert_eq!(summary.counts.val.blocks, 1);
    assert_eq!(summary.counts.test.blocks, 1);
}

#[test]
fn test_total_conservation_across_shard_files() {
    let dir = tempdir().unwrap();
    let packed = packed_blocks(dir.path(), 257, 2);
    let out = dir.path().join("sharded");
    let ratios = SplitRatios::new(0.7, 0.2, 0.1).unwrap();

    let summary = shard_packed_dataset(&packed, &out, &ratios, 10, 2).unwrap();

    let mut seen = Vec::new();
    for split in Split::ALL {
        let files = common::shard_files(&out.join(split.name()));
        let c = summary.counts.get(split);
        assert_eq!(files.len(), c.shards, "{}", split);
        assert_eq!(c.shards, (c.blocks + 9) / 10, "{}", split);

        let mut in_split = 0;
        for f in &files {
            let blocks = read_token_records(f).unwrap();
            assert!(blocks.len() <= 10);
            in_split += blocks.len();
            seen.extend(blocks.into_iter().map(|b| b.input_ids[0]));
        }
        assert_eq!(in_split, c.blocks);
    }

    let t = summary.targets;
    assert_eq!(t.train + t.val + t.test, 257);
    // input order is kept across splits
    assert_eq!(seen, (0..257).collect::<Vec<u32>>());
}

#[test]
fn test_shard_files_numbered_from_one() {
    let dir = tempdir().unwrap();
    let packed = packed_blocks(dir.path(), 5, 1);
    let out = dir.path().join("sharded");
    let ratios = SplitRatios::new(1.0, 0.0, 0.0).unwrap();

    shard_packed_dataset(&packed, &out, &ratios, 2, 1).unwrap();

    let names: Vec<String> = common::shard_files(&out.join("train"))
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["shard_00001.jsonl", "shard_00002.jsonl", "shard_00003.jsonl"]);
}

#[test]
fn test_ratio_tolerance_boundary() {
    let dir = tempdir().unwrap();
    let packed = packed_blocks(dir.path(), 10, 1);

    let ok = SplitRatios { train: 0.8, val: 0.1, test: 0.1 + 5e-7 };
    assert!(shard_packed_dataset(&packed, &dir.path().join("a"), &ok, 10, 1).is_ok());

    let bad = SplitRatios { train: 0.8, val: 0.1, test: 0.1 + 5e-6 };
    assert!(shard_packed_dataset(&packed, &dir.path().join("b"), &bad, 10, 1).is_err());
    assert!(!dir.path().join("b").exists());
}
