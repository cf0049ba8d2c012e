//! Packer Integration Tests
//!
//! Fixed-block packing over files, plus the post-pack length check.

mod common;

use corpus_pipe::data::read_token_records;
use corpus_pipe::pack::{diagnose_packed_lengths, pack_to_fixed_blocks};
use corpus_pipe::PipeError;
use tempfile::tempdir;

const PAD: u32 = 60_000;

#[test]
fn test_three_sequences_of_a_thousand() {
    let dir = tempdir().unwrap();
    let tok = common::write_sequences(
        &dir.path().join("tok.jsonl"),
        &[vec![1; 1000], vec![2; 1000], vec![3; 1000]],
    );
    let packed = dir.path().join("packed.jsonl");

    assert_eq!(pack_to_fixed_blocks(&tok, &packed, 2048, PAD).unwrap(), 2);

    let blocks = read_token_records(&packed).unwrap();
    let real = |b: &corpus_pipe::TokenRecord| b.input_ids.iter().filter(|&&t| t != PAD).count();
    assert_eq!((real(&blocks[0]), real(&blocks[1])), (2000, 1000));
    // the second sequence stays whole in the first block
    assert!(blocks[0].input_ids[1000..2000].iter().all(|&t| t == 2));
    assert!(blocks[1].input_ids[..1000].iter().all(|&t| t == 3));
    assert_eq!(blocks[1].input_ids[1000..].len(), 1048);

    let d = diagnose_packed_lengths(&tok, &packed, 2048).unwrap();
    assert_eq!((d.docs, d.blocks), (3, 2));
    assert_eq!(d.unique_lengths.into_iter().collect::<Vec<_>>(), vec![2048]);
}

#[test]
fn test_block_size_and_lossless_on_random_streams() {
    let dir = tempdir().unwrap();
    for (seed, block_size) in [(1u64, 16usize), (2, 64), (3, 100)] {
        let seqs = common::random_sequences(300, block_size, 5_000, seed);
        let tok = common::write_sequences(&dir.path().join(format!("tok_{}.jsonl", seed)), &seqs);
        let packed = dir.path().join(format!("packed_{}.jsonl", seed));

        pack_to_fixed_blocks(&tok, &packed, block_size, PAD).unwrap();
        let blocks = read_token_records(&packed).unwrap();

        assert!(blocks
            .iter()
            .all(|b| b.length == block_size && b.input_ids.len() == block_size));

        let flat_in: Vec<u32> = seqs.into_iter().flatten().collect();
        let flat_out: Vec<u32> = blocks
            .into_iter()
            .flat_map(|b| b.input_ids)
            .filter(|&t| t != PAD)
            .collect();
        assert_eq!(flat_in, flat_out, "block_size {}", block_size);
    }
}

#[test]
fn test_empty_tokenized_file_gives_no_blocks() {
    let dir = tempdir().unwrap();
    let tok = common::write_sequences(&dir.path().join("tok.jsonl"), &[]);
    let packed = dir.path().join("packed.jsonl");
    assert_eq!(pack_to_fixed_blocks(&tok, &packed, 8, PAD).unwrap(), 0);
    assert!(read_token_records(&packed).unwrap().is_empty());
}

#[test]
fn test_bad_tokenized_line_is_reported_with_position() {
    let dir = tempdir().unwrap();
    let tok = dir.path().join("tok.jsonl");
    std::fs::write(&tok, "{\"input_ids\": [1, 2], \"length\": 2}\n{\"input_ids\": \"x\"}\n").unwrap();

    match pack_to_fixed_blocks(&tok, &dir.path().join("packed.jsonl"), 8, PAD) {
        Err(PipeError::BadRecord { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected bad record, got {:?}", other),
    }
}

#[test]
fn test_overlong_block_fails_diagnosis() {
    let dir = tempdir().unwrap();
    let tok = common::write_sequences(&dir.path().join("tok.jsonl"), &[vec![1; 12]]);
    let packed = dir.path().join("packed.jsonl");

    // a sequence longer than the block is never split, so the block overflows
    pack_to_fixed_blocks(&tok, &packed, 8, PAD).unwrap();
    assert!(matches!(
        diagnose_packed_lengths(&tok, &packed, 8),
        Err(PipeError::InvariantViolation { block_size: 8, .. })
    ));
}
