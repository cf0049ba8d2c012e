// src/pack/diagnose.rs
//! Post-pack length check.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{error, info};

use crate::data::{parse_token_line, JsonlLines, TokenRecord};
use crate::error::{PipeError, Result};

/// Offending lengths reported in an invariant error.
const MAX_REPORTED: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackDiagnostics {
    pub docs: usize,
    pub min_len: usize,
    pub max_len: usize,
    pub mean_len: f64,
    pub blocks: usize,
    pub unique_lengths: BTreeSet<usize>,
}

/// Length a block claims or carries when it breaks the block size, whichever is wrong.
pub(crate) fn offending_length(block: &TokenRecord, block_size: usize) -> Option<usize> {
    if block.input_ids.len() != block_size {
        Some(block.input_ids.len())
    } else if block.length != block_size {
        Some(block.length)
    } else {
        None
    }
}

/// Summarizes the tokenized stream and checks every packed block is `block_size` long.
pub fn diagnose_packed_lengths(tokenized: &Path, packed: &Path, block_size: usize) -> Result<PackDiagnostics> {
    let mut docs = 0usize;
    let mut total = 0usize;
    let mut min_len = usize::MAX;
    let mut max_len = 0usize;
    for line in JsonlLines::open(tokenized)? {
        let seq = parse_token_line(tokenized, line?)?;
        let len = seq.input_ids.len();
        docs += 1;
        total += len;
        min_len = min_len.min(len);
        max_len = max_len.max(len);
    }
    if docs == 0 {
        min_len = 0;
    }

    let mut blocks = 0usize;
    let mut unique_lengths = BTreeSet::new();
    let mut offending = Vec::new();
    for line in JsonlLines::open(packed)? {
        let block = parse_token_line(packed, line?)?;
        blocks += 1;
        unique_lengths.insert(block.input_ids.len());
        if let Some(bad) = offending_length(&block, block_size) {
            if offending.len() < MAX_REPORTED {
                offending.push(bad);
            }
        }
    }

    if !offending.is_empty() {
        error!(block_size, ?offending, "packed blocks have the wrong length");
        return Err(PipeError::InvariantViolation {
            block_size,
            offending,
        });
    }

    let diagnostics = PackDiagnostics {
        docs,
        min_len,
        max_len,
        mean_len: if docs == 0 { 0.0 } else { total as f64 / docs as f64 },
        blocks,
        unique_lengths,
    };
    info!(
        docs,
        blocks,
        min = diagnostics.min_len,
        max = diagnostics.max_len,
        "packed lengths verified"
    );
    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::JsonlWriter;
    use tempfile::tempdir;

    fn write(path: &Path, records: &[TokenRecord]) {
        let mut w = JsonlWriter::create(path).unwrap();
        for r in records {
            w.write_record(r).unwrap();
        }
        w.finish().unwrap();
    }

    #[test]
    fn test_reports_original_lengths() {
        let dir = tempdir().unwrap();
        let tok = dir.path().join("tok.jsonl");
        let packed = dir.path().join("packed.jsonl");
        write(&tok, &[TokenRecord::new(vec![1; 3]), TokenRecord::new(vec![2; 5])]);
        write(&packed, &[TokenRecord::new(vec![0; 8])]);

        let d = diagnose_packed_lengths(&tok, &packed, 8).unwrap();
        assert_eq!((d.docs, d.min_len, d.max_len, d.blocks), (2, 3, 5, 1));
        assert!((d.mean_len - 4.0).abs() < 1e-9);
        assert_eq!(d.unique_lengths.into_iter().collect::<Vec<_>>(), vec![8]);
    }

    #[test]
    fn test_short_block_is_invariant_violation() {
        let dir = tempdir().unwrap();
        let tok = dir.path().join("tok.jsonl");
        let packed = dir.path().join("packed.jsonl");
        write(&tok, &[TokenRecord::new(vec![1; 3])]);
        write(&packed, &[TokenRecord::new(vec![0; 8]), TokenRecord::new(vec![0; 7])]);

        match diagnose_packed_lengths(&tok, &packed, 8) {
            Err(PipeError::InvariantViolation { block_size, offending }) => {
                assert_eq!(block_size, 8);
                assert_eq!(offending, vec![7]);
            }
            other => panic!("expected invariant violation, got {:?}", other),
        }
    }

    #[test]
    fn test_lying_length_field_is_caught() {
        let block = TokenRecord {
            input_ids: vec![0; 8],
            length: 6,
        };
        assert_eq!(offending_length(&block, 8), Some(6));
        assert_eq!(offending_length(&TokenRecord::new(vec![0; 8]), 8), None);
    }
}
