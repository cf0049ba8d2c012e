use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipeError {
    // --- I/O ---
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // --- Records ---
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bad record in {path} at line {line}: {reason}")]
    BadRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    // --- Packing ---
    #[error("Packed blocks must be exactly {block_size} tokens, found lengths {offending:?}")]
    InvariantViolation {
        block_size: usize,
        offending: Vec<usize>,
    },

    // --- Tokenizer ---
    #[error("Tokenizer load failed: {0}")]
    TokenizerLoad(String),

    // --- Config ---
    #[error("Invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipeError>;
