// src/data/record.rs
//! Line-delimited JSON records and the buffered reader/writer every stage uses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{PipeError, Result};

const IO_BUFFER: usize = 1024 * 1024;

/// Record written by the cleaning stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanDoc {
    pub text: String,
}

/// `{"input_ids": [...], "length": N}`
///
/// Tokenized sequences, packed blocks and shard lines all share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub input_ids: Vec<u32>,
    pub length: usize,
}

impl TokenRecord {
    pub fn new(input_ids: Vec<u32>) -> Self {
        let length = input_ids.len();
        Self { input_ids, length }
    }
}

/// What the `text` field of a raw record looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField<'a> {
    Text(&'a str),
    Missing,
    NotText,
}

impl<'a> TextField<'a> {
    pub fn of(row: &'a Value) -> Self {
        match row.get("text") {
            Some(Value::String(s)) => TextField::Text(s),
            Some(_) => TextField::NotText,
            None => TextField::Missing,
        }
    }
}

/// One physical line of an input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text { number: usize, content: String },
    /// Bytes that are not valid UTF-8.
    Undecodable { number: usize },
}

/// Streams the non-blank lines of a JSONL file.
pub struct JsonlLines {
    reader: BufReader<File>,
    path: PathBuf,
    number: usize,
    buf: Vec<u8>,
}

impl JsonlLines {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| PipeError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            reader: BufReader::with_capacity(IO_BUFFER, file),
            path: path.to_path_buf(),
            number: 0,
            buf: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for JsonlLines {
    type Item = Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            let n = match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(n) => n,
                Err(source) => {
                    return Some(Err(PipeError::FileRead {
                        path: self.path.clone(),
                        source,
                    }))
                }
            };
            if n == 0 {
                return None;
            }
            self.number += 1;

            while matches!(self.buf.last(), Some(b'\n') | Some(b'\r')) {
                self.buf.pop();
            }
            if self.buf.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }

            let number = self.number;
            return Some(Ok(match std::str::from_utf8(&self.buf) {
                Ok(s) => Line::Text {
                    number,
                    content: s.to_string(),
                },
                Err(_) => Line::Undecodable { number },
            }));
        }
    }
}

/// Reads every record of a token file (tokenized or packed), failing on the first bad line.
pub fn read_token_records(path: &Path) -> Result<Vec<TokenRecord>> {
    let mut records = Vec::new();
    for line in JsonlLines::open(path)? {
        records.push(parse_token_line(path, line?)?);
    }
    Ok(records)
}

pub(crate) fn parse_token_line(path: &Path, line: Line) -> Result<TokenRecord> {
    match line {
        Line::Text { number, content } => {
            serde_json::from_str(&content).map_err(|e| PipeError::BadRecord {
                path: path.to_path_buf(),
                line: number,
                reason: e.to_string(),
            })
        }
        Line::Undecodable { number } => Err(PipeError::BadRecord {
            path: path.to_path_buf(),
            line: number,
            reason: "invalid UTF-8".to_string(),
        }),
    }
}

/// Counts non-blank lines without parsing them.
pub fn count_lines(path: &Path) -> Result<usize> {
    let mut total = 0usize;
    for line in JsonlLines::open(path)? {
        line?;
        total += 1;
    }
    Ok(total)
}

/// Buffered JSONL writer
pub struct JsonlWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    records_written: usize,
}

impl JsonlWriter {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| PipeError::FileWrite {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let file = File::create(path).map_err(|source| PipeError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            writer: BufWriter::with_capacity(IO_BUFFER, file),
            path: path.to_path_buf(),
            records_written: 0,
        })
    }

    pub fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.end_line()
    }

    /// Writes an already-serialized record verbatim.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer
            .write_all(line.as_bytes())
            .map_err(|source| PipeError::FileWrite {
                path: self.path.clone(),
                source,
            })?;
        self.end_line()
    }

    fn end_line(&mut self) -> Result<()> {
        self.writer
            .write_all(b"\n")
            .map_err(|source| PipeError::FileWrite {
                path: self.path.clone(),
                source,
            })?;
        self.records_written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush().map_err(|source| PipeError::FileWrite {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.records_written)
    }
}

/// Writes a pretty-printed JSON document (reports, metadata).
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path).map_err(|source| PipeError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
