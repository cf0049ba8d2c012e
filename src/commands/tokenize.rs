//! Tokenize Command
//!
//! Cleaned text to `{"input_ids", "length"}` sequences wrapped in BOS/EOS.

use std::path::Path;

use corpus_pipe::config::{validate_lengths, PipelineConfig};
use corpus_pipe::error::Result;
use corpus_pipe::pipeline::build_adapter;
use corpus_pipe::tokenizer::tokenize_to_jsonl;
use corpus_pipe::utils::{format_count, format_number};

use super::{banner, footer};

pub fn execute(input: &Path, output: &Path, config: &PipelineConfig) -> Result<()> {
    banner("🔤 Tokenization");
    println!("  Input: {:?}", input);
    println!("  Output: {:?}", output);
    println!("  max_seq_len: {}", config.max_seq_len);

    validate_lengths(config.block_size, config.max_seq_len)?;
    let adapter = build_adapter(config)?;
    let special = adapter.special();
    println!("  Tokenizer: {} (vocab {})", adapter.name(), adapter.vocab_size());
    println!("  BOS: {} | EOS: {} | PAD: {} | UNK: {}", special.bos, special.eos, special.pad, special.unk);
    println!();

    let stats = tokenize_to_jsonl(input, output, &adapter, config.max_seq_len)?;

    println!("  Docs read: {}", format_count(stats.read_docs));
    println!("  Sequences written: {}", format_count(stats.written_docs));
    println!("  Skipped: {}", format_count(stats.skipped));
    println!("  Truncated: {}", format_count(stats.truncated));
    println!("  Tokens: {}", format_number(stats.total_tokens));
    footer();
    Ok(())
}
