mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use corpus_pipe::config::{EncoderKind, FilterConfig, PipelineConfig, SplitRatios};
use corpus_pipe::error::Result;
use corpus_pipe::logger::init_logging;

// ============ CLI ============
#[derive(Parser)]
#[command(name = "corpus-pipe")]
#[command(author = "Caike Costa")]
#[command(version = "1.0.0")]
#[command(about = "Raw JSONL corpora to fixed-size token blocks for LM pretraining")]
struct Cli {
    /// JSON pipeline config; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the run log file
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    /// Log to stderr only
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Encoder selection shared by the token-producing commands.
#[derive(Args, Clone)]
struct EncoderArgs {
    #[arg(long, value_enum)]
    encoder: Option<EncoderKind>,
    /// Byte-level BPE vocabulary (JSON)
    #[arg(long)]
    tokenizer: Option<PathBuf>,
}

impl EncoderArgs {
    fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(encoder) = self.encoder {
            config = config.with_encoder(encoder);
        }
        if self.tokenizer.is_some() {
            config = config.with_tokenizer_path(self.tokenizer.clone());
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// File overview, length stats and category breakdown
    Inspect {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        sample: Option<usize>,
        /// Write JSON reports into this directory
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// Exact dedup by SHA-256 of the raw text
    Dedup {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// SimHash near-duplicate removal
    DedupNear {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// HTML strip, language/code/length filters, normalization
    Clean {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Write the outcome counters as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
        #[arg(long)]
        min_chars: Option<usize>,
        #[arg(long)]
        max_chars: Option<usize>,
        #[arg(long)]
        code_threshold: Option<f64>,
    },

    /// PII, toxicity, perplexity and language audit of a sample
    Quality {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        sample: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Token counts per document
    TokenStats {
        #[arg(short, long)]
        input: PathBuf,
        #[command(flatten)]
        encoder: EncoderArgs,
        #[arg(long)]
        max_docs: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cleaned text to BOS/EOS-wrapped id sequences
    Tokenize {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        encoder: EncoderArgs,
        #[arg(long)]
        max_seq_len: Option<usize>,
        #[arg(long)]
        block_size: Option<usize>,
    },

    /// Pack sequences into fixed-size blocks
    Pack {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        encoder: EncoderArgs,
        #[arg(long)]
        block_size: Option<usize>,
    },

    /// Check every packed block has exactly block_size ids
    Diagnose {
        #[arg(short, long)]
        tokenized: PathBuf,
        #[arg(short, long)]
        packed: PathBuf,
        #[arg(long)]
        block_size: Option<usize>,
    },

    /// Split packed blocks into train/val/test shards
    Shard {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        train: Option<f64>,
        #[arg(long)]
        val: Option<f64>,
        #[arg(long)]
        test: Option<f64>,
        #[arg(long)]
        shard_size: Option<usize>,
        /// Expected block length; every block must match it
        #[arg(long)]
        block_size: Option<usize>,
    },

    /// Full pipeline: inspect, dedup, clean, audit, tokenize, pack, shard, meta
    Run {
        #[arg(short, long)]
        raw: Option<PathBuf>,
        /// Put every intermediate and final output under this directory
        #[arg(long)]
        work_dir: Option<PathBuf>,
        #[command(flatten)]
        encoder: EncoderArgs,
        #[arg(long)]
        block_size: Option<usize>,
        #[arg(long)]
        max_seq_len: Option<usize>,
        #[arg(long)]
        shard_size: Option<usize>,
        #[arg(long)]
        near_dedup: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_file(p),
        None => Ok(PipelineConfig::default()),
    }
}

fn dispatch(command: Commands, config: PipelineConfig) -> Result<()> {
    match command {
        Commands::Inspect {
            input,
            sample,
            report_dir,
        } => commands::inspect::execute(
            &input,
            sample.unwrap_or(config.inspect_sample),
            &config.filter,
            report_dir.as_deref(),
        ),

        Commands::Dedup { input, output } => commands::dedup::execute(&input, &output),

        Commands::DedupNear {
            input,
            output,
            threshold,
        } => commands::dedup_near::execute(&input, &output, threshold.unwrap_or(config.hamming_threshold)),

        Commands::Clean {
            input,
            output,
            summary,
            min_chars,
            max_chars,
            code_threshold,
        } => {
            let filter = FilterConfig {
                min_chars: min_chars.unwrap_or(config.filter.min_chars),
                max_chars: max_chars.unwrap_or(config.filter.max_chars),
                code_threshold: code_threshold.unwrap_or(config.filter.code_threshold),
            };
            config.with_filter(filter.clone()).validate()?;
            commands::clean::execute(&input, &output, filter, summary.as_deref())
        }

        Commands::Quality {
            input,
            sample,
            seed,
            output,
        } => commands::quality::execute(
            &input,
            sample.unwrap_or(config.quality_sample),
            seed.unwrap_or(config.seed),
            output.as_deref(),
        ),

        Commands::TokenStats {
            input,
            encoder,
            max_docs,
            output,
        } => commands::token_stats::execute(&input, &encoder.apply(config), max_docs, output.as_deref()),

        Commands::Tokenize {
            input,
            output,
            encoder,
            max_seq_len,
            block_size,
        } => {
            let mut config = encoder.apply(config);
            if let Some(n) = max_seq_len {
                config = config.with_max_seq_len(n);
            }
            if let Some(n) = block_size {
                config = config.with_block_size(n);
            }
            commands::tokenize::execute(&input, &output, &config)
        }

        Commands::Pack {
            input,
            output,
            encoder,
            block_size,
        } => {
            let mut config = encoder.apply(config);
            if let Some(n) = block_size {
                config = config.with_block_size(n);
            }
            commands::pack::execute(&input, &output, &config)
        }

        Commands::Diagnose {
            tokenized,
            packed,
            block_size,
        } => commands::diagnose::execute(&tokenized, &packed, block_size.unwrap_or(config.block_size)),

        Commands::Shard {
            input,
            output,
            train,
            val,
            test,
            shard_size,
            block_size,
        } => {
            let ratios = SplitRatios {
                train: train.unwrap_or(config.ratios.train),
                val: val.unwrap_or(config.ratios.val),
                test: test.unwrap_or(config.ratios.test),
            };
            commands::shard::execute(
                &input,
                &output,
                &ratios,
                shard_size.unwrap_or(config.shard_size),
                block_size.unwrap_or(config.block_size),
            )
        }

        Commands::Run {
            raw,
            work_dir,
            encoder,
            block_size,
            max_seq_len,
            shard_size,
            near_dedup,
            seed,
        } => {
            let mut config = encoder.apply(config);
            if let Some(raw) = raw {
                config = config.with_raw_path(raw);
            }
            if let Some(dir) = work_dir {
                config = config.with_work_dir(&dir);
            }
            if let Some(n) = block_size {
                config = config.with_block_size(n);
            }
            if let Some(n) = max_seq_len {
                config = config.with_max_seq_len(n);
            }
            if let Some(n) = shard_size {
                config = config.with_shard_size(n);
            }
            if near_dedup {
                config = config.with_near_dedup(true);
            }
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            commands::run::execute(&config)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_dir = (!cli.no_log_file).then_some(cli.log_dir.as_path());
    if let Err(e) = init_logging(log_dir) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let result = load_config(cli.config.as_ref()).and_then(|config| dispatch(cli.command, config));
    if let Err(e) = result {
        error!("❌ {}", e);
        std::process::exit(1);
    }
}
