// src/logger/mod.rs
//! Tracing setup: human-readable events on stderr, plus an optional
//! plain-text run log under a log directory.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{PipeError, Result};

/// Installs the global subscriber. Returns the run log path when `log_dir` is set.
///
/// `RUST_LOG` overrides the default `info` level.
pub fn init_logging(log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, log_path) = match log_dir {
        Some(dir) => {
            let path = run_log_path(dir);
            std::fs::create_dir_all(dir).map_err(|source| PipeError::FileWrite {
                path: dir.to_path_buf(),
                source,
            })?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| PipeError::FileWrite {
                    path: path.clone(),
                    source,
                })?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| PipeError::Config(format!("logging already initialised: {}", e)))?;

    Ok(log_path)
}

/// `<dir>/run_YYYYmmdd_HHMMSS.log`
pub fn run_log_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("run_{}.log", stamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_name() {
        let path = run_log_path(Path::new("logs"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("run_") && name.ends_with(".log"));
        assert_eq!(name.len(), "run_20240101_120000.log".len());
    }
}
