//! Logging setup for the command line tool.
//!
//! Logs go to stderr so that reports on stdout stay machine readable. When the
//! configuration names a log file, every event is appended there as well.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The level is not a valid filter directive.
    #[error("Invalid log level '{level}': {source}")]
    InvalidLevel {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    /// Failed to open the configured log file.
    #[error("Failed to open log file {}: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to set the global tracing subscriber.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// `RUST_LOG` wins over `level`.
fn build_env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|source| LoggingError::InvalidLevel {
        level: level.to_string(),
        source,
    })
}

fn open_log_file(path: &Path) -> Result<fs::File, LoggingError> {
    let open_error = |source| LoggingError::OpenFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(open_error)?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_error)
}

/// Installs the global subscriber.
pub fn init(level: &str, file: Option<&Path>) -> Result<(), LoggingError> {
    let env_filter = build_env_filter(level)?;
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let file_layer = match file {
        Some(path) => {
            let file = Arc::new(open_log_file(path)?);
            Some(fmt::layer().with_ansi(false).with_writer(file))
        }
        None => None,
    };

    let subscriber = Registry::default()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
