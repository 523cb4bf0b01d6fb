use std::io;
use std::path::PathBuf;
use thiserror::Error;
use vigil::monitor::{ConfigError, MonitorError};
use crate::logging::LoggingError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown output format '{0}' (expected console, json or html)")]
    InvalidOutputFormat(String),

    #[error("Invalid --since timestamp '{value}': {source}")]
    InvalidSince {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Failed to write report to {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to set up logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code for this error. 0 and 1 are reserved for successful runs.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Monitor(err) => match err {
                MonitorError::RootNotFound(_) | MonitorError::RootResolve { .. } => 3,
                MonitorError::NoBaseline(_) => 4,
                MonitorError::Configuration(_) | MonitorError::Reconcile(_) => 5,
                MonitorError::Store(_) => 6,
            },
            CliError::Config(_) | CliError::InvalidOutputFormat(_) => 5,
            CliError::ReportWrite { .. } => 7,
            CliError::InvalidSince { .. } | CliError::Json(_) | CliError::Logging(_) | CliError::Io(_) => 2,
        }
    }
}
