//! CLI error type.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while wiring the engine from the command line.
#[derive(Error, Debug)]
pub enum CliError {
    /// A file could not be read.
    #[error("failed to read {path:?}: {source}")]
    Read {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A file did not contain valid JSON of the expected shape.
    #[error("invalid JSON in {path:?}: {source}")]
    Parse {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The async runtime could not be started.
    #[error("failed to start runtime: {0}")]
    Runtime(std::io::Error),

    /// Invalid setting value.
    #[error("invalid setting {key}: {reason}")]
    InvalidSetting {
        /// Setting name.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
