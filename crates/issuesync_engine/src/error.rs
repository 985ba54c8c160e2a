//! Error types for the sync engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for page fetches.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for the fetch phase of a sync run.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors a [`PageFetcher`](crate::PageFetcher) may return.
///
/// This is the whole vocabulary of the remote boundary. The classifier
/// matches on it exhaustively, so adding a variant forces a decision about
/// which [`ErrorCode`] it maps to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The remote service could not be reached.
    #[error("{message}")]
    Unavailable {
        /// Error message.
        message: String,
    },

    /// The remote rejected our credentials.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Error message.
        message: String,
    },

    /// The remote throttled the request.
    #[error("rate limited: {message}")]
    RateLimited {
        /// Error message.
        message: String,
        /// How long the remote asked us to wait, if it said.
        retry_after: Option<Duration>,
    },

    /// The remote answered with something we could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Anything else. The message may be missing.
    #[error("{}", .0.as_deref().unwrap_or(""))]
    Other(Option<String>),
}

impl FetchError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates an error of unknown kind with a message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(Some(message.into()))
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::RateLimited { .. })
    }

    /// Returns the delay the remote requested before retrying.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Errors that abort the fetch phase of a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The remote collection identifier is not configured.
    #[error("missing configuration: {key}")]
    MissingConfig {
        /// Name of the missing setting.
        key: &'static str,
    },

    /// The page fetcher failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The remote reported more pages but gave no cursor to reach them.
    #[error("page {page} reported more results without an end cursor")]
    MissingCursor {
        /// 1-based index of the offending page.
        page: usize,
    },
}

/// Stable error codes surfaced through [`SyncStatus`](crate::SyncStatus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Required configuration is missing.
    ConfigError,
    /// The remote service is unreachable.
    ApiUnavailable,
    /// Any other fetch failure.
    UnknownError,
    /// Every record in the run failed transformation.
    TransformFailed,
    /// Some records failed transformation.
    PartialSuccess,
}

impl ErrorCode {
    /// Returns the wire form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::ApiUnavailable => "API_UNAVAILABLE",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
            ErrorCode::TransformFailed => "TRANSFORM_FAILED",
            ErrorCode::PartialSuccess => "PARTIAL_SUCCESS",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
