//! Maps fetch-phase errors to the stable error-code taxonomy.

use crate::config::COLLECTION_ID_ENV;
use crate::error::{ErrorCode, FetchError, SyncError};

/// Message used when an error carries no text of its own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred during sync";

/// A classified run-level error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Stable code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ErrorInfo {
    /// Creates a new error info.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Classifies an error raised before the transform step.
pub fn classify(error: &SyncError) -> ErrorInfo {
    match error {
        SyncError::MissingConfig { .. } => ErrorInfo::new(
            ErrorCode::ConfigError,
            format!("Remote collection is not configured (set {COLLECTION_ID_ENV})"),
        ),
        SyncError::Fetch(FetchError::Unavailable { message }) => {
            ErrorInfo::new(ErrorCode::ApiUnavailable, message_or_fallback(message))
        }
        SyncError::Fetch(FetchError::Other(message)) => ErrorInfo::new(
            ErrorCode::UnknownError,
            message_or_fallback(message.as_deref().unwrap_or_default()),
        ),
        SyncError::Fetch(
            FetchError::Unauthorized { .. }
            | FetchError::RateLimited { .. }
            | FetchError::Protocol(_),
        )
        | SyncError::MissingCursor { .. } => {
            ErrorInfo::new(ErrorCode::UnknownError, message_or_fallback(&error.to_string()))
        }
    }
}

fn message_or_fallback(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        UNKNOWN_ERROR_MESSAGE.to_string()
    } else {
        trimmed.to_string()
    }
}
