//! Classifies the combined transform result of a run.

use crate::classify::ErrorInfo;
use crate::error::ErrorCode;
use crate::status::SyncState;
use crate::transform::TransformFailure;

/// What a run does to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEffect {
    /// Replace the cache wholesale with this run's items.
    Replace,
    /// Keep whatever the cache held before the run.
    Preserve,
}

/// Outcome of a run whose fetch phase completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOutcome {
    /// Terminal state to record.
    pub state: SyncState,
    /// Error to record; `None` clears any stored error.
    pub error: Option<ErrorInfo>,
    /// Number of successful items.
    pub items_synced: usize,
    /// Number of failed records.
    pub items_failed: usize,
    /// Effect on the cache.
    pub cache: CacheEffect,
}

/// Decides the outcome of a run from its transform results.
///
/// | items | failures | state | cache |
/// |-------|----------|-------|-------|
/// | > 0   | none     | success | replace |
/// | > 0   | some     | partial | replace |
/// | 0     | some     | error   | preserve |
/// | 0     | none     | success | replace (empty) |
pub fn aggregate<I>(items: &[I], failures: &[TransformFailure]) -> AggregateOutcome {
    let items_synced = items.len();
    let items_failed = failures.len();

    let (state, error, cache) = match (items_synced, items_failed) {
        (_, 0) => (SyncState::Success, None, CacheEffect::Replace),
        (0, n) => (
            SyncState::Error,
            Some(ErrorInfo::new(
                ErrorCode::TransformFailed,
                format!("All {n} item(s) failed to sync"),
            )),
            CacheEffect::Preserve,
        ),
        (_, n) => (
            SyncState::Partial,
            Some(ErrorInfo::new(
                ErrorCode::PartialSuccess,
                format!("{n} item(s) failed to sync"),
            )),
            CacheEffect::Replace,
        ),
    };

    AggregateOutcome {
        state,
        error,
        items_synced,
        items_failed,
        cache,
    }
}
