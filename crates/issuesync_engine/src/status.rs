//! Observable sync status.

use crate::error::ErrorCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// No run has happened yet.
    #[default]
    Idle,
    /// A run is in flight.
    Syncing,
    /// The last run cached every record.
    Success,
    /// The last run cached some records and rejected others.
    Partial,
    /// The last run failed and left the cache alone.
    Error,
}

impl SyncState {
    /// Returns true if the state is the settled outcome of a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncState::Success | SyncState::Partial | SyncState::Error
        )
    }

    /// Returns the lowercase wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::Syncing => "syncing",
            SyncState::Success => "success",
            SyncState::Partial => "partial",
            SyncState::Error => "error",
        }
    }
}

/// Snapshot of the engine's status, as served to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Current state.
    pub state: SyncState,
    /// Completion time of the last run that changed the cache.
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Number of cached items; `None` while the cache is unpopulated.
    pub item_count: Option<usize>,
    /// Items that transformed successfully in the most recent run.
    pub items_synced: Option<usize>,
    /// Items that failed to transform in the most recent run.
    pub items_failed: Option<usize>,
    /// Message for the most recent non-success outcome.
    pub error_message: Option<String>,
    /// Code for the most recent non-success outcome.
    pub error_code: Option<ErrorCode>,
}

impl SyncStatus {
    /// Returns true if a run is in flight.
    pub fn is_syncing(&self) -> bool {
        self.state == SyncState::Syncing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_state_checks() {
        assert!(SyncState::Success.is_terminal());
        assert!(SyncState::Partial.is_terminal());
        assert!(SyncState::Error.is_terminal());
        assert!(!SyncState::Idle.is_terminal());
        assert!(!SyncState::Syncing.is_terminal());
    }

    #[test]
    fn initial_status_is_idle_and_empty() {
        let status = SyncStatus::default();
        assert_eq!(status.state, SyncState::Idle);
        assert_eq!(status.last_synced_at, None);
        assert_eq!(status.item_count, None);
        assert_eq!(status.items_synced, None);
        assert_eq!(status.items_failed, None);
        assert_eq!(status.error_message, None);
        assert_eq!(status.error_code, None);
    }

    #[test]
    fn status_serializes_for_http_handlers() {
        let status = SyncStatus {
            state: SyncState::Partial,
            item_count: Some(2),
            items_synced: Some(2),
            items_failed: Some(1),
            error_message: Some("1 item(s) failed to sync".into()),
            error_code: Some(ErrorCode::PartialSuccess),
            ..SyncStatus::default()
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["state"], "partial");
        assert_eq!(value["itemsFailed"], 1);
        assert_eq!(value["errorCode"], "PARTIAL_SUCCESS");
        assert!(value["lastSyncedAt"].is_null());
    }
}
