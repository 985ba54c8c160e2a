//! In-memory status and cache store owned by one engine.

use crate::aggregate::{AggregateOutcome, CacheEffect};
use crate::classify::ErrorInfo;
use crate::status::{SyncState, SyncStatus};
use crate::transform::TransformFailure;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

struct StoreInner<I> {
    status: SyncStatus,
    cache: Option<Vec<I>>,
    failures: Vec<TransformFailure>,
}

/// Status, cached items and last failures of one sync target.
///
/// All three live behind a single lock so a reader never sees a status that
/// disagrees with the cache. Every accessor returns an owned copy.
pub struct SyncStore<I> {
    inner: RwLock<StoreInner<I>>,
}

impl<I: Clone> SyncStore<I> {
    /// Creates an idle, empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                status: SyncStatus::default(),
                cache: None,
                failures: Vec::new(),
            }),
        }
    }

    /// Marks a run as started.
    ///
    /// Returns `false` without touching anything if a run is already in
    /// flight. The check and the transition happen under one write lock.
    pub fn try_begin(&self) -> bool {
        let mut inner = self.inner.write();
        if inner.status.is_syncing() {
            return false;
        }
        inner.status.state = SyncState::Syncing;
        true
    }

    /// Records the outcome of a run whose fetch phase completed.
    pub fn finish_with_outcome(
        &self,
        outcome: AggregateOutcome,
        items: Vec<I>,
        failures: Vec<TransformFailure>,
        completed_at: DateTime<Utc>,
    ) {
        let mut inner = self.inner.write();

        if outcome.cache == CacheEffect::Replace {
            inner.status.item_count = Some(items.len());
            inner.status.last_synced_at = Some(completed_at);
            inner.cache = Some(items);
        }

        let status = &mut inner.status;
        status.state = outcome.state;
        status.items_synced = Some(outcome.items_synced);
        status.items_failed = Some(outcome.items_failed);
        match outcome.error {
            Some(error) => {
                status.error_code = Some(error.code);
                status.error_message = Some(error.message);
            }
            None => {
                status.error_code = None;
                status.error_message = None;
            }
        }

        inner.failures = failures;
    }

    /// Records a run that failed before producing any results.
    ///
    /// The cache, counts and last sync time are left as they were.
    pub fn finish_with_error(&self, error: ErrorInfo) {
        let mut inner = self.inner.write();
        inner.status.state = SyncState::Error;
        inner.status.error_code = Some(error.code);
        inner.status.error_message = Some(error.message);
        inner.failures.clear();
    }

    /// Returns a copy of the current status.
    pub fn status(&self) -> SyncStatus {
        self.inner.read().status.clone()
    }

    /// Returns a copy of the cache, or `None` if it was never populated.
    pub fn cached_items(&self) -> Option<Vec<I>> {
        self.inner.read().cache.clone()
    }

    /// Returns the failures recorded by the most recent run.
    pub fn last_transform_failures(&self) -> Vec<TransformFailure> {
        self.inner.read().failures.clone()
    }

    /// Drops the cache. The sync state is left as it is.
    pub fn clear_cache(&self) {
        let mut inner = self.inner.write();
        inner.cache = None;
        inner.status.item_count = None;
    }
}

impl<I: Clone> Default for SyncStore<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::error::ErrorCode;

    fn failure(id: &str) -> TransformFailure {
        TransformFailure::new(id, None, "bad record")
    }

    fn finish(
        store: &SyncStore<&'static str>,
        items: Vec<&'static str>,
        failures: Vec<TransformFailure>,
    ) {
        let outcome = aggregate(&items, &failures);
        store.finish_with_outcome(outcome, items, failures, Utc::now());
    }

    #[test]
    fn begin_is_exclusive() {
        let store: SyncStore<u32> = SyncStore::new();
        assert!(store.try_begin());
        assert!(!store.try_begin());
        assert_eq!(store.status().state, SyncState::Syncing);

        store.finish_with_error(ErrorInfo::new(ErrorCode::UnknownError, "boom"));
        assert!(store.try_begin());
    }

    #[test]
    fn success_replaces_cache() {
        let store = SyncStore::new();
        assert!(store.try_begin());
        finish(&store, vec!["a", "b"], vec![]);

        let status = store.status();
        assert_eq!(status.state, SyncState::Success);
        assert_eq!(status.item_count, Some(2));
        assert!(status.last_synced_at.is_some());
        assert_eq!(store.cached_items(), Some(vec!["a", "b"]));
    }

    #[test]
    fn total_failure_preserves_cache_and_sync_time() {
        let store = SyncStore::new();
        store.try_begin();
        finish(&store, vec!["a"], vec![]);
        let synced_at = store.status().last_synced_at;

        store.try_begin();
        finish(&store, vec![], vec![failure("x"), failure("y")]);

        let status = store.status();
        assert_eq!(status.state, SyncState::Error);
        assert_eq!(status.error_code, Some(ErrorCode::TransformFailed));
        assert_eq!(status.items_synced, Some(0));
        assert_eq!(status.items_failed, Some(2));
        assert_eq!(status.item_count, Some(1));
        assert_eq!(status.last_synced_at, synced_at);
        assert_eq!(store.cached_items(), Some(vec!["a"]));
        assert_eq!(store.last_transform_failures().len(), 2);
    }

    #[test]
    fn error_keeps_counts_and_clears_failures() {
        let store = SyncStore::new();
        store.try_begin();
        finish(&store, vec!["a"], vec![failure("x")]);

        store.try_begin();
        store.finish_with_error(ErrorInfo::new(ErrorCode::ApiUnavailable, "down"));

        let status = store.status();
        assert_eq!(status.state, SyncState::Error);
        assert_eq!(status.error_code, Some(ErrorCode::ApiUnavailable));
        assert_eq!(status.items_synced, Some(1));
        assert_eq!(status.items_failed, Some(1));
        assert!(store.last_transform_failures().is_empty());
        assert_eq!(store.cached_items(), Some(vec!["a"]));
    }

    #[test]
    fn empty_result_is_distinct_from_never_synced() {
        let store: SyncStore<&'static str> = SyncStore::new();
        assert_eq!(store.cached_items(), None);
        assert_eq!(store.status().item_count, None);

        store.try_begin();
        finish(&store, vec![], vec![]);
        assert_eq!(store.cached_items(), Some(vec![]));
        assert_eq!(store.status().item_count, Some(0));
    }

    #[test]
    fn clear_cache_keeps_state() {
        let store = SyncStore::new();
        store.try_begin();
        finish(&store, vec!["a"], vec![failure("x")]);

        store.clear_cache();
        let status = store.status();
        assert_eq!(status.state, SyncState::Partial);
        assert_eq!(status.item_count, None);
        assert_eq!(store.cached_items(), None);
    }

    #[test]
    fn accessors_return_copies() {
        let store = SyncStore::new();
        store.try_begin();
        finish(&store, vec!["a"], vec![failure("x")]);

        let mut status = store.status();
        status.state = SyncState::Idle;
        status.error_message = None;

        let mut items = store.cached_items().unwrap();
        items.push("injected");

        let mut failures = store.last_transform_failures();
        failures.clear();

        assert_eq!(store.status().state, SyncState::Partial);
        assert!(store.status().error_message.is_some());
        assert_eq!(store.cached_items(), Some(vec!["a"]));
        assert_eq!(store.last_transform_failures().len(), 1);
    }
}
