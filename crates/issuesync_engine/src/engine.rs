//! The sync engine: one guarded run at a time, cache replaced or preserved.

use crate::aggregate::aggregate;
use crate::classify::{classify, ErrorInfo};
use crate::config::{normalize, SyncConfig, COLLECTION_ID_ENV, PAGE_SIZE};
use crate::error::{ErrorCode, SyncError, SyncResult};
use crate::fetcher::{PageFetcher, PageRequest};
use crate::status::{SyncState, SyncStatus};
use crate::store::SyncStore;
use crate::transform::{ItemOrder, RecordTransformer, TransformFailure};
use chrono::Utc;
use parking_lot::RwLock;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What a call to [`SyncEngine::run`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run was in flight; nothing happened.
    Skipped,
    /// The run completed and settled in the given state.
    Completed(SyncState),
}

/// Mirrors a remote collection into an in-memory cache.
///
/// The engine is meant to be shared (`Arc<SyncEngine<..>>`) between the
/// scheduler that calls [`run`](Self::run) and the handlers that read
/// status and items. Reads never wait on the remote.
pub struct SyncEngine<F, T>
where
    F: PageFetcher,
    T: RecordTransformer<Record = F::Record>,
{
    config: RwLock<SyncConfig>,
    fetcher: F,
    transformer: T,
    order: ItemOrder<T::Item>,
    store: SyncStore<T::Item>,
}

impl<F, T> SyncEngine<F, T>
where
    F: PageFetcher,
    T: RecordTransformer<Record = F::Record>,
    T::Item: Clone,
{
    /// Creates a new sync engine. Items are cached in transformer order.
    pub fn new(config: SyncConfig, fetcher: F, transformer: T) -> Self {
        Self {
            config: RwLock::new(config),
            fetcher,
            transformer,
            order: Box::new(|items| items),
            store: SyncStore::new(),
        }
    }

    /// Sets the ordering applied to successful items before caching.
    pub fn with_ordering(
        mut self,
        order: impl Fn(Vec<T::Item>) -> Vec<T::Item> + Send + Sync + 'static,
    ) -> Self {
        self.order = Box::new(order);
        self
    }

    /// Replaces the remote collection identifier used by later runs.
    pub fn set_collection_id(&self, collection_id: Option<String>) {
        self.config.write().collection_id = normalize(collection_id);
    }

    /// Returns a copy of the current configuration.
    pub fn config(&self) -> SyncConfig {
        self.config.read().clone()
    }

    /// Returns the fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns the transformer.
    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    /// Performs one sync run.
    ///
    /// Returns [`RunOutcome::Skipped`] immediately if a run is already in
    /// flight. Otherwise the run always settles in a terminal state; errors
    /// are reported through [`status`](Self::status), never returned.
    pub fn run(&self) -> RunOutcome {
        if !self.store.try_begin() {
            warn!("sync already in progress, skipping run");
            return RunOutcome::Skipped;
        }

        let mut guard = RunGuard::new(&self.store);
        let start = Instant::now();

        let state = match self.fetch_all() {
            Ok(records) => self.reconcile(records),
            Err(e) => {
                let error = classify(&e);
                warn!(code = %error.code, error = %error.message, "sync failed");
                self.store.finish_with_error(error);
                SyncState::Error
            }
        };

        guard.disarm();
        info!(
            state = state.as_str(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "sync run finished"
        );
        RunOutcome::Completed(state)
    }

    /// Pulls every page of the configured collection.
    fn fetch_all(&self) -> SyncResult<Vec<F::Record>> {
        let collection_id = self
            .config
            .read()
            .collection_id
            .clone()
            .ok_or(SyncError::MissingConfig {
                key: COLLECTION_ID_ENV,
            })?;

        info!(collection = %collection_id, "sync run started");

        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 0usize;

        loop {
            page += 1;
            let request = PageRequest::new(PAGE_SIZE, cursor.take());
            let response = self.fetcher.fetch_page(&collection_id, &request)?;

            debug!(
                page,
                records = response.records.len(),
                has_next_page = response.page_info.has_next_page,
                "fetched page"
            );
            records.extend(response.records);

            if !response.page_info.has_next_page {
                break;
            }
            cursor = Some(
                response
                    .page_info
                    .end_cursor
                    .ok_or(SyncError::MissingCursor { page })?,
            );
        }

        Ok(records)
    }

    /// Transforms, orders and stores the fetched records.
    fn reconcile(&self, records: Vec<F::Record>) -> SyncState {
        let fetched = records.len();
        let output = self.transformer.transform_all(records);
        let items = (self.order)(output.items);
        let outcome = aggregate(&items, &output.failures);

        if !output.failures.is_empty() {
            log_failures(&output.failures);
        }
        info!(
            fetched,
            synced = outcome.items_synced,
            failed = outcome.items_failed,
            "records transformed"
        );

        let state = outcome.state;
        self.store
            .finish_with_outcome(outcome, items, output.failures, Utc::now());
        state
    }

    /// Returns a copy of the current status.
    pub fn status(&self) -> SyncStatus {
        self.store.status()
    }

    /// Returns a copy of the cached items, or `None` if nothing was ever
    /// cached.
    pub fn cached_items(&self) -> Option<Vec<T::Item>> {
        self.store.cached_items()
    }

    /// Returns the failures recorded by the most recent run.
    pub fn last_transform_failures(&self) -> Vec<TransformFailure> {
        self.store.last_transform_failures()
    }

    /// Drops the cached items without changing the sync state.
    pub fn clear_cache(&self) {
        info!("cache cleared");
        self.store.clear_cache();
    }
}

fn log_failures(failures: &[TransformFailure]) {
    for failure in failures.iter().take(10) {
        debug!(
            record_id = %failure.record_id,
            identifier = failure.identifier.as_deref().unwrap_or("-"),
            error = %failure.error,
            "record failed to transform"
        );
    }
    warn!(count = failures.len(), "some records failed to transform");
}

/// Settles the store in `error` if a run unwinds before finishing.
struct RunGuard<'a, I: Clone> {
    store: &'a SyncStore<I>,
    armed: bool,
}

impl<'a, I: Clone> RunGuard<'a, I> {
    fn new(store: &'a SyncStore<I>) -> Self {
        Self { store, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<I: Clone> Drop for RunGuard<'_, I> {
    fn drop(&mut self) {
        if self.armed {
            self.store.finish_with_error(ErrorInfo::new(
                ErrorCode::UnknownError,
                "sync run aborted",
            ));
        }
    }
}
