//! Page fetcher abstraction for the remote issue tracker.

use crate::config::RetryConfig;
use crate::error::{FetchError, FetchResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::warn;

/// Parameters for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of records to return.
    pub page_size: u32,
    /// Cursor after which the page starts. `None` requests the first page.
    pub after: Option<String>,
}

impl PageRequest {
    /// Creates a new page request.
    pub fn new(page_size: u32, after: Option<String>) -> Self {
        Self { page_size, after }
    }
}

/// Pagination metadata returned with each page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Whether another page follows this one.
    pub has_next_page: bool,
    /// Cursor of the last record in this page.
    pub end_cursor: Option<String>,
}

/// One page of raw records.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    /// Records in remote order.
    pub records: Vec<R>,
    /// Pagination metadata.
    pub page_info: PageInfo,
}

impl<R> Page<R> {
    /// Creates a page that has a successor reachable through `end_cursor`.
    pub fn more(records: Vec<R>, end_cursor: impl Into<String>) -> Self {
        Self {
            records,
            page_info: PageInfo {
                has_next_page: true,
                end_cursor: Some(end_cursor.into()),
            },
        }
    }

    /// Creates the final page.
    pub fn last(records: Vec<R>) -> Self {
        Self {
            records,
            page_info: PageInfo {
                has_next_page: false,
                end_cursor: None,
            },
        }
    }
}

/// A page fetcher pulls raw records from the remote one page at a time.
///
/// Implementations own transport concerns: timeouts, authentication and
/// retries all live behind this trait. The engine only loops.
pub trait PageFetcher: Send + Sync {
    /// Raw record type produced by the remote.
    type Record;

    /// Fetches one page of the given collection.
    fn fetch_page(
        &self,
        collection_id: &str,
        request: &PageRequest,
    ) -> FetchResult<Page<Self::Record>>;
}

/// A scripted fetcher for testing.
///
/// Each call pops the next scripted result. Requests are recorded so tests
/// can check the cursor sequence.
#[derive(Debug)]
pub struct MockFetcher<R> {
    script: Mutex<VecDeque<FetchResult<Page<R>>>>,
    requests: Mutex<Vec<(String, PageRequest)>>,
}

impl<R> MockFetcher<R> {
    /// Creates a mock fetcher with an empty script.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock fetcher that serves the given pages in order.
    pub fn with_pages(pages: Vec<Page<R>>) -> Self {
        let fetcher = Self::new();
        for page in pages {
            fetcher.push_page(page);
        }
        fetcher
    }

    /// Appends a page to the script.
    pub fn push_page(&self, page: Page<R>) {
        self.script.lock().push_back(Ok(page));
    }

    /// Appends an error to the script.
    pub fn push_error(&self, error: FetchError) {
        self.script.lock().push_back(Err(error));
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<(String, PageRequest)> {
        self.requests.lock().clone()
    }

    /// Returns the number of scripted results not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

impl<R> Default for MockFetcher<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Send> PageFetcher for MockFetcher<R> {
    type Record = R;

    fn fetch_page(&self, collection_id: &str, request: &PageRequest) -> FetchResult<Page<R>> {
        self.requests
            .lock()
            .push((collection_id.to_string(), request.clone()));
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Protocol("no mock page scripted".into())))
    }
}

/// Wraps a fetcher and retries transient failures with backoff.
pub struct RetryingFetcher<F> {
    inner: F,
    retry: RetryConfig,
}

impl<F: PageFetcher> RetryingFetcher<F> {
    /// Creates a retrying fetcher.
    pub fn new(inner: F, retry: RetryConfig) -> Self {
        Self { inner, retry }
    }

    /// Returns the wrapped fetcher.
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: PageFetcher> PageFetcher for RetryingFetcher<F> {
    type Record = F::Record;

    fn fetch_page(
        &self,
        collection_id: &str,
        request: &PageRequest,
    ) -> FetchResult<Page<Self::Record>> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.inner.fetch_page(collection_id, request) {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    attempt += 1;
                    let delay = self.retry.wait_before(attempt, e.retry_after());
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "page fetch failed, retrying"
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
