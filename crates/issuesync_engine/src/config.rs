//! Configuration for the sync engine.

use rand::Rng;
use std::time::Duration;

/// Environment variable holding the remote collection identifier.
pub const COLLECTION_ID_ENV: &str = "ISSUESYNC_COLLECTION_ID";

/// Number of records requested per page.
///
/// Fixed to stay well inside the remote's rate limits.
pub const PAGE_SIZE: u32 = 50;

/// Configuration for sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Identifier of the remote collection (team, project) to mirror.
    pub collection_id: Option<String>,
    /// Retry configuration for the page fetcher.
    pub retry: RetryConfig,
    /// Interval for scheduled runs.
    pub sync_interval: Option<Duration>,
}

impl SyncConfig {
    /// Creates a configuration for the given collection.
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: normalize(Some(collection_id.into())),
            ..Self::default()
        }
    }

    /// Reads the collection identifier from the environment.
    ///
    /// A missing or blank variable leaves the collection unset; the engine
    /// reports that as a configuration error when it runs.
    pub fn from_env() -> Self {
        Self {
            collection_id: normalize(std::env::var(COLLECTION_ID_ENV).ok()),
            ..Self::default()
        }
    }

    /// Sets the collection identifier.
    pub fn with_collection_id(mut self, collection_id: Option<String>) -> Self {
        self.collection_id = normalize(collection_id);
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the interval for scheduled runs.
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }
}

pub(crate) fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// How the retrying fetcher waits between attempts at one page.
///
/// Waits double from `initial_delay` on each retry. Every wait, including
/// one requested by the remote through `Retry-After`, is capped at
/// `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per page, the first one included.
    pub max_attempts: u32,
    /// Wait before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single wait.
    pub max_delay: Duration,
    /// Shorten each wait by up to a quarter at random.
    pub jitter: bool,
}

impl RetryConfig {
    /// Creates a policy with `max_attempts` attempts and default waits.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }

    /// Sets the wait before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the cap on any single wait.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Backoff before retry number `retry` (1 for the first retry).
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.checked_pow(retry - 1).unwrap_or(u32::MAX);
        let delay = self.initial_delay.saturating_mul(factor).min(self.max_delay);

        if self.jitter {
            delay.mul_f64(rand::thread_rng().gen_range(0.75..=1.0))
        } else {
            delay
        }
    }

    /// Wait before retry number `retry`, honouring the remote's hint.
    ///
    /// The longer of the backoff and `retry_after` wins, capped at
    /// `max_delay`.
    pub fn wait_before(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = self.backoff(retry);
        retry_after
            .map_or(backoff, |hint| hint.max(backoff))
            .min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}
