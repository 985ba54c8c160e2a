//! # issuesync engine
//!
//! Mirrors a remote, paginated issue tracker into an in-memory read cache.
//!
//! This crate provides:
//! - A guarded sync engine (at most one run in flight)
//! - Cursor pagination with a fixed page size
//! - Batch-wide resilient transformation (bad records are data, not errors)
//! - Outcome classification (success / partial / error)
//! - A replace-or-preserve cache policy
//! - A GraphQL page fetcher and a retrying fetcher wrapper
//!
//! ## Run lifecycle
//!
//! ```text
//! idle ──run()──▶ syncing ──▶ success | partial | error
//!                    ▲                    │
//!                    └──────run()─────────┘
//! ```
//!
//! ## Key Invariants
//!
//! - A `run()` that finds another run in flight does nothing
//! - The cache holds the items of the last run that produced at least one
//!   item (or an explicitly empty result)
//! - A run in which every record failed leaves the cache alone
//! - A fetch failure never partially caches what was fetched so far
//! - Readers always receive copies

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod aggregate;
mod classify;
mod config;
mod engine;
mod error;
mod fetcher;
mod graphql;
mod issue;
mod status;
mod store;
mod transform;

pub use aggregate::{aggregate, AggregateOutcome, CacheEffect};
pub use classify::{classify, ErrorInfo, UNKNOWN_ERROR_MESSAGE};
pub use config::{RetryConfig, SyncConfig, COLLECTION_ID_ENV, PAGE_SIZE};
pub use engine::{RunOutcome, SyncEngine};
pub use error::{ErrorCode, FetchError, FetchResult, SyncError, SyncResult};
pub use fetcher::{MockFetcher, Page, PageFetcher, PageInfo, PageRequest, RetryingFetcher};
pub use graphql::{map_http_error, GraphqlFetcher, HttpClient, HttpError, DEFAULT_ENDPOINT};
pub use issue::{sort_issues, Issue, IssueTransformer, Priority, RawIssue, UNKNOWN_RECORD_ID};
pub use status::{SyncState, SyncStatus};
pub use store::SyncStore;
pub use transform::{ItemOrder, RecordTransformer, TransformFailure, TransformOutput};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
