//! CLI command implementations.

pub mod run;
pub mod watch;

use crate::error::CliError;
use crate::fixture::FixtureFetcher;
use crate::http_client::ReqwestClient;
use crate::settings::Settings;
use clap::ValueEnum;
use issuesync_engine::{
    sort_issues, FetchResult, GraphqlFetcher, IssueTransformer, Page, PageFetcher, PageRequest,
    RawIssue, RetryingFetcher, SyncEngine, SyncStatus,
};
use std::path::Path;

/// Output format for status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// One JSON object per report.
    Json,
}

/// Where issues come from.
pub enum IssueSource {
    /// A local fixture file.
    Fixture(FixtureFetcher),
    /// The remote GraphQL API.
    Remote(RetryingFetcher<GraphqlFetcher<ReqwestClient>>),
}

impl PageFetcher for IssueSource {
    type Record = RawIssue;

    fn fetch_page(
        &self,
        collection_id: &str,
        request: &PageRequest,
    ) -> FetchResult<Page<RawIssue>> {
        match self {
            IssueSource::Fixture(f) => f.fetch_page(collection_id, request),
            IssueSource::Remote(f) => f.fetch_page(collection_id, request),
        }
    }
}

/// The engine as wired by the CLI.
pub type Engine = SyncEngine<IssueSource, IssueTransformer>;

/// Builds the engine from resolved settings.
pub fn build_engine(settings: &Settings, fixture: Option<&Path>) -> Result<Engine, CliError> {
    let source = match fixture {
        Some(path) => IssueSource::Fixture(FixtureFetcher::load(path)?),
        None => {
            let client = ReqwestClient::new(settings.request_timeout)?;
            let mut fetcher = GraphqlFetcher::new(settings.endpoint.clone(), client);
            if let Some(key) = &settings.api_key {
                fetcher = fetcher.with_api_key(key.clone());
            } else {
                tracing::warn!("no API key configured; requests will be unauthenticated");
            }
            tracing::info!(endpoint = fetcher.endpoint(), "using remote endpoint");
            IssueSource::Remote(RetryingFetcher::new(fetcher, settings.sync.retry.clone()))
        }
    };

    Ok(SyncEngine::new(settings.sync.clone(), source, IssueTransformer).with_ordering(sort_issues))
}

/// Prints a status report.
pub fn print_status(
    engine: &Engine,
    format: OutputFormat,
    show_items: bool,
) -> Result<(), serde_json::Error> {
    let status = engine.status();
    let failures = engine.last_transform_failures();

    match format {
        OutputFormat::Json => {
            let mut report = serde_json::json!({
                "status": status,
                "failures": failures,
            });
            if show_items {
                report["items"] = serde_json::to_value(engine.cached_items())?;
            }
            println!("{}", serde_json::to_string(&report)?);
        }
        OutputFormat::Text => {
            print_status_text(&status);
            if !failures.is_empty() {
                println!();
                println!("Failed records:");
                for failure in &failures {
                    println!(
                        "  {} ({}): {}",
                        failure.identifier.as_deref().unwrap_or("-"),
                        failure.record_id,
                        failure.error
                    );
                }
            }
            if show_items {
                println!();
                match engine.cached_items() {
                    None => println!("Cache: never populated"),
                    Some(items) => {
                        println!("Cached issues:");
                        for issue in items {
                            let priority = format!("{:?}", issue.priority);
                            println!(
                                "  {:<10} {:<8} {:<14} {}",
                                issue.identifier, priority, issue.state, issue.title
                            );
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_status_text(status: &SyncStatus) {
    let show = |v: Option<usize>| v.map_or_else(|| "-".to_string(), |n| n.to_string());

    println!("State:        {}", status.state.as_str());
    println!(
        "Last synced:  {}",
        status
            .last_synced_at
            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
    );
    println!("Cached items: {}", show(status.item_count));
    println!("Synced:       {}", show(status.items_synced));
    println!("Failed:       {}", show(status.items_failed));
    if let (Some(code), Some(message)) = (&status.error_code, &status.error_message) {
        println!("Error:        [{code}] {message}");
    }
}
