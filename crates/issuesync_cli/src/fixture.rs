//! Serves pages from a local JSON file instead of the remote API.

use crate::error::CliError;
use issuesync_engine::{FetchError, FetchResult, Page, PageFetcher, PageInfo, PageRequest, RawIssue};
use serde::Deserialize;
use std::path::Path;

/// One page in a fixture file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixturePage {
    /// Issue nodes.
    pub nodes: Vec<RawIssue>,
    /// Cursor of the last node. Required on every page but the last.
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// Page fetcher over a fixture file: a JSON array of pages.
///
/// The first request gets the first page; a request after cursor `c`
/// gets the page that follows the page whose `endCursor` is `c`.
#[derive(Debug)]
pub struct FixtureFetcher {
    pages: Vec<FixturePage>,
}

impl FixtureFetcher {
    /// Creates a fetcher over in-memory pages.
    pub fn new(pages: Vec<FixturePage>) -> Self {
        Self { pages }
    }

    /// Loads a fixture file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let pages = serde_json::from_str(&contents).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(pages))
    }
}

impl PageFetcher for FixtureFetcher {
    type Record = RawIssue;

    fn fetch_page(
        &self,
        _collection_id: &str,
        request: &PageRequest,
    ) -> FetchResult<Page<RawIssue>> {
        let index = match request.after.as_deref() {
            None => 0,
            Some(cursor) => self
                .pages
                .iter()
                .position(|p| p.end_cursor.as_deref() == Some(cursor))
                .map(|i| i + 1)
                .ok_or_else(|| FetchError::Protocol(format!("unknown cursor {cursor:?}")))?,
        };

        let Some(page) = self.pages.get(index) else {
            return Ok(Page::last(Vec::new()));
        };

        let has_next_page = index + 1 < self.pages.len();
        Ok(Page {
            records: page.nodes.clone(),
            page_info: PageInfo {
                has_next_page,
                end_cursor: page.end_cursor.clone(),
            },
        })
    }
}
