//! GraphQL page fetcher for the remote issue tracker.
//!
//! The HTTP client itself is abstracted behind [`HttpClient`] so the
//! fetcher can run over any library (or a test double).

use crate::error::{FetchError, FetchResult};
use crate::fetcher::{Page, PageFetcher, PageInfo, PageRequest};
use crate::issue::RawIssue;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Default GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.linear.app/graphql";

const TEAM_ISSUES_QUERY: &str = r#"query TeamIssues($teamId: String!, $first: Int!, $after: String) {
  team(id: $teamId) {
    issues(first: $first, after: $after) {
      nodes {
        id
        identifier
        title
        priority
        updatedAt
        state { name }
        assignee { name }
        labels { nodes { name } }
      }
      pageInfo { hasNextPage endCursor }
    }
  }
}"#;

/// Transport-level failure reported by an [`HttpClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("HTTP {code}: {body}")]
    Status {
        /// Status code.
        code: u16,
        /// Response body, possibly truncated.
        body: String,
        /// Parsed `Retry-After` header.
        retry_after: Option<Duration>,
    },
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport.
pub trait HttpClient: Send + Sync {
    /// Sends a JSON POST request and returns the response body.
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<Vec<u8>, HttpError>;
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<TeamData>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TeamData {
    team: Option<TeamNode>,
}

#[derive(Debug, Deserialize)]
struct TeamNode {
    issues: IssueConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueConnection {
    nodes: Vec<RawIssue>,
    page_info: RemotePageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemotePageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

/// Fetches team issues page by page over GraphQL.
pub struct GraphqlFetcher<C: HttpClient> {
    endpoint: String,
    api_key: Option<String>,
    client: C,
}

impl<C: HttpClient> GraphqlFetcher<C> {
    /// Creates a fetcher for the given endpoint.
    pub fn new(endpoint: impl Into<String>, client: C) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            client,
        }
    }

    /// Sets the API key sent in the `Authorization` header.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn decode(&self, body: &[u8]) -> FetchResult<Page<RawIssue>> {
        let response: GraphqlResponse = serde_json::from_slice(body)
            .map_err(|e| FetchError::Protocol(format!("failed to decode response: {e}")))?;

        if !response.errors.is_empty() {
            let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(FetchError::Protocol(messages.join("; ")));
        }

        let team = response
            .data
            .ok_or_else(|| FetchError::Protocol("response has no data".into()))?
            .team
            .ok_or_else(|| FetchError::Protocol("collection not found".into()))?;

        Ok(Page {
            records: team.issues.nodes,
            page_info: PageInfo {
                has_next_page: team.issues.page_info.has_next_page,
                end_cursor: team.issues.page_info.end_cursor,
            },
        })
    }
}

impl<C: HttpClient> PageFetcher for GraphqlFetcher<C> {
    type Record = RawIssue;

    fn fetch_page(
        &self,
        collection_id: &str,
        request: &PageRequest,
    ) -> FetchResult<Page<RawIssue>> {
        let body = json!({
            "query": TEAM_ISSUES_QUERY,
            "variables": {
                "teamId": collection_id,
                "first": request.page_size,
                "after": request.after,
            }
        });
        let body = serde_json::to_vec(&body)
            .map_err(|e| FetchError::Protocol(format!("failed to encode request: {e}")))?;

        let mut headers = vec![("Content-Type", "application/json")];
        if let Some(key) = self.api_key.as_deref() {
            headers.push(("Authorization", key));
        }

        let response = self
            .client
            .post_json(&self.endpoint, &headers, body)
            .map_err(map_http_error)?;

        self.decode(&response)
    }
}

/// Maps transport failures onto the fetch error vocabulary.
pub fn map_http_error(error: HttpError) -> FetchError {
    match error {
        HttpError::Connect(message) => FetchError::Unavailable { message },
        HttpError::Timeout => FetchError::unavailable("request timed out"),
        HttpError::Status { code, body, .. } if (502..=504).contains(&code) => {
            FetchError::unavailable(format!("remote unavailable (HTTP {code}): {body}"))
        }
        HttpError::Status {
            code: 401 | 403,
            body,
            ..
        } => FetchError::Unauthorized { message: body },
        HttpError::Status {
            code: 429,
            body,
            retry_after,
        } => FetchError::RateLimited {
            message: body,
            retry_after,
        },
        HttpError::Status { code, body, .. } => FetchError::other(format!("HTTP {code}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct TestClient {
        response: Mutex<Option<Result<Vec<u8>, HttpError>>>,
        last_request: Mutex<Option<(String, Vec<(String, String)>, serde_json::Value)>>,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                response: Mutex::new(None),
                last_request: Mutex::new(None),
            }
        }

        fn respond(&self, response: Result<serde_json::Value, HttpError>) {
            *self.response.lock() = Some(response.map(|v| serde_json::to_vec(&v).unwrap()));
        }
    }

    impl HttpClient for TestClient {
        fn post_json(
            &self,
            url: &str,
            headers: &[(&str, &str)],
            body: Vec<u8>,
        ) -> Result<Vec<u8>, HttpError> {
            let headers: Vec<(String, String)> = headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
            *self.last_request.lock() = Some((url.to_string(), headers, body));
            self.response
                .lock()
                .clone()
                .unwrap_or_else(|| Err(HttpError::Connect("no response set".into())))
        }
    }

    fn issues_page(
        nodes: serde_json::Value,
        has_next_page: bool,
        end_cursor: Option<&str>,
    ) -> serde_json::Value {
        json!({
            "data": {
                "team": {
                    "issues": {
                        "nodes": nodes,
                        "pageInfo": { "hasNextPage": has_next_page, "endCursor": end_cursor }
                    }
                }
            }
        })
    }

    #[test]
    fn sends_query_with_cursor_and_key() {
        let client = TestClient::new();
        client.respond(Ok(issues_page(json!([]), false, None)));
        let fetcher = GraphqlFetcher::new(DEFAULT_ENDPOINT, client).with_api_key("lin_api_123");

        fetcher
            .fetch_page("team-1", &PageRequest::new(50, Some("cur".into())))
            .unwrap();

        let (url, headers, body) = fetcher.client.last_request.lock().clone().unwrap();
        assert_eq!(url, DEFAULT_ENDPOINT);
        assert!(headers.contains(&("Authorization".to_string(), "lin_api_123".to_string())));
        assert_eq!(body["variables"]["teamId"], "team-1");
        assert_eq!(body["variables"]["first"], 50);
        assert_eq!(body["variables"]["after"], "cur");
    }

    #[test]
    fn decodes_nodes_and_page_info() {
        let client = TestClient::new();
        client.respond(Ok(issues_page(
            json!([{ "id": "i-1", "identifier": "ENG-1" }, { "id": "i-2" }]),
            true,
            Some("c-2"),
        )));
        let fetcher = GraphqlFetcher::new(DEFAULT_ENDPOINT, client);

        let page = fetcher.fetch_page("team-1", &PageRequest::new(50, None)).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].identifier(), Some("ENG-1"));
        assert!(page.page_info.has_next_page);
        assert_eq!(page.page_info.end_cursor.as_deref(), Some("c-2"));
    }

    #[test]
    fn graphql_errors_are_protocol_errors() {
        let client = TestClient::new();
        client.respond(Ok(json!({ "errors": [{ "message": "Argument teamId is invalid" }] })));
        let fetcher = GraphqlFetcher::new(DEFAULT_ENDPOINT, client);

        let err = fetcher.fetch_page("x", &PageRequest::new(50, None)).unwrap_err();
        assert_eq!(err, FetchError::Protocol("Argument teamId is invalid".into()));
    }

    #[test]
    fn unknown_team_is_reported() {
        let client = TestClient::new();
        client.respond(Ok(json!({ "data": { "team": null } })));
        let fetcher = GraphqlFetcher::new(DEFAULT_ENDPOINT, client);

        let err = fetcher.fetch_page("x", &PageRequest::new(50, None)).unwrap_err();
        assert_eq!(err, FetchError::Protocol("collection not found".into()));
    }

    #[test]
    fn transport_errors_map_to_unavailable() {
        let client = TestClient::new();
        client.respond(Err(HttpError::Connect("dns error".into())));
        let fetcher = GraphqlFetcher::new(DEFAULT_ENDPOINT, client);

        let err = fetcher.fetch_page("x", &PageRequest::new(50, None)).unwrap_err();
        assert_eq!(err, FetchError::unavailable("dns error"));
    }

    #[test]
    fn status_code_mapping() {
        let status = |code: u16| HttpError::Status {
            code,
            body: "nope".into(),
            retry_after: Some(Duration::from_secs(7)),
        };

        assert!(matches!(map_http_error(HttpError::Timeout), FetchError::Unavailable { .. }));
        assert!(matches!(map_http_error(status(503)), FetchError::Unavailable { .. }));
        assert!(matches!(map_http_error(status(401)), FetchError::Unauthorized { .. }));
        assert!(matches!(map_http_error(status(403)), FetchError::Unauthorized { .. }));
        assert_eq!(
            map_http_error(status(429)).retry_after(),
            Some(Duration::from_secs(7))
        );
        assert_eq!(map_http_error(status(500)), FetchError::other("HTTP 500: nope"));
    }
}
