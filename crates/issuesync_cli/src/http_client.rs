//! Blocking `reqwest` implementation of the engine's HTTP client.

use issuesync_engine::{HttpClient, HttpError};
use reqwest::blocking::Client;
use reqwest::header::RETRY_AFTER;
use std::time::Duration;

/// Keep error bodies short in logs and status messages.
const MAX_ERROR_BODY: usize = 512;

/// HTTP client backed by `reqwest::blocking`.
///
/// Must be created and dropped outside of an async context.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Creates a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("issuesync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<Vec<u8>, HttpError> {
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::Connect(e.to_string())
            }
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        let bytes = response
            .bytes()
            .map_err(|e| HttpError::Connect(e.to_string()))?;

        if status.is_success() {
            Ok(bytes.to_vec())
        } else {
            let mut body = String::from_utf8_lossy(&bytes).into_owned();
            truncate(&mut body, MAX_ERROR_BODY);
            Err(HttpError::Status {
                code: status.as_u16(),
                body,
                retry_after,
            })
        }
    }
}

/// Parses the delta-seconds form of `Retry-After`.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn truncate(body: &mut String, max: usize) {
    if body.len() > max {
        let mut cut = max;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
}
