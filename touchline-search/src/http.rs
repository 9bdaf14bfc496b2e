//! Shared HTTP plumbing for search provider requests.
//!
//! Provides a configured [`reqwest::Client`] and the status/body handling
//! every provider shares. No custom timeout is set: the transport default
//! applies.

use crate::config::SearchConfig;
use crate::error::SearchError;

/// Longest provider error body kept in [`SearchError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// User-Agent sent when the config does not override it.
pub fn default_user_agent() -> String {
    format!("touchline/{}", env!("CARGO_PKG_VERSION"))
}

/// Build a [`reqwest::Client`] for search provider calls.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => default_user_agent(),
    };

    reqwest::Client::builder()
        .user_agent(ua)
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Turn a provider response into JSON, mapping failures onto [`SearchError`].
///
/// Non-success statuses become [`SearchError::Status`] with a truncated body;
/// a success body that is not JSON becomes [`SearchError::Malformed`].
pub async fn read_json(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<serde_json::Value, SearchError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SearchError::Status {
            provider,
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SearchError::Http(format!("{provider} body read failed: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| SearchError::Malformed(format!("{provider} returned invalid JSON: {e}")))
}

fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
