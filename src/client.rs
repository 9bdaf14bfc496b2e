//! Client for a running gateway, plus the recent-query ring buffer shown by
//! front-ends.

use std::collections::VecDeque;

use serde_json::json;

use crate::error::{GatewayError, QUERY_REQUIRED, Result};
use crate::types::{ErrorBody, SearchResponse};

/// How many recent queries a front-end keeps.
pub const RECENT_QUERY_LIMIT: usize = 10;

/// The last few queries, newest first. Repeats are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentQueries {
    queries: VecDeque<String>,
}

impl RecentQueries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `query` at the front, evicting the oldest entry past the limit.
    pub fn push(&mut self, query: impl Into<String>) {
        self.queries.push_front(query.into());
        self.queries.truncate(RECENT_QUERY_LIMIT);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.queries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// Posts queries to a gateway endpoint.
#[derive(Clone)]
pub struct GatewayClient {
    endpoint: String,
    bearer: Option<String>,
    recent: RecentQueries,
    client: reqwest::Client,
}

impl GatewayClient {
    /// Client for `endpoint` (e.g. `http://127.0.0.1:8787/`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bearer: None,
            recent: RecentQueries::new(),
            client: crate::providers::http_client(),
        }
    }

    /// Send `token` as `Authorization: Bearer` on every request.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Queries sent so far, newest first.
    pub fn recent(&self) -> &RecentQueries {
        &self.recent
    }

    /// Send `query` and decode the envelope.
    ///
    /// Blank queries are rejected locally. Successful queries are added to
    /// [`GatewayClient::recent`].
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidInput`] for a blank query or a 400 reply,
    /// [`GatewayError::UpstreamUnavailable`] when the gateway is unreachable
    /// or returns another error status, [`GatewayError::UpstreamMalformed`]
    /// when the reply is not an envelope.
    pub async fn search(&mut self, query: &str) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GatewayError::InvalidInput(QUERY_REQUIRED.into()));
        }

        let mut request = self.client.post(&self.endpoint).json(&json!({ "query": query }));
        if let Some(ref token) = self.bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            GatewayError::UpstreamUnavailable(format!("gateway request failed: {}", e.without_url()))
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            GatewayError::UpstreamUnavailable(format!("gateway body read failed: {e}"))
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(if status == reqwest::StatusCode::BAD_REQUEST {
                GatewayError::InvalidInput(message)
            } else {
                GatewayError::UpstreamUnavailable(format!("gateway HTTP {}: {message}", status.as_u16()))
            });
        }

        let envelope: SearchResponse = serde_json::from_str(&text).map_err(|e| {
            GatewayError::UpstreamMalformed(format!("gateway reply is not an envelope: {e}"))
        })?;
        self.recent.push(query);
        Ok(envelope)
    }
}
