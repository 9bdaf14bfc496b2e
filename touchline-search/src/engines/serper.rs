//! Serper.dev Google Search API.
//!
//! `POST {base}/search` with an `X-API-KEY` header and a `{q, num}` JSON
//! body. Ranked hits come back in `organic[]` as `{title, link, snippet}`.

use crate::config::SearchConfig;
use crate::engine::{SearchBackend, extract_results};
use crate::error::SearchError;
use crate::http::read_json;
use crate::types::{RawResult, SearchProvider};

/// Serper.dev backend.
pub struct SerperBackend;

impl SearchBackend for SerperBackend {
    async fn search(
        &self,
        client: &reqwest::Client,
        query: &str,
        max_results: usize,
        config: &SearchConfig,
    ) -> Result<Vec<RawResult>, SearchError> {
        let url = format!("{}/search", config.effective_base_url());
        tracing::debug!(query, max_results, "serper request");

        let response = client
            .post(&url)
            .header("X-API-KEY", &config.api_key)
            .json(&serde_json::json!({ "q": query, "num": max_results }))
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("Serper request failed: {e}")))?;

        let body = read_json(self.provider().name(), response).await?;
        extract_results(self.provider(), &body, "organic", max_results)
    }

    fn provider(&self) -> SearchProvider {
        SearchProvider::Serper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_is_serper() {
        assert_eq!(SerperBackend.provider(), SearchProvider::Serper);
    }

    #[test]
    fn is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SerperBackend>();
    }
}
