//! SerpAPI, Google engine.
//!
//! `GET {base}/search.json?engine=google&q=..&num=..&api_key=..`. Ranked hits
//! come back in `organic_results[]` as `{title, link, snippet}`.

use crate::config::SearchConfig;
use crate::engine::{SearchBackend, extract_results};
use crate::error::SearchError;
use crate::http::read_json;
use crate::types::{RawResult, SearchProvider};

/// SerpAPI backend.
pub struct SerpApiBackend;

impl SearchBackend for SerpApiBackend {
    async fn search(
        &self,
        client: &reqwest::Client,
        query: &str,
        max_results: usize,
        config: &SearchConfig,
    ) -> Result<Vec<RawResult>, SearchError> {
        let url = format!("{}/search.json", config.effective_base_url());
        let num = max_results.to_string();
        tracing::debug!(query, max_results, "serpapi request");

        let response = client
            .get(&url)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", config.api_key.as_str()),
            ])
            .send()
            .await
            // reqwest errors can embed the URL, which carries the key.
            .map_err(|e| SearchError::Http(format!("SerpAPI request failed: {}", e.without_url())))?;

        let body = read_json(self.provider().name(), response).await?;
        extract_results(self.provider(), &body, "organic_results", max_results)
    }

    fn provider(&self) -> SearchProvider {
        SearchProvider::SerpApi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_is_serpapi() {
        assert_eq!(SerpApiBackend.provider(), SearchProvider::SerpApi);
    }

    #[test]
    fn is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SerpApiBackend>();
    }
}
