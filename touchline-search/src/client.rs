//! Provider dispatch: one configured client per process.

use crate::config::SearchConfig;
use crate::engine::SearchBackend;
use crate::engines::{SerpApiBackend, SerperBackend};
use crate::error::SearchError;
use crate::http::build_client;
use crate::types::{RawResult, SearchProvider};

/// A validated search provider with its HTTP client.
///
/// Cheap to share behind an `Arc`; the inner [`reqwest::Client`] pools
/// connections across requests.
#[derive(Debug, Clone)]
pub struct SearchClient {
    config: SearchConfig,
    http: reqwest::Client,
}

impl SearchClient {
    /// Validate `config` and build the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid config, or
    /// [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let http = build_client(&config)?;
        Ok(Self { config, http })
    }

    /// The configured provider.
    pub fn provider(&self) -> SearchProvider {
        self.config.provider
    }

    /// The configured default result count.
    pub fn max_results(&self) -> usize {
        self.config.max_results
    }

    /// Query the configured provider for up to `max_results` raw results.
    ///
    /// `max_results` is clamped to `1..=config.max_results`.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`SearchError`]; nothing is retried.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawResult>, SearchError> {
        let limit = max_results.clamp(1, self.config.max_results);
        let outcome = match self.config.provider {
            SearchProvider::Serper => {
                SerperBackend
                    .search(&self.http, query, limit, &self.config)
                    .await
            }
            SearchProvider::SerpApi => {
                SerpApiBackend
                    .search(&self.http, query, limit, &self.config)
                    .await
            }
        };

        match &outcome {
            Ok(results) => {
                tracing::debug!(provider = %self.provider(), count = results.len(), "search provider returned results");
            }
            Err(err) => {
                tracing::warn!(provider = %self.provider(), error = %err, "search provider query failed");
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_config() {
        let err = SearchClient::new(SearchConfig::default()).unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }

    #[test]
    fn new_accepts_valid_config() {
        let client = SearchClient::new(
            SearchConfig::new(SearchProvider::SerpApi, "key").with_max_results(8),
        )
        .expect("valid config");
        assert_eq!(client.provider(), SearchProvider::SerpApi);
        assert_eq!(client.max_results(), 8);
    }

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchClient>();
    }
}
