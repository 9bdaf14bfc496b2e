//! Trait definition for pluggable search provider backends.
//!
//! Each provider (Serper, SerpAPI) implements [`SearchBackend`] to provide a
//! uniform "fetch raw results" operation.

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::types::{RawResult, SearchProvider};

/// A pluggable search provider backend.
///
/// Implementors handle their provider's:
///
/// - URL and authentication scheme
/// - request body or query-string encoding
/// - location of the ranked results array in the response
///
/// A backend makes exactly one HTTP attempt per call; there is no retry.
pub trait SearchBackend: Send + Sync {
    /// Query the provider and return up to `max_results` raw results in rank order.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Http`] when the request cannot be sent
    /// - [`SearchError::Status`] on a non-success status
    /// - [`SearchError::Malformed`] when the success body has no results array
    fn search(
        &self,
        client: &reqwest::Client,
        query: &str,
        max_results: usize,
        config: &SearchConfig,
    ) -> impl std::future::Future<Output = Result<Vec<RawResult>, SearchError>> + Send;

    /// Returns which [`SearchProvider`] this implementation represents.
    fn provider(&self) -> SearchProvider;
}

/// Pull `key` out of a provider body as an array of [`RawResult`]s.
///
/// A missing or non-array `key` is a malformed response. The result is
/// truncated to `max_results` because not every provider honours `num`.
pub(crate) fn extract_results(
    provider: SearchProvider,
    body: &serde_json::Value,
    key: &str,
    max_results: usize,
) -> Result<Vec<RawResult>, SearchError> {
    let items = body.get(key).and_then(|v| v.as_array()).ok_or_else(|| {
        SearchError::Malformed(format!("{provider} response has no `{key}` array"))
    })?;
    Ok(items
        .iter()
        .take(max_results)
        .map(RawResult::from_value)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A mock backend for testing trait bounds and async execution.
    struct MockBackend {
        results: Vec<RawResult>,
    }

    impl SearchBackend for MockBackend {
        async fn search(
            &self,
            _client: &reqwest::Client,
            _query: &str,
            max_results: usize,
            _config: &SearchConfig,
        ) -> Result<Vec<RawResult>, SearchError> {
            if self.results.is_empty() {
                return Err(SearchError::Malformed("mock backend failure".into()));
            }
            Ok(self.results.iter().take(max_results).cloned().collect())
        }

        fn provider(&self) -> SearchProvider {
            SearchProvider::Serper
        }
    }

    #[test]
    fn mock_backend_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockBackend>();
    }

    #[tokio::test]
    async fn mock_backend_respects_max_results() {
        let backend = MockBackend {
            results: vec![RawResult::default(), RawResult::default(), RawResult::default()],
        };
        let client = reqwest::Client::new();
        let results = backend
            .search(&client, "derby", 2, &SearchConfig::default())
            .await
            .expect("should succeed");
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn mock_backend_propagates_errors() {
        let backend = MockBackend { results: vec![] };
        let client = reqwest::Client::new();
        let err = backend
            .search(&client, "derby", 5, &SearchConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Malformed(_)));
    }

    #[test]
    fn extract_results_reads_array() {
        let body = json!({"organic": [{"title": "A", "link": "https://a.com", "snippet": "a"}]});
        let results = extract_results(SearchProvider::Serper, &body, "organic", 5).expect("ok");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn extract_results_truncates() {
        let body = json!({"organic": [{}, {}, {}, {}]});
        let results = extract_results(SearchProvider::Serper, &body, "organic", 3).expect("ok");
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn extract_results_missing_key_is_malformed() {
        let body = json!({"searchParameters": {}});
        let err = extract_results(SearchProvider::Serper, &body, "organic", 5).unwrap_err();
        assert!(matches!(err, SearchError::Malformed(_)));
        assert!(err.to_string().contains("organic"));
    }

    #[test]
    fn extract_results_empty_array_is_ok() {
        let body = json!({"organic_results": []});
        let results =
            extract_results(SearchProvider::SerpApi, &body, "organic_results", 5).expect("ok");
        assert!(results.is_empty());
    }
}
