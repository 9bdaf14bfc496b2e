//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] selects the provider, carries its API key and controls
//! how many ranked results are requested.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::SearchProvider;

/// Upper bound on `max_results`; the summarizer context is built from these.
pub const MAX_RESULTS_LIMIT: usize = 10;

/// Configuration for a web search provider.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Which provider to query.
    pub provider: SearchProvider,
    /// Provider API key. Usually filled from the environment at startup.
    pub api_key: String,
    /// Maximum number of ranked results to request (1..=10).
    pub max_results: usize,
    /// Override for the provider base URL (tests, proxies).
    pub base_url: Option<String>,
    /// Custom User-Agent string. Defaults to `touchline/<version>`.
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProvider::Serper,
            api_key: String::new(),
            max_results: 5,
            base_url: None,
            user_agent: None,
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("provider", &self.provider)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("max_results", &self.max_results)
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl SearchConfig {
    /// Create a config for `provider` with the given key and default limits.
    pub fn new(provider: SearchProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the number of results to request.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// The base URL requests are sent to, without a trailing slash.
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `api_key` must not be blank
    /// - `max_results` must be within `1..=10`
    /// - `base_url`, when set, must be an absolute http(s) URL
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.api_key.trim().is_empty() {
            return Err(SearchError::Config(format!(
                "{} api_key is missing (set {})",
                self.provider,
                self.provider.api_key_env()
            )));
        }
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(SearchError::Config(format!(
                "max_results must be between 1 and {MAX_RESULTS_LIMIT}"
            )));
        }
        if let Some(ref base) = self.base_url {
            let parsed = url::Url::parse(base)
                .map_err(|e| SearchError::Config(format!("invalid base_url {base:?}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SearchError::Config(format!(
                    "base_url must use http or https, got {}",
                    parsed.scheme()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SearchConfig {
        SearchConfig::new(SearchProvider::Serper, "key-123")
    }

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.provider, SearchProvider::Serper);
        assert_eq!(config.max_results, 5);
        assert!(config.api_key.is_empty());
        assert!(config.base_url.is_none());
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn blank_key_rejected() {
        let config = SearchConfig::new(SearchProvider::SerpApi, "   ");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SERPAPI_API_KEY"));
    }

    #[test]
    fn zero_max_results_rejected() {
        let err = valid().with_max_results(0).validate().unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn eleven_max_results_rejected() {
        let err = valid().with_max_results(11).validate().unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn ten_max_results_valid() {
        assert!(valid().with_max_results(10).validate().is_ok());
    }

    #[test]
    fn bad_base_url_rejected() {
        let err = valid().with_base_url("not a url").validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn non_http_base_url_rejected() {
        let err = valid().with_base_url("ftp://example.com").validate().unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn effective_base_url_strips_trailing_slash() {
        let config = valid().with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.effective_base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn effective_base_url_defaults_per_provider() {
        let config = SearchConfig::new(SearchProvider::SerpApi, "k");
        assert_eq!(config.effective_base_url(), "https://serpapi.com");
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("key-123"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn deserializes_from_partial_json() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"provider":"serpapi","max_results":8}"#).expect("parse");
        assert_eq!(config.provider, SearchProvider::SerpApi);
        assert_eq!(config.max_results, 8);
        assert!(config.api_key.is_empty());
    }
}
