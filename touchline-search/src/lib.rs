//! # touchline-search
//!
//! Web search provider clients and citation normalisation for Touchline.
//!
//! ## Design
//!
//! - One configured provider per process (Serper or SerpAPI), chosen by
//!   [`SearchConfig`] and dispatched through [`SearchClient`]
//! - A single HTTP attempt per query: no retries, no custom timeout
//! - Provider payloads are reduced to [`RawResult`]s, then normalised into
//!   [`SourceCitation`]s by the total functions in [`normalize`]
//!
//! ## Security
//!
//! - API keys come from configuration only and are redacted from `Debug`
//! - Search queries are logged at debug level only

pub mod client;
pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod http;
pub mod normalize;
pub mod types;

pub use client::SearchClient;
pub use config::SearchConfig;
pub use engine::SearchBackend;
pub use error::{Result, SearchError};
pub use types::{RawResult, SearchProvider, SourceCitation};

/// Search with `config` and return normalised citations.
///
/// Convenience wrapper that builds a one-off [`SearchClient`]. Long-running
/// callers should build the client once and reuse it.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid config and otherwise
/// whatever the provider call produced.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> touchline_search::Result<()> {
/// let config = touchline_search::SearchConfig::new(
///     touchline_search::SearchProvider::Serper,
///     std::env::var("SERPER_API_KEY").unwrap_or_default(),
/// );
/// let citations = touchline_search::search("Arsenal injury news", &config).await?;
/// for citation in &citations {
///     println!("{}: {}", citation.title, citation.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(query: &str, config: &SearchConfig) -> Result<Vec<SourceCitation>> {
    let client = SearchClient::new(config.clone())?;
    let raw = client.search(query, config.max_results).await?;
    Ok(normalize::normalize_results(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_validates_config_missing_key() {
        let result = search("test", &SearchConfig::default()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("api_key"));
    }

    #[tokio::test]
    async fn search_validates_config_zero_max_results() {
        let config = SearchConfig::new(SearchProvider::Serper, "k").with_max_results(0);
        let result = search("test", &config).await;
        assert!(result.unwrap_err().to_string().contains("max_results"));
    }
}
