//! Error types for the touchline-search crate.
//!
//! Messages are safe to log but are not meant for end users: provider
//! response bodies may appear in [`SearchError::Status`]. API keys never do.

/// Errors that can occur while querying a web search provider.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Invalid search configuration (missing key, bad base URL, ...).
    #[error("config error: {0}")]
    Config(String),

    /// The HTTP request could not be sent or the connection failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered with a non-success status code.
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        /// Provider name, e.g. `"Serper"`.
        provider: &'static str,
        /// Numeric HTTP status.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// The provider answered with success but the body lacked expected fields.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Convenience type alias for touchline-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_config() {
        let err = SearchError::Config("max_results must be > 0".into());
        assert_eq!(err.to_string(), "config error: max_results must be > 0");
    }

    #[test]
    fn display_http() {
        let err = SearchError::Http("connection refused".into());
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn display_status() {
        let err = SearchError::Status {
            provider: "Serper",
            status: 403,
            body: "forbidden".into(),
        };
        assert_eq!(err.to_string(), "Serper returned HTTP 403: forbidden");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
