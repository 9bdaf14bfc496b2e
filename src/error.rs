//! Error types for the Touchline gateway.
//!
//! Each variant carries a stable error code (SCREAMING_SNAKE_CASE) that is
//! included in the Display output and accessible via [`GatewayError::code()`].
//! Display text is for logs. Clients only ever see
//! [`GatewayError::client_message()`], which never contains provider output.

use axum::http::StatusCode;
use touchline_search::SearchError;

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// The query was empty or missing.
    pub const INVALID_INPUT: &str = "INVALID_INPUT";

    /// A credential or endpoint required by the active mode is missing or invalid.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// A provider call failed at the transport or HTTP status level.
    pub const UPSTREAM_UNAVAILABLE: &str = "UPSTREAM_UNAVAILABLE";

    /// A provider answered successfully without the expected fields.
    pub const UPSTREAM_MALFORMED: &str = "UPSTREAM_MALFORMED";

    /// Writing search history failed.
    pub const PERSISTENCE_FAILED: &str = "PERSISTENCE_FAILED";
}

/// Message returned to clients for empty queries.
pub const QUERY_REQUIRED: &str = "Query is required";

/// Errors produced while resolving a query.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The query was empty or missing.
    #[error("[{}] {}", error_codes::INVALID_INPUT, .0)]
    InvalidInput(String),

    /// Required configuration is missing or invalid.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    Configuration(String),

    /// A provider call failed (transport error or non-success status).
    #[error("[{}] {}", error_codes::UPSTREAM_UNAVAILABLE, .0)]
    UpstreamUnavailable(String),

    /// A provider returned success without the expected fields.
    #[error("[{}] {}", error_codes::UPSTREAM_MALFORMED, .0)]
    UpstreamMalformed(String),

    /// History persistence failed. Never surfaced to HTTP callers.
    #[error("[{}] {}", error_codes::PERSISTENCE_FAILED, .0)]
    Persistence(String),
}

impl GatewayError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => error_codes::INVALID_INPUT,
            Self::Configuration(_) => error_codes::CONFIG_INVALID,
            Self::UpstreamUnavailable(_) => error_codes::UPSTREAM_UNAVAILABLE,
            Self::UpstreamMalformed(_) => error_codes::UPSTREAM_MALFORMED,
            Self::Persistence(_) => error_codes::PERSISTENCE_FAILED,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(m)
            | Self::Configuration(m)
            | Self::UpstreamUnavailable(m)
            | Self::UpstreamMalformed(m)
            | Self::Persistence(m) => m,
        }
    }

    /// HTTP status used when this error ends a request.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Generic, human-readable message safe to send to clients.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => QUERY_REQUIRED,
            Self::Configuration(_) => "Search service is not configured",
            Self::UpstreamUnavailable(_) => "Failed to get a response from the search provider",
            Self::UpstreamMalformed(_) => {
                "Received an unexpected response from the search provider"
            }
            Self::Persistence(_) => "Internal server error",
        }
    }
}

impl From<SearchError> for GatewayError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Config(m) => Self::Configuration(m),
            SearchError::Malformed(m) => Self::UpstreamMalformed(m),
            other @ (SearchError::Http(_) | SearchError::Status { .. }) => {
                Self::UpstreamUnavailable(other.to_string())
            }
        }
    }
}

/// Convenience alias for gateway results.
pub type Result<T> = std::result::Result<T, GatewayError>;
