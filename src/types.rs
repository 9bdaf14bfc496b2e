//! Request and response types shared by the gateway, server and client.

use serde::{Deserialize, Serialize};
use touchline_search::SourceCitation;
use uuid::Uuid;

/// Fallback for client metadata that cannot be determined.
pub const UNKNOWN: &str = "unknown";

/// Identifier of an authenticated user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Random identifier for an anonymous request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Fresh random (v4) session id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Who asked: an authenticated user or an anonymous session. Exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Requester {
    User(UserId),
    Anonymous(SessionId),
}

impl Requester {
    /// Anonymous requester with a fresh session id.
    pub fn anonymous() -> Self {
        Self::Anonymous(SessionId::generate())
    }

    /// Authenticated requester.
    pub fn user(id: impl Into<String>) -> Self {
        Self::User(UserId(id.into()))
    }

    /// The user id or session id.
    pub fn key(&self) -> &str {
        match self {
            Self::User(UserId(id)) | Self::Anonymous(SessionId(id)) => id,
        }
    }

    /// User id, when authenticated.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(UserId(id)) => Some(id),
            Self::Anonymous(_) => None,
        }
    }

    /// Session id, when anonymous.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous(SessionId(id)) => Some(id),
            Self::User(_) => None,
        }
    }
}

/// Transport details recorded with each history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub ip_address: String,
    pub user_agent: String,
}

impl Default for ClientMetadata {
    fn default() -> Self {
        Self {
            ip_address: UNKNOWN.to_owned(),
            user_agent: UNKNOWN.to_owned(),
        }
    }
}

/// A validated query plus who asked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub requester: Requester,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, requester: Requester) -> Self {
        Self {
            query: query.into(),
            requester,
        }
    }
}

/// Body accepted by the search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub query: Option<String>,
}

/// The envelope returned for every successful query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub summary: String,
    pub sources: Vec<SourceCitation>,
    /// Echo of the trimmed query.
    pub query: String,
}

/// Error body: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
