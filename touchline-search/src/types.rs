//! Core types: provider identification, raw provider results, citations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported web search providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    /// Serper.dev Google Search API.
    Serper,
    /// SerpAPI Google engine.
    SerpApi,
}

impl SearchProvider {
    /// Returns the human-readable name of this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Serper => "Serper",
            Self::SerpApi => "SerpAPI",
        }
    }

    /// Returns the public API base URL used when none is configured.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Serper => "https://google.serper.dev",
            Self::SerpApi => "https://serpapi.com",
        }
    }

    /// Environment variable conventionally holding this provider's key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Serper => "SERPER_API_KEY",
            Self::SerpApi => "SERPAPI_API_KEY",
        }
    }

    /// Returns all provider variants.
    pub fn all() -> &'static [SearchProvider] {
        &[Self::Serper, Self::SerpApi]
    }
}

impl fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One ranked hit as the provider sent it. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    pub title: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

impl RawResult {
    /// Extract a raw result from an arbitrary JSON object.
    ///
    /// Reads `title`, `link` (falling back to `url`) and `snippet`. Non-string
    /// values are treated as missing; this never fails.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        };
        Self {
            title: text("title"),
            url: text("link").or_else(|| text("url")),
            snippet: text("snippet"),
        }
    }
}

/// A `{title, url, snippet}` record shown to the user as evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SourceCitation {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}
