//! Resolution mode selection.
//!
//! The mode is fixed once at startup from configuration and never derived
//! from request content.

use serde::Serialize;

use crate::config::{GatewayConfig, ModeSelection};
use crate::error::{GatewayError, Result};

/// How a query is turned into a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// One generation call; fixed placeholder sources.
    DirectGeneration,
    /// Web search, then a generation call over the numbered results.
    SearchThenSummarize,
    /// Web search only; the summary is a numbered listing.
    SearchOnly,
    /// One retrieval-augmented generation call returning answer and documents.
    DocumentRetrieval,
}

impl ResolutionMode {
    /// Pick the mode for `config`.
    ///
    /// `auto` prefers retrieval, then search with generation, then search
    /// alone, then generation alone. An explicit mode whose providers are
    /// not configured is rejected.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let has_search = config.search.is_some();
        let has_generation = config.generation.is_some();
        let has_retrieval = config.retrieval.is_some();

        let mode = match config.mode {
            ModeSelection::Auto => {
                if has_retrieval {
                    Self::DocumentRetrieval
                } else if has_search && has_generation {
                    Self::SearchThenSummarize
                } else if has_search {
                    Self::SearchOnly
                } else if has_generation {
                    Self::DirectGeneration
                } else {
                    return Err(GatewayError::Configuration(
                        "no search, generation or retrieval provider configured".into(),
                    ));
                }
            }
            ModeSelection::DirectGeneration => Self::DirectGeneration,
            ModeSelection::SearchThenSummarize => Self::SearchThenSummarize,
            ModeSelection::SearchOnly => Self::SearchOnly,
            ModeSelection::DocumentRetrieval => Self::DocumentRetrieval,
        };

        let missing = match mode {
            Self::DirectGeneration if !has_generation => Some("generation"),
            Self::SearchThenSummarize if !has_search => Some("search"),
            Self::SearchThenSummarize if !has_generation => Some("generation"),
            Self::SearchOnly if !has_search => Some("search"),
            Self::DocumentRetrieval if !has_retrieval => Some("retrieval"),
            _ => None,
        };
        if let Some(section) = missing {
            return Err(GatewayError::Configuration(format!(
                "mode {} requires a [{section}] provider",
                mode.name()
            )));
        }
        Ok(mode)
    }

    /// Stable snake_case name (health output, logs).
    pub fn name(&self) -> &'static str {
        match self {
            Self::DirectGeneration => "direct_generation",
            Self::SearchThenSummarize => "search_then_summarize",
            Self::SearchOnly => "search_only",
            Self::DocumentRetrieval => "document_retrieval",
        }
    }

    /// Whether this mode calls a web search provider.
    pub fn uses_search(&self) -> bool {
        matches!(self, Self::SearchThenSummarize | Self::SearchOnly)
    }

    /// Whether this mode calls a text generation provider.
    pub fn uses_generation(&self) -> bool {
        matches!(self, Self::DirectGeneration | Self::SearchThenSummarize)
    }
}

impl std::fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::{GenerationConfig, GenerationProvider, RetrievalConfig};
    use touchline_search::{SearchConfig, SearchProvider};

    fn search() -> Option<SearchConfig> {
        Some(SearchConfig::new(SearchProvider::Serper, "k"))
    }

    fn generation() -> Option<GenerationConfig> {
        Some(GenerationConfig::new(GenerationProvider::Gemini, "k"))
    }

    fn retrieval() -> Option<RetrievalConfig> {
        Some(RetrievalConfig {
            base_url: "https://flowise.example".into(),
            chatflow_id: "flow".into(),
            api_key: None,
        })
    }

    #[test]
    fn auto_prefers_retrieval() {
        let config = GatewayConfig {
            search: search(),
            generation: generation(),
            retrieval: retrieval(),
            ..Default::default()
        };
        assert_eq!(
            ResolutionMode::from_config(&config).unwrap(),
            ResolutionMode::DocumentRetrieval
        );
    }

    #[test]
    fn auto_combines_search_and_generation() {
        let config = GatewayConfig {
            search: search(),
            generation: generation(),
            ..Default::default()
        };
        assert_eq!(
            ResolutionMode::from_config(&config).unwrap(),
            ResolutionMode::SearchThenSummarize
        );
    }

    #[test]
    fn auto_single_provider_modes() {
        let search_only = GatewayConfig {
            search: search(),
            ..Default::default()
        };
        assert_eq!(
            ResolutionMode::from_config(&search_only).unwrap(),
            ResolutionMode::SearchOnly
        );

        let generation_only = GatewayConfig {
            generation: generation(),
            ..Default::default()
        };
        assert_eq!(
            ResolutionMode::from_config(&generation_only).unwrap(),
            ResolutionMode::DirectGeneration
        );
    }

    #[test]
    fn auto_with_nothing_configured_fails() {
        let err = ResolutionMode::from_config(&GatewayConfig::default()).unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn explicit_mode_overrides_auto_choice() {
        let config = GatewayConfig {
            mode: ModeSelection::SearchOnly,
            search: search(),
            generation: generation(),
            ..Default::default()
        };
        assert_eq!(
            ResolutionMode::from_config(&config).unwrap(),
            ResolutionMode::SearchOnly
        );
    }

    #[test]
    fn explicit_mode_without_providers_fails() {
        let config = GatewayConfig {
            mode: ModeSelection::SearchThenSummarize,
            search: search(),
            ..Default::default()
        };
        let err = ResolutionMode::from_config(&config).unwrap_err();
        assert!(err.message().contains("generation"));

        let config = GatewayConfig {
            mode: ModeSelection::DocumentRetrieval,
            ..Default::default()
        };
        assert!(ResolutionMode::from_config(&config).is_err());
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(ResolutionMode::SearchThenSummarize.to_string(), "search_then_summarize");
        assert_eq!(
            serde_json::to_value(ResolutionMode::DocumentRetrieval).unwrap(),
            serde_json::json!("document_retrieval")
        );
        assert!(ResolutionMode::SearchOnly.uses_search());
        assert!(!ResolutionMode::SearchOnly.uses_generation());
    }
}
