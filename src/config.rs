//! Configuration types for the Touchline gateway.
//!
//! A [`GatewayConfig`] is built once at process start: an optional TOML file,
//! then environment secrets overlaid by [`GatewayConfig::apply_env`], then
//! [`GatewayConfig::validate`]. Request handling never reads the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use touchline_search::{SearchConfig, SearchProvider};

use crate::error::{GatewayError, Result};

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Which resolution mode to run (`auto` picks from configured providers).
    pub mode: ModeSelection,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Web search provider. `None` when no search provider is wired.
    pub search: Option<SearchConfig>,
    /// Text generation provider. `None` when no LLM is wired.
    pub generation: Option<GenerationConfig>,
    /// Retrieval-augmented generation endpoint.
    pub retrieval: Option<RetrievalConfig>,
    /// Search history persistence.
    pub history: HistoryConfig,
    /// Resolution of bearer tokens to user ids.
    pub identity: IdentityConfig,
}

// ---------------------------------------------------------------------------
// Mode selection
// ---------------------------------------------------------------------------

/// Requested resolution mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSelection {
    /// Pick the richest mode the configured providers allow.
    #[default]
    Auto,
    /// Single LLM call, placeholder sources.
    DirectGeneration,
    /// Search, then summarize the results with an LLM.
    SearchThenSummarize,
    /// Search only, numbered listing as the summary.
    SearchOnly,
    /// Retrieval-augmented generation endpoint.
    DocumentRetrieval,
}

impl FromStr for ModeSelection {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(Self::Auto),
            "direct_generation" => Ok(Self::DirectGeneration),
            "search_then_summarize" => Ok(Self::SearchThenSummarize),
            "search_only" => Ok(Self::SearchOnly),
            "document_retrieval" => Ok(Self::DocumentRetrieval),
            other => Err(GatewayError::Configuration(format!(
                "unknown mode {other:?}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Listen port (`0` = OS-assigned).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8787,
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Supported text generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    /// Google Gemini `generateContent`.
    Gemini,
    /// OpenAI Chat Completions.
    OpenAi,
    /// Cohere `generate`.
    Cohere,
}

impl GenerationProvider {
    /// Human-readable provider name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAi => "OpenAI",
            Self::Cohere => "Cohere",
        }
    }

    /// Public API base URL used when none is configured.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::OpenAi => "https://api.openai.com",
            Self::Cohere => "https://api.cohere.ai",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-1.5-flash",
            Self::OpenAi => "gpt-4o-mini",
            Self::Cohere => "command",
        }
    }

    /// Environment variable conventionally holding this provider's key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Cohere => "COHERE_API_KEY",
        }
    }

    /// All providers, in environment auto-detection order.
    pub fn all() -> &'static [GenerationProvider] {
        &[Self::Gemini, Self::OpenAi, Self::Cohere]
    }
}

impl std::fmt::Display for GenerationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Sampling temperature (0.0–2.0).
    pub temperature: f64,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Nucleus sampling threshold (0.0–1.0).
    pub top_p: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
            top_p: 0.95,
        }
    }
}

impl SamplingConfig {
    /// Reject out-of-range sampling values.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GatewayError::Configuration(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(GatewayError::Configuration(
                "top_p must be between 0.0 and 1.0".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(GatewayError::Configuration(
                "max_tokens must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Text generation provider configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Which provider to call.
    pub provider: GenerationProvider,
    /// Provider API key. Usually filled from the environment.
    #[serde(default)]
    pub api_key: String,
    /// Model override (provider default when unset).
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL override (tests, proxies).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Sampling parameters.
    #[serde(default)]
    pub sampling: SamplingConfig,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider)
            .field("api_key", &redacted(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("sampling", &self.sampling)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a config for `provider` with defaults for everything else.
    pub fn new(provider: GenerationProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: None,
            base_url: None,
            sampling: SamplingConfig::default(),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Model to request.
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Base URL requests are sent to, without a trailing slash.
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Reject a missing key, bad base URL or out-of-range sampling.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(GatewayError::Configuration(format!(
                "{} api_key is missing (set {})",
                self.provider,
                self.provider.api_key_env()
            )));
        }
        if let Some(ref base) = self.base_url {
            validate_http_url("generation.base_url", base)?;
        }
        self.sampling.validate()
    }
}

// ---------------------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------------------

/// Flowise retrieval-augmented generation endpoint.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Flowise instance base URL.
    pub base_url: String,
    /// Chatflow id used in `/api/v1/prediction/{id}`.
    pub chatflow_id: String,
    /// Optional bearer key for protected chatflows.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for RetrievalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalConfig")
            .field("base_url", &self.base_url)
            .field("chatflow_id", &self.chatflow_id)
            .field("api_key", &redacted(self.api_key.as_deref().unwrap_or("")))
            .finish()
    }
}

impl RetrievalConfig {
    /// Reject a missing base URL or chatflow id.
    pub fn validate(&self) -> Result<()> {
        validate_http_url("retrieval.base_url", &self.base_url)?;
        if self.chatflow_id.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "retrieval.chatflow_id is missing (set FLOWISE_CHATFLOW_ID)".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Where search history is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryBackend {
    /// History is discarded.
    #[default]
    None,
    /// Local SQLite database file.
    Sqlite,
    /// Supabase PostgREST tables.
    Supabase,
}

/// Search history persistence configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Which sink to write to.
    pub backend: HistoryBackend,
    /// SQLite database path (default: platform data dir).
    pub path: Option<PathBuf>,
    /// Supabase project URL.
    pub url: Option<String>,
    /// Supabase service-role key.
    pub api_key: String,
    /// Records queued for the background writer before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::None,
            path: None,
            url: None,
            api_key: String::new(),
            queue_capacity: 256,
        }
    }
}

impl std::fmt::Debug for HistoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryConfig")
            .field("backend", &self.backend)
            .field("path", &self.path)
            .field("url", &self.url)
            .field("api_key", &redacted(&self.api_key))
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

impl HistoryConfig {
    /// SQLite path, falling back to `{data_dir}/touchline/history.db`.
    pub fn effective_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("touchline"))
                .unwrap_or_else(|| PathBuf::from("."))
                .join("history.db")
        })
    }

    /// Reject an unusable sink configuration.
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(GatewayError::Configuration(
                "history.queue_capacity must be greater than 0".into(),
            ));
        }
        if self.backend == HistoryBackend::Supabase {
            let url = self.url.as_deref().unwrap_or_default();
            validate_http_url("history.url", url)?;
            if self.api_key.trim().is_empty() {
                return Err(GatewayError::Configuration(
                    "history.api_key is missing (set SUPABASE_SERVICE_ROLE_KEY)".into(),
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// How bearer tokens are turned into user ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProviderKind {
    /// Every request is anonymous.
    #[default]
    None,
    /// Supabase Auth `GET /auth/v1/user`.
    Supabase,
}

/// Identity provider configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Which identity provider to ask.
    pub provider: IdentityProviderKind,
    /// Supabase project URL.
    pub url: Option<String>,
    /// Supabase anon (public) key sent as `apikey`.
    pub anon_key: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("anon_key", &redacted(&self.anon_key))
            .finish()
    }
}

impl IdentityConfig {
    /// Reject a Supabase resolver without URL or key.
    pub fn validate(&self) -> Result<()> {
        if self.provider == IdentityProviderKind::Supabase {
            validate_http_url("identity.url", self.url.as_deref().unwrap_or_default())?;
            if self.anon_key.trim().is_empty() {
                return Err(GatewayError::Configuration(
                    "identity.anon_key is missing (set SUPABASE_ANON_KEY)".into(),
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| GatewayError::Configuration(format!("invalid {}: {e}", path.display())))
    }

    /// Build the startup configuration: optional file, then process
    /// environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay secrets and endpoints from environment-style variables.
    ///
    /// `lookup` is `std::env::var` in the binaries and a map in tests.
    /// `TOUCHLINE_MODE`, `TOUCHLINE_HOST` and `TOUCHLINE_PORT` override the
    /// file. Secrets and provider endpoints only fill values the file left
    /// empty. Blank variables are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(mode) = get("TOUCHLINE_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(host) = get("TOUCHLINE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("TOUCHLINE_PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                GatewayError::Configuration(format!("TOUCHLINE_PORT is not a port: {port:?}"))
            })?;
        }

        match self.search {
            Some(ref mut search) if search.api_key.trim().is_empty() => {
                if let Some(key) = get(search.provider.api_key_env()) {
                    search.api_key = key;
                }
            }
            Some(_) => {}
            None => {
                self.search = SearchProvider::all().iter().find_map(|provider| {
                    get(provider.api_key_env()).map(|key| SearchConfig::new(*provider, key))
                });
            }
        }

        match self.generation {
            Some(ref mut generation) if generation.api_key.trim().is_empty() => {
                if let Some(key) = get(generation.provider.api_key_env()) {
                    generation.api_key = key;
                }
            }
            Some(_) => {}
            None => {
                self.generation = GenerationProvider::all().iter().find_map(|provider| {
                    get(provider.api_key_env()).map(|key| GenerationConfig::new(*provider, key))
                });
            }
        }

        match self.retrieval {
            Some(ref mut retrieval) => {
                if retrieval.base_url.trim().is_empty() {
                    retrieval.base_url = get("FLOWISE_URL").unwrap_or_default();
                }
                if retrieval.chatflow_id.trim().is_empty() {
                    retrieval.chatflow_id = get("FLOWISE_CHATFLOW_ID").unwrap_or_default();
                }
                if retrieval.api_key.is_none() {
                    retrieval.api_key = get("FLOWISE_API_KEY");
                }
            }
            None => {
                if let (Some(base_url), Some(chatflow_id)) =
                    (get("FLOWISE_URL"), get("FLOWISE_CHATFLOW_ID"))
                {
                    self.retrieval = Some(RetrievalConfig {
                        base_url,
                        chatflow_id,
                        api_key: get("FLOWISE_API_KEY"),
                    });
                }
            }
        }

        let supabase_url = get("SUPABASE_URL");
        let service_key = get("SUPABASE_SERVICE_ROLE_KEY");
        match self.history.backend {
            HistoryBackend::None => {
                if let Some(path) = get("TOUCHLINE_HISTORY_DB") {
                    self.history.backend = HistoryBackend::Sqlite;
                    self.history.path = Some(PathBuf::from(path));
                } else if let (Some(url), Some(key)) = (&supabase_url, &service_key) {
                    self.history.backend = HistoryBackend::Supabase;
                    self.history.url = Some(url.clone());
                    self.history.api_key = key.clone();
                }
            }
            HistoryBackend::Sqlite => {
                if self.history.path.is_none() {
                    self.history.path = get("TOUCHLINE_HISTORY_DB").map(PathBuf::from);
                }
            }
            HistoryBackend::Supabase => {
                if self.history.url.is_none() {
                    self.history.url = supabase_url.clone();
                }
                if self.history.api_key.trim().is_empty() {
                    self.history.api_key = service_key.unwrap_or_default();
                }
            }
        }

        let anon_key = get("SUPABASE_ANON_KEY");
        match self.identity.provider {
            IdentityProviderKind::None => {
                if let (Some(url), Some(key)) = (supabase_url, anon_key) {
                    self.identity.provider = IdentityProviderKind::Supabase;
                    self.identity.url = Some(url);
                    self.identity.anon_key = key;
                }
            }
            IdentityProviderKind::Supabase => {
                if self.identity.url.is_none() {
                    self.identity.url = supabase_url;
                }
                if self.identity.anon_key.trim().is_empty() {
                    self.identity.anon_key = anon_key.unwrap_or_default();
                }
            }
        }

        Ok(())
    }

    /// Validate every configured section.
    ///
    /// Whether the configured sections are enough for the selected mode is
    /// decided by [`crate::mode::ResolutionMode::from_config`].
    pub fn validate(&self) -> Result<()> {
        if let Some(ref search) = self.search {
            search.validate()?;
        }
        if let Some(ref generation) = self.generation {
            generation.validate()?;
        }
        if let Some(ref retrieval) = self.retrieval {
            retrieval.validate()?;
        }
        self.history.validate()?;
        self.identity.validate()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| GatewayError::Configuration(format!("{field} {value:?} is invalid: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(GatewayError::Configuration(format!(
            "{field} must use http or https"
        )));
    }
    Ok(())
}
