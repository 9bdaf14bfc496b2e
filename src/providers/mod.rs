//! Generation and retrieval provider clients.
//!
//! Every generation provider implements [`TextGenerator`], so the gateway
//! can hold one behind an `Arc<dyn TextGenerator>` regardless of vendor.
//! The Flowise retrieval client has its own shape ([`flowise::RetrievalClient`])
//! because it returns documents alongside the answer.

pub mod cohere;
pub mod flowise;
pub mod gemini;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{GenerationConfig, GenerationProvider, SamplingConfig};
use crate::error::{GatewayError, Result};
use crate::prompt::Prompt;

pub use cohere::CohereClient;
pub use flowise::{RetrievalAnswer, RetrievalClient};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

/// A provider that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// Run one generation request.
    ///
    /// # Errors
    ///
    /// [`GatewayError::UpstreamUnavailable`] for transport failures and
    /// non-success statuses, [`GatewayError::UpstreamMalformed`] when a
    /// success body lacks the text field.
    async fn generate(&self, prompt: &Prompt, sampling: &SamplingConfig) -> Result<String>;
}

/// Build the generator selected by `config`.
pub fn build_generator(config: &GenerationConfig) -> Result<Arc<dyn TextGenerator>> {
    config.validate()?;
    let model = config.effective_model().to_owned();
    let base_url = config.effective_base_url().to_owned();
    let generator: Arc<dyn TextGenerator> = match config.provider {
        GenerationProvider::Gemini => Arc::new(
            GeminiClient::new(config.api_key.clone(), model).with_base_url(base_url),
        ),
        GenerationProvider::OpenAi => Arc::new(
            OpenAiClient::new(config.api_key.clone(), model).with_base_url(base_url),
        ),
        GenerationProvider::Cohere => Arc::new(
            CohereClient::new(config.api_key.clone(), model).with_base_url(base_url),
        ),
    };
    Ok(generator)
}

/// Shared HTTP client for provider calls.
///
/// reqwest's default timeouts apply; requests are never retried.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("touchline/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

/// Send `request` and decode a success body as JSON.
///
/// Transport failures and non-success statuses become
/// [`GatewayError::UpstreamUnavailable`]; a success body that is not JSON
/// becomes [`GatewayError::UpstreamMalformed`].
pub(crate) async fn send_json(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value> {
    let response = request.send().await.map_err(|e| {
        GatewayError::UpstreamUnavailable(format!("{provider} request failed: {}", e.without_url()))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(map_http_error(provider, status, &body));
    }

    let text = response.text().await.map_err(|e| {
        GatewayError::UpstreamUnavailable(format!("{provider} body read failed: {e}"))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        GatewayError::UpstreamMalformed(format!("{provider} returned non-JSON body: {e}"))
    })
}

fn map_http_error(provider: &str, status: reqwest::StatusCode, body: &str) -> GatewayError {
    let message = extract_error_message(body);
    GatewayError::UpstreamUnavailable(format!("{provider} HTTP {}: {message}", status.as_u16()))
}

/// Extract a readable message from a provider error body.
///
/// Understands `{"error": {"message": ..}}` (OpenAI, Gemini),
/// `{"message": ..}` (Cohere, Flowise) and `{"error": ".."}`; otherwise
/// returns the body, truncated.
pub(crate) fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(|m| m.as_str())
                .or_else(|| v.get("message").and_then(|m| m.as_str()))
                .map(String::from)
        })
        .unwrap_or_else(|| body.chars().take(512).collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn extract_nested_error_message() {
        let body = r#"{"error":{"message":"Invalid API key","code":401}}"#;
        assert_eq!(extract_error_message(body), "Invalid API key");
    }

    #[test]
    fn extract_flat_message() {
        assert_eq!(
            extract_error_message(r#"{"message":"invalid api token"}"#),
            "invalid api token"
        );
        assert_eq!(extract_error_message(r#"{"error":"Unauthorized"}"#), "Unauthorized");
    }

    #[test]
    fn extract_falls_back_to_body() {
        assert_eq!(extract_error_message("Bad Gateway"), "Bad Gateway");
        let long = "x".repeat(2000);
        assert_eq!(extract_error_message(&long).len(), 512);
    }

    #[test]
    fn http_errors_are_unavailable() {
        let err = map_http_error("Gemini", reqwest::StatusCode::TOO_MANY_REQUESTS, "{}");
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)));
        assert!(err.message().contains("Gemini HTTP 429"));
    }

    #[test]
    fn build_generator_picks_provider() {
        let generator =
            build_generator(&GenerationConfig::new(GenerationProvider::Cohere, "k")).unwrap();
        assert_eq!(generator.name(), "Cohere");
    }

    #[test]
    fn build_generator_rejects_missing_key() {
        let result = build_generator(&GenerationConfig::new(GenerationProvider::Gemini, ""));
        assert!(matches!(result, Err(GatewayError::Configuration(_))));
    }
}
