//! Cohere `generate` client.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{TextGenerator, http_client, send_json};
use crate::config::SamplingConfig;
use crate::error::{GatewayError, Result};
use crate::prompt::Prompt;

/// Client for `POST {base}/v1/generate`.
#[derive(Clone)]
pub struct CohereClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl CohereClient {
    /// Create a client for `model` against the public endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.cohere.ai".into(),
            client: http_client(),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_owned();
        self
    }
}

/// Build the `generate` request body. Cohere has no system role, so the
/// prompt is flattened.
pub fn build_request(model: &str, prompt: &Prompt, sampling: &SamplingConfig) -> Value {
    json!({
        "model": model,
        "prompt": prompt.flattened(),
        "temperature": sampling.temperature,
        "p": sampling.top_p,
        "max_tokens": sampling.max_tokens,
    })
}

/// Read `generations[0].text`.
pub fn extract_text(body: &Value) -> Result<String> {
    body.pointer("/generations/0/text")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| {
            GatewayError::UpstreamMalformed("Cohere response has no generation text".into())
        })
}

#[async_trait]
impl TextGenerator for CohereClient {
    fn name(&self) -> &str {
        "Cohere"
    }

    async fn generate(&self, prompt: &Prompt, sampling: &SamplingConfig) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/v1/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&build_request(&self.model, prompt, sampling));
        tracing::debug!(model = %self.model, "calling Cohere generate");
        let body = send_json(self.name(), request).await?;
        extract_text(&body)
    }
}
