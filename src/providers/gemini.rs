//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{TextGenerator, http_client, send_json};
use crate::config::SamplingConfig;
use crate::error::{GatewayError, Result};
use crate::prompt::Prompt;

/// Client for `POST {base}/v1beta/models/{model}:generateContent`.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client for `model` against the public endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            client: http_client(),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Build the `generateContent` request body.
pub fn build_request(prompt: &Prompt, sampling: &SamplingConfig) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": prompt.system }] },
        "contents": [{ "role": "user", "parts": [{ "text": prompt.user }] }],
        "generationConfig": {
            "temperature": sampling.temperature,
            "topP": sampling.top_p,
            "maxOutputTokens": sampling.max_tokens,
        }
    })
}

/// Concatenate `candidates[0].content.parts[*].text`.
pub fn extract_text(body: &Value) -> Result<String> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            GatewayError::UpstreamMalformed("Gemini response has no candidate parts".into())
        })?;
    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if texts.is_empty() {
        return Err(GatewayError::UpstreamMalformed(
            "Gemini candidate has no text parts".into(),
        ));
    }
    Ok(texts.concat())
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate(&self, prompt: &Prompt, sampling: &SamplingConfig) -> Result<String> {
        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(prompt, sampling));
        tracing::debug!(model = %self.model, "calling Gemini generateContent");
        let body = send_json(self.name(), request).await?;
        extract_text(&body)
    }
}
