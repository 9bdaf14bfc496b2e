//! OpenAI Chat Completions client (non-streaming).

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{TextGenerator, http_client, send_json};
use crate::config::SamplingConfig;
use crate::error::{GatewayError, Result};
use crate::prompt::Prompt;

/// Client for `POST {base}/v1/chat/completions`.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client for `model` against the public endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com".into(),
            client: http_client(),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_owned();
        self
    }
}

/// Build the Chat Completions request body.
pub fn build_request(model: &str, prompt: &Prompt, sampling: &SamplingConfig) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": prompt.system },
            { "role": "user", "content": prompt.user },
        ],
        "temperature": sampling.temperature,
        "top_p": sampling.top_p,
        "max_tokens": sampling.max_tokens,
        "stream": false,
    })
}

/// Read `choices[0].message.content`.
pub fn extract_text(body: &Value) -> Result<String> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| {
            GatewayError::UpstreamMalformed("OpenAI response has no message content".into())
        })
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn generate(&self, prompt: &Prompt, sampling: &SamplingConfig) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&build_request(&self.model, prompt, sampling));
        tracing::debug!(model = %self.model, "calling OpenAI chat completions");
        let body = send_json(self.name(), request).await?;
        extract_text(&body)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn request_has_system_and_user_messages() {
        let body = build_request("gpt-4o-mini", &Prompt::direct("Arsenal fixtures"), &SamplingConfig::default());
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Arsenal fixtures");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn content_is_extracted() {
        let body = json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "Chelsea beat Arsenal 2-1." } }]
        });
        assert_eq!(extract_text(&body).unwrap(), "Chelsea beat Arsenal 2-1.");
    }

    #[test]
    fn null_content_is_malformed() {
        let body = json!({ "choices": [{ "message": { "role": "assistant", "content": null } }] });
        assert!(matches!(
            extract_text(&body),
            Err(GatewayError::UpstreamMalformed(_))
        ));
        assert!(extract_text(&json!({ "choices": [] })).is_err());
    }
}
