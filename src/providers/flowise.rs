//! Flowise prediction client (retrieval-augmented generation).
//!
//! One call returns both the answer and the documents it was grounded on.
//! The answer is read from `text`, `answer` or `result`, in that order;
//! documents go through [`touchline_search::normalize::normalize_documents`].

use serde_json::{Value, json};
use touchline_search::SourceCitation;
use touchline_search::normalize::normalize_documents;

use super::{http_client, send_json};
use crate::config::RetrievalConfig;
use crate::error::Result;

/// Summary used when the prediction carries no answer field.
pub const NO_ANSWER: &str = "No answer found";

/// Answer plus normalised source documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalAnswer {
    /// Generated answer.
    pub summary: String,
    /// Citations for the documents the answer was drawn from.
    pub sources: Vec<SourceCitation>,
}

/// Client for `POST {base}/api/v1/prediction/{chatflow_id}`.
#[derive(Clone)]
pub struct RetrievalClient {
    base_url: String,
    chatflow_id: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RetrievalClient {
    /// Validate `config` and build the client.
    pub fn new(config: &RetrievalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            chatflow_id: config.chatflow_id.trim().to_owned(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            client: http_client(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/v1/prediction/{}", self.base_url, self.chatflow_id)
    }

    /// Ask the chatflow `question`.
    ///
    /// # Errors
    ///
    /// Transport failures and non-success statuses are
    /// `UpstreamUnavailable`; a non-JSON success body is `UpstreamMalformed`.
    pub async fn retrieve(&self, question: &str) -> Result<RetrievalAnswer> {
        let mut request = self
            .client
            .post(self.endpoint())
            .json(&json!({ "question": question }));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(chatflow = %self.chatflow_id, "calling Flowise prediction");
        let body = send_json("Flowise", request).await?;
        Ok(parse_prediction(&body))
    }
}

/// Reduce a prediction body to an answer and citations. Never fails.
pub fn parse_prediction(body: &Value) -> RetrievalAnswer {
    let summary = ["text", "answer", "result"]
        .iter()
        .find_map(|key| {
            body.get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or(NO_ANSWER)
        .to_owned();

    RetrievalAnswer {
        summary,
        sources: normalize_documents(body),
    }
}
