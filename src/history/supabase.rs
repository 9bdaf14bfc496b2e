//! Supabase (PostgREST) history sink.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{HistoryError, HistoryRecord, HistorySink, HistoryTable};

/// Writes rows with `POST {url}/rest/v1/{table}` using the service-role key.
#[derive(Clone)]
pub struct SupabaseHistorySink {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for SupabaseHistorySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseHistorySink")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SupabaseHistorySink {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            client: crate::providers::http_client(),
        }
    }

    fn endpoint(&self, table: HistoryTable) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }
}

/// Row body for `table`.
pub fn row(table: HistoryTable, record: &HistoryRecord) -> Value {
    match table {
        HistoryTable::Shared => json!({
            "user_id": record.requester.user_id(),
            "session_id": record.requester.session_id(),
            "query": record.query,
            "summary": record.summary,
            "sources": record.sources,
            "ip_address": record.client.ip_address,
            "user_agent": record.client.user_agent,
            "created_at": record.timestamp_rfc3339(),
        }),
        HistoryTable::PerUser => json!({
            "user_id": record.requester.user_id(),
            "query": record.query,
            "summary": record.summary,
            "sources": record.sources,
            "created_at": record.timestamp_rfc3339(),
        }),
    }
}

#[async_trait]
impl HistorySink for SupabaseHistorySink {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn insert(&self, table: HistoryTable, record: &HistoryRecord) -> Result<(), HistoryError> {
        let response = self
            .client
            .post(self.endpoint(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&row(table, record))
            .send()
            .await
            .map_err(|e| HistoryError::Http(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HistoryError::Status {
                status: status.as_u16(),
                body: body.chars().take(512).collect(),
            });
        }
        Ok(())
    }
}
