//! Best-effort search history.
//!
//! The gateway hands each completed exchange to a [`HistoryRecorder`], which
//! only enqueues it. A background [`HistoryWorker`] drains the queue into a
//! [`HistorySink`]: every record goes to the shared log, and records from
//! authenticated users also go to the per-user log. Nothing here can fail a
//! request; write errors are logged and dropped.

pub mod sqlite;
pub mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use touchline_search::SourceCitation;

use crate::config::{HistoryBackend, HistoryConfig};
use crate::error::GatewayError;
use crate::types::{ClientMetadata, Requester, SearchResponse};

pub use sqlite::SqliteHistorySink;
pub use supabase::SupabaseHistorySink;

/// Errors from history sinks.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error("blocking write task failed: {0}")]
    Task(String),
}

impl From<HistoryError> for GatewayError {
    fn from(err: HistoryError) -> Self {
        GatewayError::Persistence(err.to_string())
    }
}

/// Which log a record is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryTable {
    /// Every request, keyed by user id or session id.
    Shared,
    /// Authenticated requests only.
    PerUser,
}

impl HistoryTable {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shared => "search_history",
            Self::PerUser => "user_search_history",
        }
    }
}

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub requester: Requester,
    pub query: String,
    pub summary: String,
    pub sources: Vec<SourceCitation>,
    pub timestamp: DateTime<Utc>,
    pub client: ClientMetadata,
}

impl HistoryRecord {
    /// Record for `response`, stamped now.
    pub fn new(requester: Requester, response: &SearchResponse, client: ClientMetadata) -> Self {
        Self {
            requester,
            query: response.query.clone(),
            summary: response.summary.clone(),
            sources: response.sources.clone(),
            timestamp: Utc::now(),
            client,
        }
    }

    /// Sources as a JSON array string.
    pub fn sources_json(&self) -> Result<String, HistoryError> {
        Ok(serde_json::to_string(&self.sources)?)
    }

    /// RFC 3339 UTC timestamp.
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339()
    }
}

/// Storage for history records.
#[async_trait]
pub trait HistorySink: Send + Sync {
    fn name(&self) -> &str;

    /// Insert `record` into `table`. Only called with
    /// [`HistoryTable::PerUser`] for authenticated requesters.
    async fn insert(&self, table: HistoryTable, record: &HistoryRecord) -> Result<(), HistoryError>;
}

/// Sink that discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHistorySink;

#[async_trait]
impl HistorySink for NoopHistorySink {
    fn name(&self) -> &str {
        "none"
    }

    async fn insert(&self, _table: HistoryTable, _record: &HistoryRecord) -> Result<(), HistoryError> {
        Ok(())
    }
}

/// Open the sink selected by `config`.
pub fn open_sink(config: &HistoryConfig) -> Result<Arc<dyn HistorySink>, HistoryError> {
    let sink: Arc<dyn HistorySink> = match config.backend {
        HistoryBackend::None => Arc::new(NoopHistorySink),
        HistoryBackend::Sqlite => Arc::new(SqliteHistorySink::open(&config.effective_path())?),
        HistoryBackend::Supabase => Arc::new(SupabaseHistorySink::new(
            config.url.as_deref().unwrap_or_default(),
            &config.api_key,
        )),
    };
    Ok(sink)
}

/// Non-blocking handle for submitting records. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HistoryRecorder {
    tx: mpsc::Sender<HistoryRecord>,
}

impl HistoryRecorder {
    /// Start a worker writing to `sink` behind a queue of `capacity` records.
    pub fn spawn(sink: Arc<dyn HistorySink>, capacity: usize) -> (Self, HistoryWorker) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(sink, rx));
        (Self { tx }, HistoryWorker { handle })
    }

    /// Enqueue `record` without waiting. A full or closed queue drops it.
    pub fn record(&self, record: HistoryRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("history queue full; dropping record");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("history worker stopped; dropping record");
            }
        }
    }
}

/// The background writer. Exits once every [`HistoryRecorder`] is dropped
/// and the queue is drained.
#[derive(Debug)]
pub struct HistoryWorker {
    handle: JoinHandle<usize>,
}

impl HistoryWorker {
    /// Wait for the worker to drain. Returns how many records it processed.
    pub async fn join(self) -> usize {
        match self.handle.await {
            Ok(processed) => processed,
            Err(e) => {
                tracing::warn!("history worker ended abnormally: {e}");
                0
            }
        }
    }
}

async fn run_worker(sink: Arc<dyn HistorySink>, mut rx: mpsc::Receiver<HistoryRecord>) -> usize {
    let mut processed = 0usize;
    while let Some(record) = rx.recv().await {
        write_record(sink.as_ref(), &record).await;
        processed = processed.saturating_add(1);
    }
    tracing::debug!(processed, sink = sink.name(), "history worker drained");
    processed
}

async fn write_record(sink: &dyn HistorySink, record: &HistoryRecord) {
    if let Err(e) = sink.insert(HistoryTable::Shared, record).await {
        tracing::warn!(sink = sink.name(), table = HistoryTable::Shared.name(), "history write failed: {e}");
    }
    if record.requester.user_id().is_some() {
        if let Err(e) = sink.insert(HistoryTable::PerUser, record).await {
            tracing::warn!(sink = sink.name(), table = HistoryTable::PerUser.name(), "history write failed: {e}");
        }
    }
}
