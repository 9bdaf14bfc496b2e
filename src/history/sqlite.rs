//! SQLite history sink.
//!
//! A single database file holding `search_history` and
//! `user_search_history`. The schema is applied on open and is idempotent.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{Connection, params};

use super::{HistoryError, HistoryRecord, HistorySink, HistoryTable};

/// DDL for both history tables. `IF NOT EXISTS` throughout.
pub(crate) const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;

-- Every request, keyed by user id (authenticated) or session id (anonymous).
CREATE TABLE IF NOT EXISTS search_history (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT,
    session_id  TEXT,
    query       TEXT NOT NULL,
    summary     TEXT NOT NULL,
    sources     TEXT NOT NULL DEFAULT '[]',  -- JSON array of citations
    ip_address  TEXT NOT NULL,
    user_agent  TEXT NOT NULL,
    created_at  TEXT NOT NULL,               -- RFC 3339 UTC
    CHECK ((user_id IS NULL) <> (session_id IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_search_history_created_at ON search_history(created_at);

-- Authenticated requests only.
CREATE TABLE IF NOT EXISTS user_search_history (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL,
    query       TEXT NOT NULL,
    summary     TEXT NOT NULL,
    sources     TEXT NOT NULL DEFAULT '[]',
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_user_search_history_user ON user_search_history(user_id, created_at);
"#;

/// Apply the history schema to an open connection.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// History sink backed by a local SQLite file.
///
/// Writes run on the blocking pool, so a busy database file never stalls
/// request tasks.
pub struct SqliteHistorySink {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteHistorySink {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HistoryError::Io(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        apply_schema(&conn)?;
        Ok(Self {
            path: path.to_path_buf(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database, for tests.
    pub fn open_in_memory() -> Result<Self, HistoryError> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: HistoryTable) -> Result<u64, HistoryError> {
        let conn = self.lock()?;
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, HistoryError> {
        lock(&self.conn)
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, HistoryError> {
    conn.lock().map_err(|e| HistoryError::Lock(e.to_string()))
}

fn insert_row(
    conn: &Mutex<Connection>,
    table: HistoryTable,
    record: &HistoryRecord,
) -> Result<(), HistoryError> {
    let sources = record.sources_json()?;
    let created_at = record.timestamp_rfc3339();
    let conn = lock(conn)?;
    match table {
        HistoryTable::Shared => {
            conn.execute(
                "INSERT INTO search_history
                    (user_id, session_id, query, summary, sources, ip_address, user_agent, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.requester.user_id(),
                    record.requester.session_id(),
                    record.query,
                    record.summary,
                    sources,
                    record.client.ip_address,
                    record.client.user_agent,
                    created_at,
                ],
            )?;
        }
        HistoryTable::PerUser => {
            let Some(user_id) = record.requester.user_id() else {
                return Ok(());
            };
            conn.execute(
                "INSERT INTO user_search_history (user_id, query, summary, sources, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, record.query, record.summary, sources, created_at],
            )?;
        }
    }
    Ok(())
}

#[async_trait]
impl HistorySink for SqliteHistorySink {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, table: HistoryTable, record: &HistoryRecord) -> Result<(), HistoryError> {
        let conn = Arc::clone(&self.conn);
        let record = record.clone();
        tokio::task::spawn_blocking(move || insert_row(&conn, table, &record))
            .await
            .map_err(|e| HistoryError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::types::{ClientMetadata, Requester, SearchResponse};
    use touchline_search::SourceCitation;

    fn record(requester: Requester, query: &str) -> HistoryRecord {
        let response = SearchResponse {
            summary: format!("summary for {query}"),
            sources: vec![SourceCitation::new("t", "https://t.example", "s")],
            query: query.to_owned(),
        };
        HistoryRecord::new(
            requester,
            &response,
            ClientMetadata {
                ip_address: "203.0.113.7".into(),
                user_agent: "curl/8.0".into(),
            },
        )
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();
    }

    #[tokio::test]
    async fn shared_insert_stores_session_id_only() {
        let sink = SqliteHistorySink::open_in_memory().unwrap();
        let requester = Requester::anonymous();
        let session = requester.key().to_owned();
        sink.insert(HistoryTable::Shared, &record(requester, "derby")).await.unwrap();

        let conn = sink.lock().unwrap();
        let (user_id, session_id, sources): (Option<String>, Option<String>, String) = conn
            .query_row(
                "SELECT user_id, session_id, sources FROM search_history",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert!(user_id.is_none());
        assert_eq!(session_id.as_deref(), Some(session.as_str()));
        assert!(sources.starts_with('['));
    }

    #[tokio::test]
    async fn per_user_insert_skips_anonymous() {
        let sink = SqliteHistorySink::open_in_memory().unwrap();
        sink.insert(HistoryTable::PerUser, &record(Requester::anonymous(), "q"))
            .await
            .unwrap();
        assert_eq!(sink.count(HistoryTable::PerUser).unwrap(), 0);

        sink.insert(HistoryTable::PerUser, &record(Requester::user("u-1"), "q"))
            .await
            .unwrap();
        assert_eq!(sink.count(HistoryTable::PerUser).unwrap(), 1);
    }

    #[tokio::test]
    async fn busy_connection_does_not_stall_the_runtime() {
        let sink = Arc::new(SqliteHistorySink::open_in_memory().unwrap());
        let guard = sink.lock().unwrap();

        let writer = {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                sink.insert(HistoryTable::Shared, &record(Requester::anonymous(), "busy"))
                    .await
            })
        };
        // Single-threaded runtime: this sleep only completes if the writer
        // is waiting on the blocking pool rather than on this thread.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!writer.is_finished());

        drop(guard);
        writer.await.unwrap().unwrap();
        assert_eq!(sink.count(HistoryTable::Shared).unwrap(), 1);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");
        let sink = SqliteHistorySink::open(&path).unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert!(path.exists());
    }
}
