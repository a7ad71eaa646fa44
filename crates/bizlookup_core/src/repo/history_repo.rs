//! Search history persistence contract and implementations.
//!
//! # Responsibility
//! - Store history entries and hand them back most-recent-first.
//! - Leave capacity policy to the ledger; stores only truncate on request.
//!
//! # Invariants
//! - `list` orders by descending timestamp, newest insert first on ties.
//! - `delete_all` returns exactly the rows it removed.
//! - `create_capped` is all-or-nothing.

use crate::db::SharedConnection;
use crate::model::history::HistoryEntry;
use crate::repo::{on_connection, RepoError, RepoResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const HISTORY_SELECT_SQL: &str = "SELECT uuid, query, recorded_at_ms, result_count
FROM search_history
ORDER BY recorded_at_ms DESC, seq DESC";

/// CRUD contract for persisted history entries.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Short backend label used in log events.
    fn backend_name(&self) -> &'static str;

    /// Persists one new entry.
    async fn create(&self, entry: &HistoryEntry) -> RepoResult<()>;

    /// Persists `entry` and drops everything beyond the `keep` most recent
    /// entries as one atomic step.
    ///
    /// On error nothing is stored and nothing is evicted. Returns the number
    /// of evicted entries.
    async fn create_capped(&self, entry: &HistoryEntry, keep: usize) -> RepoResult<usize>;

    /// Returns up to `limit` entries, most recent first.
    async fn list(&self, limit: usize) -> RepoResult<Vec<HistoryEntry>>;

    /// Drops everything beyond the `keep` most recent entries.
    ///
    /// Returns the number of removed entries.
    async fn truncate(&self, keep: usize) -> RepoResult<usize>;

    /// Removes all entries and returns them, most recent first.
    async fn delete_all(&self) -> RepoResult<Vec<HistoryEntry>>;
}

/// History store backed by a process-local list.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, entry: &HistoryEntry) -> RepoResult<()> {
        insert_ordered(&mut self.entries.lock(), entry);
        Ok(())
    }

    async fn create_capped(&self, entry: &HistoryEntry, keep: usize) -> RepoResult<usize> {
        let mut entries = self.entries.lock();
        insert_ordered(&mut entries, entry);
        let evicted = entries.len().saturating_sub(keep);
        entries.truncate(keep);
        Ok(evicted)
    }

    async fn list(&self, limit: usize) -> RepoResult<Vec<HistoryEntry>> {
        Ok(self.entries.lock().iter().take(limit).cloned().collect())
    }

    async fn truncate(&self, keep: usize) -> RepoResult<usize> {
        let mut entries = self.entries.lock();
        let removed = entries.len().saturating_sub(keep);
        entries.truncate(keep);
        Ok(removed)
    }

    async fn delete_all(&self) -> RepoResult<Vec<HistoryEntry>> {
        Ok(std::mem::take(&mut *self.entries.lock()))
    }
}

/// SQLite-backed history store.
pub struct SqliteHistoryStore {
    conn: SharedConnection,
}

impl SqliteHistoryStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn create(&self, entry: &HistoryEntry) -> RepoResult<()> {
        let entry = entry.clone();
        on_connection(&self.conn, move |conn| insert_entry(conn, &entry)).await
    }

    async fn create_capped(&self, entry: &HistoryEntry, keep: usize) -> RepoResult<usize> {
        let entry = entry.clone();
        on_connection(&self.conn, move |conn| {
            let tx = conn.transaction()?;
            insert_entry(&tx, &entry)?;
            let evicted = delete_beyond(&tx, keep)?;
            tx.commit()?;
            Ok(evicted)
        })
        .await
    }

    async fn list(&self, limit: usize) -> RepoResult<Vec<HistoryEntry>> {
        on_connection(&self.conn, move |conn| select_entries(conn, Some(limit))).await
    }

    async fn truncate(&self, keep: usize) -> RepoResult<usize> {
        on_connection(&self.conn, move |conn| delete_beyond(conn, keep)).await
    }

    async fn delete_all(&self) -> RepoResult<Vec<HistoryEntry>> {
        on_connection(&self.conn, |conn| {
            let tx = conn.transaction()?;
            let removed = select_entries(&tx, None)?;
            tx.execute("DELETE FROM search_history;", [])?;
            tx.commit()?;
            Ok(removed)
        })
        .await
    }
}

fn insert_entry(conn: &Connection, entry: &HistoryEntry) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO search_history (uuid, query, recorded_at_ms, result_count)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            entry.id.to_string(),
            entry.query.as_str(),
            entry.timestamp.timestamp_millis(),
            i64::from(entry.result_count),
        ],
    )?;
    Ok(())
}

fn delete_beyond(conn: &Connection, keep: usize) -> RepoResult<usize> {
    let removed = conn.execute(
        "DELETE FROM search_history
         WHERE seq NOT IN (
            SELECT seq FROM search_history
            ORDER BY recorded_at_ms DESC, seq DESC
            LIMIT ?1
         );",
        [to_sql_limit(keep)],
    )?;
    Ok(removed)
}

// Newest first; a tie goes in front of existing entries.
fn insert_ordered(entries: &mut Vec<HistoryEntry>, entry: &HistoryEntry) {
    let position = entries
        .iter()
        .position(|existing| existing.timestamp <= entry.timestamp)
        .unwrap_or(entries.len());
    entries.insert(position, entry.clone());
}

fn select_entries(conn: &Connection, limit: Option<usize>) -> RepoResult<Vec<HistoryEntry>> {
    let mut entries = Vec::new();
    match limit {
        Some(limit) => {
            let mut stmt = conn.prepare(&format!("{HISTORY_SELECT_SQL} LIMIT ?1;"))?;
            let mut rows = stmt.query([to_sql_limit(limit)])?;
            while let Some(row) = rows.next()? {
                entries.push(parse_history_row(row)?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!("{HISTORY_SELECT_SQL};"))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                entries.push(parse_history_row(row)?);
            }
        }
    }
    Ok(entries)
}

fn parse_history_row(row: &Row<'_>) -> RepoResult<HistoryEntry> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in search_history.uuid"
        ))
    })?;

    let recorded_at_ms: i64 = row.get("recorded_at_ms")?;
    let timestamp = DateTime::<Utc>::from_timestamp_millis(recorded_at_ms).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{recorded_at_ms}` in search_history.recorded_at_ms"
        ))
    })?;

    let result_count: i64 = row.get("result_count")?;
    let result_count = u32::try_from(result_count).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid result count `{result_count}` in search_history.result_count"
        ))
    })?;

    Ok(HistoryEntry {
        id,
        query: row.get("query")?,
        timestamp,
        result_count,
    })
}

fn to_sql_limit(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
