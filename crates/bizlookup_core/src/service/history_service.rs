//! Search history ledger.
//!
//! # Responsibility
//! - Record completed searches and serve the recency view.
//! - Enforce the capacity policy on top of a [`HistoryStore`].
//!
//! # Invariants
//! - Entries are kept in descending timestamp order: a new entry never gets
//!   a timestamp older than the current head, even when the clock steps back.
//! - The store never holds more than `capacity` entries after `record`.
//! - Read failures in `recent` degrade to an empty list.

use crate::model::history::HistoryEntry;
use crate::repo::history_repo::HistoryStore;
use crate::repo::RepoResult;
use chrono::{DateTime, SubsecRound, Utc};
use log::{info, warn};
use std::sync::Arc;

/// Entries kept before the oldest is evicted.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;
/// Entries shown in the "recent searches" panel.
pub const DEFAULT_HISTORY_VIEW: usize = 5;

/// Time source used for new entries.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Capped, most-recent-first log of past searches.
pub struct SearchHistoryLedger {
    store: Arc<dyn HistoryStore>,
    capacity: usize,
    view_size: usize,
    clock: Clock,
}

impl SearchHistoryLedger {
    /// Creates a ledger with default capacity (10) and view size (5).
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self {
            store,
            capacity: DEFAULT_HISTORY_CAPACITY,
            view_size: DEFAULT_HISTORY_VIEW,
            clock: Arc::new(Utc::now),
        }
    }

    /// Overrides capacity; values below 1 are raised to 1.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Overrides the recency view size; values below 1 are raised to 1.
    pub fn with_view_size(mut self, view_size: usize) -> Self {
        self.view_size = view_size.max(1);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn view_size(&self) -> usize {
        self.view_size
    }

    /// Records one completed search and returns the stored entry.
    ///
    /// The entry becomes the new head; entries beyond capacity are evicted,
    /// oldest first.
    ///
    /// # Errors
    /// - Store failures are returned unchanged and not retried. A failed
    ///   record leaves the store untouched, so retrying is safe.
    pub async fn record(&self, query: &str, result_count: u32) -> RepoResult<HistoryEntry> {
        let head = self.store.list(1).await?.into_iter().next();
        // Millisecond precision keeps entries identical across store round trips.
        let mut timestamp = (self.clock)().trunc_subsecs(3);
        if let Some(head) = head {
            timestamp = timestamp.max(head.timestamp);
        }

        let entry = HistoryEntry::new(query, timestamp, result_count);
        let evicted = self.store.create_capped(&entry, self.capacity).await?;

        info!(
            "event=history_record module=history status=ok backend={} result_count={} evicted={}",
            self.store.backend_name(),
            result_count,
            evicted
        );
        Ok(entry)
    }

    /// Returns up to `n` entries, most recent first.
    ///
    /// Store failures are logged and reported as an empty list.
    pub async fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        match self.store.list(n).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "event=history_list module=history status=error backend={} error={}",
                    self.store.backend_name(),
                    err
                );
                Vec::new()
            }
        }
    }

    /// Returns the "recent searches" panel view.
    pub async fn view(&self) -> Vec<HistoryEntry> {
        self.recent(self.view_size).await
    }

    /// Empties the ledger and returns the removed entries.
    ///
    /// Clearing an empty ledger returns an empty list.
    pub async fn clear(&self) -> RepoResult<Vec<HistoryEntry>> {
        let removed = self.store.delete_all().await?;
        info!(
            "event=history_clear module=history status=ok backend={} removed={}",
            self.store.backend_name(),
            removed.len()
        );
        Ok(removed)
    }
}
