//! Search history entry model.
//!
//! # Invariants
//! - Entries are immutable once created.
//! - `timestamp` is UTC and serialized as ISO-8601.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a history entry.
pub type HistoryId = Uuid;

/// One completed search, successful or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    /// Query as submitted (trimmed).
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub result_count: u32,
}

impl HistoryEntry {
    /// Creates an entry with a generated ID.
    pub fn new(query: impl Into<String>, timestamp: DateTime<Utc>, result_count: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            timestamp,
            result_count,
        }
    }
}
