//! Debounced type-ahead suggestions.
//!
//! # Responsibility
//! - Turn a burst of name keystrokes into a single directory lookup.
//! - Publish the latest applied suggestion list to subscribers.
//!
//! # Invariants
//! - At most one lookup task exists per fetcher; scheduling a new one aborts
//!   the previous task.
//! - A result is applied only while its generation is still the latest one.
//!   The check and the write happen under the watch channel's lock, so a
//!   superseded task can never overwrite newer state.
//! - Lookup failures clear the list and are never returned to callers.
//! - Items keep directory order, truncated to `limit`.

use crate::model::company::CompanySummary;
use crate::repo::company_repo::CompanyDirectory;
use crate::search::classifier::{classify, QueryKind};
use log::{debug, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Quiet period before a lookup is issued.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
/// Maximum suggestions shown in the dropdown.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Fetcher tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestConfig {
    pub debounce: Duration,
    pub limit: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

/// Latest applied suggestion list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    /// Name query the items answer; `None` once cleared.
    pub query: Option<String>,
    pub items: Vec<CompanySummary>,
}

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Debounced, cancellable suggestion lookups against a directory.
///
/// Scheduling methods spawn onto the ambient Tokio runtime and must be called
/// from within one.
pub struct SuggestionFetcher {
    directory: Arc<dyn CompanyDirectory>,
    config: SuggestConfig,
    latest: Arc<AtomicU64>,
    state: Arc<watch::Sender<Suggestions>>,
    pending: Option<JoinHandle<()>>,
}

impl SuggestionFetcher {
    pub fn new(directory: Arc<dyn CompanyDirectory>, config: SuggestConfig) -> Self {
        let (state, _) = watch::channel(Suggestions::default());
        Self {
            directory,
            config,
            latest: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
            pending: None,
        }
    }

    pub fn config(&self) -> SuggestConfig {
        self.config
    }

    /// Subscribes to applied suggestion lists.
    pub fn subscribe(&self) -> watch::Receiver<Suggestions> {
        self.state.subscribe()
    }

    /// Snapshot of the latest applied list.
    pub fn current(&self) -> Suggestions {
        self.state.borrow().clone()
    }

    /// True while a scheduled or in-flight lookup has not finished.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Handles one search-bar edit.
    ///
    /// Name queries schedule a lookup; empty and VAT-shaped input cancel any
    /// pending lookup and clear the list. Returns the classification so the
    /// caller can show the VAT indicator.
    pub fn on_input(&mut self, raw: &str) -> QueryKind {
        let kind = classify(raw);
        match &kind {
            QueryKind::NamePrefix(prefix) => self.on_query_change(prefix.clone()),
            QueryKind::Empty | QueryKind::VatNumber(_) => {
                self.supersede();
                self.state.send_replace(Suggestions::default());
            }
        }
        kind
    }

    /// Schedules a lookup for `prefix` after the quiet period.
    ///
    /// Any previously scheduled or in-flight lookup is cancelled and its
    /// result will not be applied.
    pub fn on_query_change(&mut self, prefix: impl Into<String>) {
        let generation = self.supersede();
        let task = LookupTask {
            directory: Arc::clone(&self.directory),
            latest: Arc::clone(&self.latest),
            state: Arc::clone(&self.state),
            generation,
            prefix: prefix.into(),
            config: self.config,
        };
        self.pending = Some(tokio::spawn(task.run()));
    }

    /// Cancels pending work and leaves the current list untouched.
    pub fn cancel(&mut self) {
        self.supersede();
    }

    fn supersede(&mut self) -> u64 {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Drop for SuggestionFetcher {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

struct LookupTask {
    directory: Arc<dyn CompanyDirectory>,
    latest: Arc<AtomicU64>,
    state: Arc<watch::Sender<Suggestions>>,
    generation: u64,
    prefix: String,
    config: SuggestConfig,
}

impl LookupTask {
    async fn run(self) {
        tokio::time::sleep(self.config.debounce).await;

        if !self.is_latest() {
            return;
        }

        let items = match self.directory.find_by_name_prefix(&self.prefix).await {
            Ok(mut items) => {
                items.truncate(self.config.limit);
                debug!(
                    "event=suggest_lookup module=suggest status=ok backend={} query_len={} results={}",
                    self.directory.backend_name(),
                    self.prefix.chars().count(),
                    items.len()
                );
                items
            }
            Err(err) => {
                warn!(
                    "event=suggest_lookup module=suggest status=error backend={} query_len={} error={}",
                    self.directory.backend_name(),
                    self.prefix.chars().count(),
                    err
                );
                Vec::new()
            }
        };

        let applied = self.state.send_if_modified(|current| {
            if !self.is_latest() {
                return false;
            }
            *current = Suggestions {
                query: Some(self.prefix.clone()),
                items,
            };
            true
        });
        if !applied {
            debug!(
                "event=suggest_discard module=suggest status=stale generation={}",
                self.generation
            );
        }
    }

    fn is_latest(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }
}
