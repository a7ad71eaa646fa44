#![allow(dead_code)]

use async_trait::async_trait;
use bizlookup_core::{
    Company, CompanyDirectory, CompanyId, CompanySummary, Executive, FinancialYear, HistoryEntry,
    HistoryStore, InMemoryCompanyDirectory, InMemoryHistoryStore, RepoError, RepoResult, VatNumber,
};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Seeded directory that records name lookups and can delay or fail them.
#[derive(Default)]
pub struct RecordingDirectory {
    inner: InMemoryCompanyDirectory,
    calls: Mutex<Vec<String>>,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    fail_everything: bool,
}

impl RecordingDirectory {
    pub fn seeded() -> Self {
        Self {
            inner: InMemoryCompanyDirectory::seeded().unwrap(),
            ..Self::default()
        }
    }

    pub fn delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn fail_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn unavailable() -> Self {
        Self {
            fail_everything: true,
            ..Self::seeded()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn check_available(&self) -> RepoResult<()> {
        if self.fail_everything {
            return Err(RepoError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CompanyDirectory for RecordingDirectory {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn find_by_vat_number(&self, vat: &VatNumber) -> RepoResult<Option<Company>> {
        self.check_available()?;
        self.inner.find_by_vat_number(vat).await
    }

    async fn find_by_name_prefix(&self, prefix: &str) -> RepoResult<Vec<CompanySummary>> {
        self.calls.lock().push(prefix.to_string());
        if let Some(delay) = self.delays.get(prefix) {
            tokio::time::sleep(*delay).await;
        }
        self.check_available()?;
        if self.failing.contains(prefix) {
            return Err(RepoError::Unavailable(format!("lookup of `{prefix}` failed")));
        }
        self.inner.find_by_name_prefix(prefix).await
    }

    async fn get_company(&self, id: CompanyId) -> RepoResult<Option<Company>> {
        self.check_available()?;
        self.inner.get_company(id).await
    }

    async fn list_executives(&self, company_id: CompanyId) -> RepoResult<Vec<Executive>> {
        self.check_available()?;
        self.inner.list_executives(company_id).await
    }

    async fn list_financials(&self, company_id: CompanyId) -> RepoResult<Vec<FinancialYear>> {
        self.check_available()?;
        self.inner.list_financials(company_id).await
    }
}

/// History store whose every operation fails.
pub struct BrokenHistoryStore;

#[async_trait]
impl HistoryStore for BrokenHistoryStore {
    fn backend_name(&self) -> &'static str {
        "broken"
    }

    async fn create(&self, _entry: &HistoryEntry) -> RepoResult<()> {
        Err(RepoError::Unavailable("history offline".to_string()))
    }

    async fn create_capped(&self, _entry: &HistoryEntry, _keep: usize) -> RepoResult<usize> {
        Err(RepoError::Unavailable("history offline".to_string()))
    }

    async fn list(&self, _limit: usize) -> RepoResult<Vec<HistoryEntry>> {
        Err(RepoError::Unavailable("history offline".to_string()))
    }

    async fn truncate(&self, _keep: usize) -> RepoResult<usize> {
        Err(RepoError::Unavailable("history offline".to_string()))
    }

    async fn delete_all(&self) -> RepoResult<Vec<HistoryEntry>> {
        Err(RepoError::Unavailable("history offline".to_string()))
    }
}

/// In-memory history store whose standalone `truncate` always fails.
#[derive(Default)]
pub struct TruncateFailingStore {
    inner: InMemoryHistoryStore,
}

impl TruncateFailingStore {
    pub async fn stored(&self) -> usize {
        self.inner.list(usize::MAX).await.unwrap().len()
    }
}

#[async_trait]
impl HistoryStore for TruncateFailingStore {
    fn backend_name(&self) -> &'static str {
        "truncate-failing"
    }

    async fn create(&self, entry: &HistoryEntry) -> RepoResult<()> {
        self.inner.create(entry).await
    }

    async fn create_capped(&self, entry: &HistoryEntry, keep: usize) -> RepoResult<usize> {
        self.inner.create_capped(entry, keep).await
    }

    async fn list(&self, limit: usize) -> RepoResult<Vec<HistoryEntry>> {
        self.inner.list(limit).await
    }

    async fn truncate(&self, _keep: usize) -> RepoResult<usize> {
        Err(RepoError::Unavailable("eviction offline".to_string()))
    }

    async fn delete_all(&self) -> RepoResult<Vec<HistoryEntry>> {
        self.inner.delete_all().await
    }
}

/// Manual clock in milliseconds since the Unix epoch.
#[derive(Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn starting_at(ms: i64) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(ms)),
        }
    }

    pub fn set(&self, ms: i64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn as_clock(&self) -> Arc<dyn Fn() -> DateTime<Utc> + Send + Sync> {
        let now_ms = Arc::clone(&self.now_ms);
        Arc::new(move || at_ms(now_ms.load(Ordering::SeqCst)))
    }
}

pub fn at_ms(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

pub fn ids(items: &[CompanySummary]) -> Vec<CompanyId> {
    items.iter().map(|item| item.id).collect()
}
