//! Composition of directory, history store and services.
//!
//! # Responsibility
//! - Pick the mock or SQLite implementations from configuration.
//! - Own every store for the lifetime of one process or test; nothing lives
//!   in module-level state.

use crate::config::{BackendKind, LookupConfig};
use crate::db::{open_db, share};
use crate::repo::company_repo::{
    CompanyDirectory, InMemoryCompanyDirectory, SqliteCompanyDirectory,
};
use crate::repo::fixtures::seed_companies;
use crate::repo::history_repo::{HistoryStore, InMemoryHistoryStore, SqliteHistoryStore};
use crate::repo::{RepoError, RepoResult};
use crate::search::suggest::{SuggestConfig, SuggestionFetcher};
use crate::service::history_service::SearchHistoryLedger;
use crate::service::profile_service::CompanyProfileService;
use crate::service::search_service::SearchService;
use log::info;
use std::sync::Arc;

/// Wired services sharing one directory and one history ledger.
pub struct LookupContext {
    backend: BackendKind,
    directory: Arc<dyn CompanyDirectory>,
    ledger: Arc<SearchHistoryLedger>,
    search: SearchService,
    profiles: CompanyProfileService,
    suggest: SuggestConfig,
}

impl LookupContext {
    /// Builds the backend selected by `config.storage.backend`.
    ///
    /// The SQLite directory is seeded from the bundled fixtures on first open.
    pub fn open(config: &LookupConfig) -> RepoResult<Self> {
        let (directory, history): (Arc<dyn CompanyDirectory>, Arc<dyn HistoryStore>) =
            match config.storage.backend {
                BackendKind::Memory => {
                    let directory =
                        InMemoryCompanyDirectory::seeded()?.with_latency(config.simulated_latency());
                    (Arc::new(directory), Arc::new(InMemoryHistoryStore::new()))
                }
                BackendKind::Sqlite => {
                    let path = config.storage.db_path.as_ref().ok_or_else(|| {
                        RepoError::InvalidData("storage.db_path is not set".to_string())
                    })?;
                    let conn = share(open_db(path)?);
                    let directory = SqliteCompanyDirectory::new(Arc::clone(&conn));
                    directory.seed_if_empty(&seed_companies()?)?;
                    (Arc::new(directory), Arc::new(SqliteHistoryStore::new(conn)))
                }
            };

        info!(
            "event=context_open module=backend status=ok backend={}",
            directory.backend_name()
        );
        Ok(Self::from_parts(config, directory, history))
    }

    /// Wires services around caller-provided stores.
    pub fn from_parts(
        config: &LookupConfig,
        directory: Arc<dyn CompanyDirectory>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let ledger = Arc::new(
            SearchHistoryLedger::new(history)
                .with_capacity(config.history.capacity)
                .with_view_size(config.history.view_size),
        );
        Self {
            backend: config.storage.backend,
            search: SearchService::new(Arc::clone(&directory), Arc::clone(&ledger)),
            profiles: CompanyProfileService::new(Arc::clone(&directory)),
            suggest: config.suggest_config(),
            directory,
            ledger,
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn directory(&self) -> &Arc<dyn CompanyDirectory> {
        &self.directory
    }

    pub fn ledger(&self) -> &Arc<SearchHistoryLedger> {
        &self.ledger
    }

    pub fn search(&self) -> &SearchService {
        &self.search
    }

    pub fn profiles(&self) -> &CompanyProfileService {
        &self.profiles
    }

    /// Creates a fetcher bound to this context's directory.
    pub fn suggestion_fetcher(&self) -> SuggestionFetcher {
        SuggestionFetcher::new(Arc::clone(&self.directory), self.suggest)
    }
}
