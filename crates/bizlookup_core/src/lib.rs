//! Core lookup logic for Belgian company search.
//! Query classification, debounced suggestions, search history and the
//! company directory live here; front ends only render what this crate
//! returns.

pub mod backend;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use backend::LookupContext;
pub use config::{BackendKind, ConfigError, LookupConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::company::{
    Address, Company, CompanyId, CompanyRecord, CompanySummary, Contact, Executive, FinancialYear,
};
pub use model::history::{HistoryEntry, HistoryId};
pub use model::vat::{InvalidVatNumber, VatNumber};
pub use repo::company_repo::{CompanyDirectory, InMemoryCompanyDirectory, SqliteCompanyDirectory};
pub use repo::history_repo::{HistoryStore, InMemoryHistoryStore, SqliteHistoryStore};
pub use repo::{RepoError, RepoResult};
pub use search::classifier::{classify, QueryKind, MIN_NAME_QUERY_CHARS};
pub use search::suggest::{SuggestConfig, SuggestionFetcher, Suggestions};
pub use service::history_service::SearchHistoryLedger;
pub use service::profile_service::{
    CompanyProfile, CompanyProfileService, Metric, MetricSnapshot, ProfileError,
};
pub use service::search_service::{SearchError, SearchOutcome, SearchService, SearchTarget};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
