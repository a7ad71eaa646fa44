//! Primary search action.
//!
//! # Responsibility
//! - Run an explicitly submitted search against the Company Directory.
//! - Record every completed search in the history ledger.
//!
//! # Invariants
//! - A VAT miss is reported as `NotFound`, after a history entry with
//!   `result_count = 0` has been recorded.
//! - Directory and history failures propagate so callers can offer a retry.
//! - Name searches return every match; the suggestion limit does not apply.

use crate::model::company::CompanySummary;
use crate::model::history::HistoryEntry;
use crate::model::vat::VatNumber;
use crate::repo::company_repo::CompanyDirectory;
use crate::repo::RepoError;
use crate::search::classifier::{classify, QueryKind};
use crate::service::history_service::SearchHistoryLedger;
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type SearchResult<T> = Result<T, SearchError>;

/// Failure of the primary search action.
#[derive(Debug)]
pub enum SearchError {
    /// Submitted text is blank.
    EmptyQuery,
    /// No company carries this VAT number.
    NotFound(VatNumber),
    /// Directory lookup failed.
    Directory(RepoError),
    /// The search completed but could not be recorded.
    History(RepoError),
}

impl SearchError {
    /// True for failures worth offering a retry for.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Directory(_) | Self::History(_))
    }
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyQuery => write!(f, "search query is empty"),
            Self::NotFound(vat) => write!(f, "no company found with VAT number {vat}"),
            Self::Directory(err) => write!(f, "company lookup failed: {err}"),
            Self::History(err) => write!(f, "search history update failed: {err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory(err) | Self::History(err) => Some(err),
            Self::EmptyQuery | Self::NotFound(_) => None,
        }
    }
}

/// How a submitted query was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum SearchTarget {
    VatNumber(VatNumber),
    Name(String),
}

/// Successful search result, possibly empty for name searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub target: SearchTarget,
    pub results: Vec<CompanySummary>,
    pub history_entry: HistoryEntry,
}

/// Orchestrates directory lookups and history recording.
pub struct SearchService {
    directory: Arc<dyn CompanyDirectory>,
    history: Arc<SearchHistoryLedger>,
}

impl SearchService {
    pub fn new(directory: Arc<dyn CompanyDirectory>, history: Arc<SearchHistoryLedger>) -> Self {
        Self { directory, history }
    }

    pub fn history(&self) -> &Arc<SearchHistoryLedger> {
        &self.history
    }

    /// Runs a submitted search.
    ///
    /// VAT-shaped input is looked up by VAT number; anything else is a
    /// case-insensitive name search on the trimmed text.
    ///
    /// # Errors
    /// - `EmptyQuery` for blank input; nothing is recorded.
    /// - `NotFound` for a VAT miss.
    /// - `Directory` / `History` for collaborator failures.
    pub async fn search(&self, raw: &str) -> SearchResult<SearchOutcome> {
        let query = raw.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let target = match classify(query) {
            QueryKind::VatNumber(vat) => SearchTarget::VatNumber(vat),
            QueryKind::NamePrefix(_) | QueryKind::Empty => SearchTarget::Name(query.to_string()),
        };

        let results = match self.lookup(&target).await {
            Ok(results) => results,
            Err(err) => {
                warn!(
                    "event=search module=search status=error backend={} target={} error={}",
                    self.directory.backend_name(),
                    target_label(&target),
                    err
                );
                return Err(err);
            }
        };

        let result_count = u32::try_from(results.len()).unwrap_or(u32::MAX);
        let history_entry = self
            .history
            .record(query, result_count)
            .await
            .map_err(SearchError::History)?;

        info!(
            "event=search module=search status=ok backend={} target={} results={}",
            self.directory.backend_name(),
            target_label(&target),
            result_count
        );

        if let SearchTarget::VatNumber(vat) = &target {
            if results.is_empty() {
                return Err(SearchError::NotFound(vat.clone()));
            }
        }

        Ok(SearchOutcome {
            target,
            results,
            history_entry,
        })
    }

    /// Searches by the VAT number of a picked suggestion.
    pub async fn select_suggestion(
        &self,
        suggestion: &CompanySummary,
    ) -> SearchResult<SearchOutcome> {
        self.search(suggestion.vat_number.as_str()).await
    }

    async fn lookup(&self, target: &SearchTarget) -> SearchResult<Vec<CompanySummary>> {
        match target {
            SearchTarget::VatNumber(vat) => {
                let company = self
                    .directory
                    .find_by_vat_number(vat)
                    .await
                    .map_err(SearchError::Directory)?;
                Ok(company.iter().map(|company| company.summary()).collect())
            }
            SearchTarget::Name(name) => self
                .directory
                .find_by_name_prefix(name)
                .await
                .map_err(SearchError::Directory),
        }
    }
}

fn target_label(target: &SearchTarget) -> &'static str {
    match target {
        SearchTarget::VatNumber(_) => "vat",
        SearchTarget::Name(_) => "name",
    }
}
