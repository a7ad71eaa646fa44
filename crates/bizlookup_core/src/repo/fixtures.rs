//! Embedded seed data for the mock directory fallback.

use crate::model::company::CompanyRecord;
use crate::repo::{RepoError, RepoResult};

const COMPANIES_JSON: &str = include_str!("fixtures/companies.json");

/// Parses the bundled company records.
///
/// # Errors
/// - `InvalidData` when the bundled JSON does not match the model, e.g. a
///   malformed VAT number.
pub fn seed_companies() -> RepoResult<Vec<CompanyRecord>> {
    parse_company_records(COMPANIES_JSON)
}

/// Parses company records from a JSON array.
pub fn parse_company_records(raw: &str) -> RepoResult<Vec<CompanyRecord>> {
    serde_json::from_str(raw)
        .map_err(|err| RepoError::InvalidData(format!("company fixtures: {err}")))
}
