//! Company profile assembly for the overview, executives, financials and
//! contact tabs.
//!
//! # Invariants
//! - Financial years are ordered by ascending year.
//! - Executives without an end date come first, then by start date descending.

use crate::model::company::{Company, CompanyId, Executive, FinancialYear};
use crate::model::vat::VatNumber;
use crate::repo::company_repo::CompanyDirectory;
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::cmp::Reverse;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type ProfileResult<T> = Result<T, ProfileError>;

/// Failure to assemble a company profile.
#[derive(Debug)]
pub enum ProfileError {
    CompanyNotFound(CompanyId),
    VatNotFound(VatNumber),
    Repo(RepoError),
}

impl Display for ProfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CompanyNotFound(id) => write!(f, "company not found: {id}"),
            Self::VatNotFound(vat) => write!(f, "no company found with VAT number {vat}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProfileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProfileError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Headline figure tracked across financial years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Revenue,
    Profit,
    Equity,
    Employees,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Revenue,
        Metric::Profit,
        Metric::Equity,
        Metric::Employees,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Profit => "profit",
            Self::Equity => "equity",
            Self::Employees => "employees",
        }
    }

    pub fn value_of(self, year: &FinancialYear) -> i64 {
        match self {
            Self::Revenue => year.revenue,
            Self::Profit => year.profit,
            Self::Equity => year.equity,
            Self::Employees => i64::from(year.employees),
        }
    }
}

/// Latest value of one metric and its change against the year before.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSnapshot {
    pub metric: Metric,
    pub year: i32,
    pub value: i64,
    /// Percent change; `None` without a previous year or when it was zero.
    pub change_pct: Option<f64>,
}

/// Everything shown on a company profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyProfile {
    pub company: Company,
    pub executives: Vec<Executive>,
    pub financials: Vec<FinancialYear>,
}

impl CompanyProfile {
    /// Assembles a profile, normalizing the order of related rows.
    pub fn new(
        company: Company,
        mut executives: Vec<Executive>,
        mut financials: Vec<FinancialYear>,
    ) -> Self {
        executives.sort_by_key(|exec| (exec.end_date.is_some(), Reverse(exec.start_date)));
        financials.sort_by_key(|year| year.year);
        Self {
            company,
            executives,
            financials,
        }
    }

    /// Executives whose mandate is still running on `today`.
    pub fn active_executives(&self, today: NaiveDate) -> Vec<&Executive> {
        self.executives
            .iter()
            .filter(|exec| exec.is_active_on(today))
            .collect()
    }

    pub fn latest_year(&self) -> Option<&FinancialYear> {
        self.financials.last()
    }

    /// Latest value and year-over-year change for every [`Metric`].
    ///
    /// Empty when no financial year is known.
    pub fn latest_metrics(&self) -> Vec<MetricSnapshot> {
        let Some(latest) = self.latest_year() else {
            return Vec::new();
        };
        let previous = self
            .financials
            .len()
            .checked_sub(2)
            .and_then(|index| self.financials.get(index));

        Metric::ALL
            .iter()
            .map(|&metric| {
                let value = metric.value_of(latest);
                MetricSnapshot {
                    metric,
                    year: latest.year,
                    value,
                    change_pct: previous
                        .map(|prev| metric.value_of(prev))
                        .and_then(|prev| percent_change(prev, value)),
                }
            })
            .collect()
    }
}

/// Percent change from `previous` to `current`, relative to `|previous|`.
pub fn percent_change(previous: i64, current: i64) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    let delta = i128::from(current) - i128::from(previous);
    Some(delta as f64 / previous.unsigned_abs() as f64 * 100.0)
}

/// Loads company profiles from a directory.
pub struct CompanyProfileService {
    directory: Arc<dyn CompanyDirectory>,
}

impl CompanyProfileService {
    pub fn new(directory: Arc<dyn CompanyDirectory>) -> Self {
        Self { directory }
    }

    /// Loads one profile by directory id.
    pub async fn load(&self, id: CompanyId) -> ProfileResult<CompanyProfile> {
        let company = self
            .directory
            .get_company(id)
            .await?
            .ok_or(ProfileError::CompanyNotFound(id))?;
        self.assemble(company).await
    }

    /// Resolves a VAT number and loads its profile.
    pub async fn load_by_vat(&self, vat: &VatNumber) -> ProfileResult<CompanyProfile> {
        let company = self
            .directory
            .find_by_vat_number(vat)
            .await?
            .ok_or_else(|| ProfileError::VatNotFound(vat.clone()))?;
        self.assemble(company).await
    }

    async fn assemble(&self, company: Company) -> ProfileResult<CompanyProfile> {
        let executives = self.directory.list_executives(company.id).await?;
        let financials = self.directory.list_financials(company.id).await?;
        info!(
            "event=profile_load module=profile status=ok backend={} company_id={} executives={} years={}",
            self.directory.backend_name(),
            company.id,
            executives.len(),
            financials.len()
        );
        Ok(CompanyProfile::new(company, executives, financials))
    }
}

#[cfg(test)]
mod tests {
    use super::percent_change;

    #[test]
    fn percent_change_handles_zero_and_negative_baselines() {
        assert_eq!(percent_change(0, 10), None);
        assert_eq!(percent_change(100, 150), Some(50.0));
        assert_eq!(percent_change(200, 100), Some(-50.0));
        assert_eq!(percent_change(-100, -50), Some(50.0));
    }

    #[test]
    fn percent_change_spans_the_full_i64_range() {
        let up = percent_change(i64::MIN, i64::MAX).unwrap();
        assert!((up - 200.0).abs() < 1e-9);
        let down = percent_change(i64::MAX, i64::MIN).unwrap();
        assert!((down + 200.0).abs() < 1e-9);
        assert_eq!(percent_change(1, i64::MAX), Some((i64::MAX - 1) as f64 * 100.0));
    }
}
