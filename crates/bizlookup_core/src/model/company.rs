//! Company directory records.
//!
//! # Responsibility
//! - Define the company shapes returned by directory lookups.
//! - Keep the lightweight summary used by suggestions and result rows
//!   separate from the full profile record.
//!
//! # Invariants
//! - `vat_number` is always normalized (`BE` + 10 digits).
//! - `FinancialYear` amounts are whole euros.

use crate::model::vat::VatNumber;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable directory identifier of a company.
pub type CompanyId = i64;

/// Minimal company shape for suggestions and result rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub id: CompanyId,
    pub name: String,
    pub vat_number: VatNumber,
    pub city: String,
}

/// Registered office address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

/// Public contact channels; each one may be unknown.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contact {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// Full company record shown on the overview and contact tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub vat_number: VatNumber,
    /// Legal form abbreviation, e.g. `NV` or `BV`.
    pub legal_form: String,
    /// Registry status, e.g. `Actief`.
    pub status: String,
    pub founded_date: Option<NaiveDate>,
    pub address: Address,
    #[serde(default)]
    pub contact: Contact,
}

impl Company {
    /// Projects the record to its suggestion/result-row shape.
    pub fn summary(&self) -> CompanySummary {
        CompanySummary {
            id: self.id,
            name: self.name.clone(),
            vat_number: self.vat_number.clone(),
            city: self.address.city.clone(),
        }
    }
}

/// Board member or manager of a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executive {
    pub id: i64,
    pub company_id: CompanyId,
    pub name: String,
    pub role: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Executive {
    /// An executive is active when the mandate has no end date or ends after `today`.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.end_date.map_or(true, |end| end > today)
    }
}

/// Published annual figures of a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialYear {
    pub company_id: CompanyId,
    pub year: i32,
    pub revenue: i64,
    pub profit: i64,
    pub equity: i64,
    pub employees: u32,
}

/// Company with its related rows, as stored in seed fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(flatten)]
    pub company: Company,
    #[serde(default)]
    pub executives: Vec<Executive>,
    #[serde(default)]
    pub financials: Vec<FinancialYear>,
}
