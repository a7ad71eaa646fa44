//! Company Directory contract and its two implementations.
//!
//! # Responsibility
//! - Define the read contract the search, suggestion and profile code needs.
//! - Provide the seeded in-memory mock and the SQLite-backed directory.
//!
//! # Invariants
//! - Name lookups are Unicode case-insensitive substring matches ordered by
//!   company id, identical across implementations.
//! - A blank name query yields an empty list without touching storage.
//! - SQLite work runs on the blocking pool; guards never cross an `.await`.

use crate::db::SharedConnection;
use crate::model::company::{
    Address, Company, CompanyId, CompanyRecord, CompanySummary, Contact, Executive, FinancialYear,
};
use crate::model::vat::VatNumber;
use crate::repo::{on_connection, RepoError, RepoResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::time::Duration;

const DATE_FORMAT: &str = "%Y-%m-%d";

const COMPANY_SELECT_SQL: &str = "SELECT
    id,
    name,
    vat_number,
    legal_form,
    status,
    founded_date,
    street,
    street_number,
    postal_code,
    city,
    country,
    email,
    phone,
    website
FROM companies";

/// Read contract of the Company Directory Service.
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    /// Short backend label used in log events.
    fn backend_name(&self) -> &'static str;

    /// Looks up one company by normalized VAT number.
    async fn find_by_vat_number(&self, vat: &VatNumber) -> RepoResult<Option<Company>>;

    /// Returns companies whose name contains `prefix`, ignoring case.
    async fn find_by_name_prefix(&self, prefix: &str) -> RepoResult<Vec<CompanySummary>>;

    /// Looks up one company by directory id.
    async fn get_company(&self, id: CompanyId) -> RepoResult<Option<Company>>;

    /// Lists executives of one company in storage order.
    async fn list_executives(&self, company_id: CompanyId) -> RepoResult<Vec<Executive>>;

    /// Lists financial years of one company in storage order.
    async fn list_financials(&self, company_id: CompanyId) -> RepoResult<Vec<FinancialYear>>;
}

/// Mock directory over records held in memory.
///
/// Optional latency imitates a remote service round trip.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCompanyDirectory {
    records: Vec<CompanyRecord>,
    latency: Duration,
}

impl InMemoryCompanyDirectory {
    pub fn new(mut records: Vec<CompanyRecord>) -> Self {
        records.sort_by_key(|record| record.company.id);
        Self {
            records,
            latency: Duration::ZERO,
        }
    }

    /// Builds the directory from the bundled fixtures.
    pub fn seeded() -> RepoResult<Self> {
        Ok(Self::new(super::fixtures::seed_companies()?))
    }

    /// Delays every lookup by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn record(&self, id: CompanyId) -> Option<&CompanyRecord> {
        self.records.iter().find(|record| record.company.id == id)
    }
}

#[async_trait]
impl CompanyDirectory for InMemoryCompanyDirectory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find_by_vat_number(&self, vat: &VatNumber) -> RepoResult<Option<Company>> {
        self.round_trip().await;
        Ok(self
            .records
            .iter()
            .find(|record| &record.company.vat_number == vat)
            .map(|record| record.company.clone()))
    }

    async fn find_by_name_prefix(&self, prefix: &str) -> RepoResult<Vec<CompanySummary>> {
        self.round_trip().await;
        let needle = prefix.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .records
            .iter()
            .filter(|record| record.company.name.to_lowercase().contains(&needle))
            .map(|record| record.company.summary())
            .collect())
    }

    async fn get_company(&self, id: CompanyId) -> RepoResult<Option<Company>> {
        self.round_trip().await;
        Ok(self.record(id).map(|record| record.company.clone()))
    }

    async fn list_executives(&self, company_id: CompanyId) -> RepoResult<Vec<Executive>> {
        self.round_trip().await;
        Ok(self
            .record(company_id)
            .map(|record| record.executives.clone())
            .unwrap_or_default())
    }

    async fn list_financials(&self, company_id: CompanyId) -> RepoResult<Vec<FinancialYear>> {
        self.round_trip().await;
        Ok(self
            .record(company_id)
            .map(|record| record.financials.clone())
            .unwrap_or_default())
    }
}

/// SQLite-backed directory.
pub struct SqliteCompanyDirectory {
    conn: SharedConnection,
}

impl SqliteCompanyDirectory {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Counts stored companies.
    pub fn company_count(&self) -> RepoResult<u64> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM companies;", [], |row| {
            row.get::<_, i64>(0)
        })?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative company count {count}")))
    }

    /// Inserts or replaces one company together with its related rows.
    ///
    /// Executives and financial years of the company are replaced as a whole.
    pub fn upsert_record(&self, record: &CompanyRecord) -> RepoResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        write_record(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    /// Writes `records` when the directory holds no company yet.
    ///
    /// Returns the number of records written (0 when already populated).
    pub fn seed_if_empty(&self, records: &[CompanyRecord]) -> RepoResult<usize> {
        if self.company_count()? > 0 {
            return Ok(0);
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for record in records {
            write_record(&tx, record)?;
        }
        tx.commit()?;

        info!(
            "event=directory_seed module=repo status=ok backend=sqlite companies={}",
            records.len()
        );
        Ok(records.len())
    }
}

#[async_trait]
impl CompanyDirectory for SqliteCompanyDirectory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn find_by_vat_number(&self, vat: &VatNumber) -> RepoResult<Option<Company>> {
        let vat = vat.as_str().to_string();
        on_connection(&self.conn, move |conn| query_company(conn, "vat_number = ?1", &vat)).await
    }

    async fn find_by_name_prefix(&self, prefix: &str) -> RepoResult<Vec<CompanySummary>> {
        let needle = prefix.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        on_connection(&self.conn, move |conn| query_by_name(conn, &needle)).await
    }

    async fn get_company(&self, id: CompanyId) -> RepoResult<Option<Company>> {
        on_connection(&self.conn, move |conn| query_company(conn, "id = ?1", &id)).await
    }

    async fn list_executives(&self, company_id: CompanyId) -> RepoResult<Vec<Executive>> {
        on_connection(&self.conn, move |conn| query_executives(conn, company_id)).await
    }

    async fn list_financials(&self, company_id: CompanyId) -> RepoResult<Vec<FinancialYear>> {
        on_connection(&self.conn, move |conn| query_financials(conn, company_id)).await
    }
}

fn query_company(
    conn: &Connection,
    sql_filter: &str,
    value: &dyn ToSql,
) -> RepoResult<Option<Company>> {
    let mut stmt = conn.prepare(&format!("{COMPANY_SELECT_SQL} WHERE {sql_filter};"))?;
    let row = stmt
        .query_row([value], |row| Ok(parse_company_row(row)))
        .optional()?;
    row.transpose()
}

// `needle` is already lowercased; `unicode_lower` is registered by `open_db`.
fn query_by_name(conn: &Connection, needle: &str) -> RepoResult<Vec<CompanySummary>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, vat_number, city
         FROM companies
         WHERE instr(unicode_lower(name), ?1) > 0
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([needle])?;
    let mut summaries = Vec::new();
    while let Some(row) = rows.next()? {
        summaries.push(CompanySummary {
            id: row.get("id")?,
            name: row.get("name")?,
            vat_number: parse_vat(row.get("vat_number")?)?,
            city: row.get("city")?,
        });
    }
    Ok(summaries)
}

fn query_executives(conn: &Connection, company_id: CompanyId) -> RepoResult<Vec<Executive>> {
    let mut stmt = conn.prepare(
        "SELECT id, company_id, name, role, start_date, end_date
         FROM executives
         WHERE company_id = ?1
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([company_id])?;
    let mut executives = Vec::new();
    while let Some(row) = rows.next()? {
        executives.push(Executive {
            id: row.get("id")?,
            company_id: row.get("company_id")?,
            name: row.get("name")?,
            role: row.get("role")?,
            start_date: parse_date(row.get("start_date")?)?,
            end_date: parse_optional_date(row.get("end_date")?)?,
        });
    }
    Ok(executives)
}

fn query_financials(conn: &Connection, company_id: CompanyId) -> RepoResult<Vec<FinancialYear>> {
    let mut stmt = conn.prepare(
        "SELECT company_id, year, revenue, profit, equity, employees
         FROM financial_years
         WHERE company_id = ?1
         ORDER BY year ASC;",
    )?;
    let mut rows = stmt.query([company_id])?;
    let mut years = Vec::new();
    while let Some(row) = rows.next()? {
        let employees: i64 = row.get("employees")?;
        years.push(FinancialYear {
            company_id: row.get("company_id")?,
            year: row.get("year")?,
            revenue: row.get("revenue")?,
            profit: row.get("profit")?,
            equity: row.get("equity")?,
            employees: u32::try_from(employees).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid employees value `{employees}` in financial_years.employees"
                ))
            })?,
        });
    }
    Ok(years)
}

fn write_record(conn: &Connection, record: &CompanyRecord) -> RepoResult<()> {
    let company = &record.company;
    conn.execute(
        "INSERT OR REPLACE INTO companies (
            id,
            name,
            vat_number,
            legal_form,
            status,
            founded_date,
            street,
            street_number,
            postal_code,
            city,
            country,
            email,
            phone,
            website
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
        params![
            company.id,
            company.name.as_str(),
            company.vat_number.as_str(),
            company.legal_form.as_str(),
            company.status.as_str(),
            company.founded_date.map(format_date),
            company.address.street.as_str(),
            company.address.number.as_str(),
            company.address.postal_code.as_str(),
            company.address.city.as_str(),
            company.address.country.as_str(),
            company.contact.email.as_deref(),
            company.contact.phone.as_deref(),
            company.contact.website.as_deref(),
        ],
    )?;

    conn.execute("DELETE FROM executives WHERE company_id = ?1;", [company.id])?;
    for executive in &record.executives {
        conn.execute(
            "INSERT INTO executives (id, company_id, name, role, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                executive.id,
                company.id,
                executive.name.as_str(),
                executive.role.as_str(),
                format_date(executive.start_date),
                executive.end_date.map(format_date),
            ],
        )?;
    }

    conn.execute("DELETE FROM financial_years WHERE company_id = ?1;", [company.id])?;
    for year in &record.financials {
        conn.execute(
            "INSERT INTO financial_years (company_id, year, revenue, profit, equity, employees)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                company.id,
                year.year,
                year.revenue,
                year.profit,
                year.equity,
                i64::from(year.employees),
            ],
        )?;
    }

    Ok(())
}

fn parse_company_row(row: &Row<'_>) -> RepoResult<Company> {
    Ok(Company {
        id: row.get("id")?,
        name: row.get("name")?,
        vat_number: parse_vat(row.get("vat_number")?)?,
        legal_form: row.get("legal_form")?,
        status: row.get("status")?,
        founded_date: parse_optional_date(row.get("founded_date")?)?,
        address: Address {
            street: row.get("street")?,
            number: row.get("street_number")?,
            postal_code: row.get("postal_code")?,
            city: row.get("city")?,
            country: row.get("country")?,
        },
        contact: Contact {
            email: row.get("email")?,
            phone: row.get("phone")?,
            website: row.get("website")?,
        },
    })
}

fn parse_vat(value: String) -> RepoResult<VatNumber> {
    VatNumber::parse(&value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid vat number `{value}` in companies.vat_number"))
    })
}

fn parse_date(value: String) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}`")))
}

fn parse_optional_date(value: Option<String>) -> RepoResult<Option<NaiveDate>> {
    value.map(parse_date).transpose()
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
