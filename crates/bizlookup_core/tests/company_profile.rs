use bizlookup_core::db::{open_db_in_memory, share};
use bizlookup_core::repo::fixtures::seed_companies;
use bizlookup_core::{
    CompanyProfileService, InMemoryCompanyDirectory, Metric, ProfileError, SqliteCompanyDirectory,
};
use chrono::NaiveDate;
use std::sync::Arc;

fn memory_profiles() -> CompanyProfileService {
    CompanyProfileService::new(Arc::new(InMemoryCompanyDirectory::seeded().unwrap()))
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("change should be known");
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn profile_orders_executives_current_first() {
    let profile = memory_profiles().load(1).await.unwrap();

    let names: Vec<_> = profile
        .executives
        .iter()
        .map(|exec| exec.name.as_str())
        .collect();
    assert_eq!(names, vec!["Stefan Goethaert", "Jef Colruyt", "Frans Colruyt"]);

    let active: Vec<_> = profile
        .active_executives(date("2025-01-01"))
        .into_iter()
        .map(|exec| exec.name.as_str())
        .collect();
    assert_eq!(active, vec!["Stefan Goethaert", "Jef Colruyt"]);
    assert_eq!(profile.active_executives(date("2023-09-29")).len(), 3);
}

#[tokio::test]
async fn latest_metrics_compare_against_previous_year() {
    let profile = memory_profiles().load(1).await.unwrap();

    assert_eq!(profile.latest_year().map(|year| year.year), Some(2023));
    let metrics = profile.latest_metrics();
    assert_eq!(metrics.len(), Metric::ALL.len());

    let revenue = metrics[0];
    assert_eq!(revenue.metric, Metric::Revenue);
    assert_eq!(revenue.year, 2023);
    assert_eq!(revenue.value, 10_843_000_000);
    assert_close(revenue.change_pct, 4.0096);

    let employees = metrics[3];
    assert_eq!(employees.metric, Metric::Employees);
    assert_eq!(employees.value, 33_000);
    assert_close(employees.change_pct, -1.1976);
}

#[tokio::test]
async fn single_year_and_missing_financials_have_no_change() {
    let profiles = memory_profiles();

    let umicore = profiles.load(5).await.unwrap();
    assert!(umicore
        .latest_metrics()
        .iter()
        .all(|snapshot| snapshot.change_pct.is_none()));

    let bpost = profiles.load(7).await.unwrap();
    assert!(bpost.financials.is_empty());
    assert!(bpost.latest_metrics().is_empty());
}

#[tokio::test]
async fn load_by_vat_resolves_company() {
    let profile = memory_profiles()
        .load_by_vat(&"BE0417497106".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(profile.company.id, 2);
    assert_eq!(profile.company.name, "Anheuser-Busch InBev NV");
}

#[tokio::test]
async fn unknown_company_is_reported() {
    let profiles = memory_profiles();

    assert!(matches!(
        profiles.load(999).await.unwrap_err(),
        ProfileError::CompanyNotFound(999)
    ));
    let err = profiles
        .load_by_vat(&"0999999999".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ProfileError::VatNotFound(_)));
    assert!(err.to_string().contains("BE0999999999"));
}

#[tokio::test]
async fn sqlite_and_memory_profiles_match() {
    let directory = SqliteCompanyDirectory::new(share(open_db_in_memory().unwrap()));
    directory.seed_if_empty(&seed_companies().unwrap()).unwrap();
    let sqlite = CompanyProfileService::new(Arc::new(directory));
    let memory = memory_profiles();

    for id in 1..=7 {
        assert_eq!(sqlite.load(id).await.unwrap(), memory.load(id).await.unwrap());
    }
}
