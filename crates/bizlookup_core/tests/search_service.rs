mod common;

use bizlookup_core::{
    CompanyDirectory, InMemoryCompanyDirectory, InMemoryHistoryStore, SearchError,
    SearchHistoryLedger, SearchService, SearchTarget,
};
use common::{ids, BrokenHistoryStore, RecordingDirectory};
use std::sync::Arc;

fn service_with(directory: Arc<dyn CompanyDirectory>) -> SearchService {
    let ledger = SearchHistoryLedger::new(Arc::new(InMemoryHistoryStore::new()));
    SearchService::new(directory, Arc::new(ledger))
}

fn seeded_service() -> SearchService {
    service_with(Arc::new(InMemoryCompanyDirectory::seeded().unwrap()))
}

#[tokio::test]
async fn vat_search_returns_single_company_and_records_it() {
    let service = seeded_service();

    let outcome = service.search(" be 0400 378 485 ").await.unwrap();

    match &outcome.target {
        SearchTarget::VatNumber(vat) => assert_eq!(vat.as_str(), "BE0400378485"),
        other => panic!("unexpected target: {other:?}"),
    }
    assert_eq!(ids(&outcome.results), vec![1]);
    assert_eq!(outcome.history_entry.query, "be 0400 378 485");
    assert_eq!(outcome.history_entry.result_count, 1);
    assert_eq!(service.history().recent(5).await, vec![outcome.history_entry]);
}

#[tokio::test]
async fn vat_miss_is_not_found_but_still_recorded() {
    let service = seeded_service();

    let err = service.search("BE0999999999").await.unwrap_err();

    assert!(matches!(&err, SearchError::NotFound(vat) if vat.as_str() == "BE0999999999"));
    assert!(!err.is_retryable());
    let history = service.history().recent(5).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].query, "BE0999999999");
    assert_eq!(history[0].result_count, 0);
}

#[tokio::test]
async fn name_search_returns_all_matches_without_suggestion_limit() {
    let service = seeded_service();

    let outcome = service.search("NV").await.unwrap();

    assert_eq!(outcome.target, SearchTarget::Name("NV".to_string()));
    assert_eq!(outcome.results.len(), 7);
    assert_eq!(outcome.history_entry.result_count, 7);
}

#[tokio::test]
async fn single_character_and_empty_name_searches_are_recorded() {
    let service = seeded_service();

    let outcome = service.search("b").await.unwrap();
    assert_eq!(ids(&outcome.results), vec![2, 4, 6, 7]);

    let empty = service.search("nonexistent").await.unwrap();
    assert!(empty.results.is_empty());
    assert_eq!(empty.history_entry.result_count, 0);

    let queries: Vec<_> = service
        .history()
        .recent(5)
        .await
        .into_iter()
        .map(|entry| entry.query)
        .collect();
    assert_eq!(queries, vec!["nonexistent", "b"]);
}

#[tokio::test]
async fn blank_query_is_rejected_without_recording() {
    let service = seeded_service();

    assert!(matches!(
        service.search(" \t ").await.unwrap_err(),
        SearchError::EmptyQuery
    ));
    assert!(service.history().recent(5).await.is_empty());
}

#[tokio::test]
async fn directory_failure_is_retryable_and_not_recorded() {
    let service = service_with(Arc::new(RecordingDirectory::unavailable()));

    let vat_err = service.search("0400378485").await.unwrap_err();
    assert!(matches!(vat_err, SearchError::Directory(_)));
    assert!(vat_err.is_retryable());

    let name_err = service.search("colruyt").await.unwrap_err();
    assert!(matches!(name_err, SearchError::Directory(_)));
    assert!(service.history().recent(5).await.is_empty());
}

#[tokio::test]
async fn history_failure_surfaces_as_history_error() {
    let directory = Arc::new(InMemoryCompanyDirectory::seeded().unwrap());
    let ledger = Arc::new(SearchHistoryLedger::new(Arc::new(BrokenHistoryStore)));
    let service = SearchService::new(directory, ledger);

    let err = service.search("kbc").await.unwrap_err();
    assert!(matches!(err, SearchError::History(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn selecting_a_suggestion_searches_by_its_vat_number() {
    let service = seeded_service();
    let suggestion = service.search("umicore").await.unwrap().results[0].clone();

    let outcome = service.select_suggestion(&suggestion).await.unwrap();

    assert_eq!(
        outcome.target,
        SearchTarget::VatNumber(suggestion.vat_number.clone())
    );
    assert_eq!(ids(&outcome.results), vec![5]);
    assert_eq!(outcome.history_entry.query, "BE0401574852");
}

#[tokio::test]
async fn outcome_serializes_target_tag() {
    let service = seeded_service();
    let outcome = service.search("0473191041").await.unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["target"]["by"], "vat_number");
    assert_eq!(json["target"]["value"], "BE0473191041");
    assert_eq!(json["results"][0]["name"], "Barco NV");
}
