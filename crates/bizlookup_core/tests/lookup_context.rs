use bizlookup_core::{BackendKind, LookupConfig, LookupContext, RepoError};
use std::time::Duration;

fn sqlite_config(path: std::path::PathBuf) -> LookupConfig {
    let mut config = LookupConfig::default();
    config.storage.backend = BackendKind::Sqlite;
    config.storage.db_path = Some(path);
    config
}

#[tokio::test]
async fn memory_context_searches_seeded_directory() {
    let ctx = LookupContext::open(&LookupConfig::default()).unwrap();

    assert_eq!(ctx.backend(), BackendKind::Memory);
    assert_eq!(ctx.directory().backend_name(), "memory");
    let outcome = ctx.search().search("proximus").await.unwrap();
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(ctx.ledger().view().await.len(), 1);
}

#[tokio::test]
async fn sqlite_context_persists_history_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(dir.path().join("data").join("bizlookup.db"));

    {
        let ctx = LookupContext::open(&config).unwrap();
        assert_eq!(ctx.directory().backend_name(), "sqlite");
        ctx.search().search("kbc").await.unwrap();
        ctx.search().search("0403227515").await.unwrap();
    }

    let reopened = LookupContext::open(&config).unwrap();
    let queries: Vec<_> = reopened
        .ledger()
        .view()
        .await
        .into_iter()
        .map(|entry| entry.query)
        .collect();
    assert_eq!(queries, vec!["0403227515", "kbc"]);

    let matches = reopened
        .directory()
        .find_by_name_prefix("nv")
        .await
        .unwrap();
    assert_eq!(matches.len(), 7);
}

#[test]
fn sqlite_context_requires_db_path() {
    let mut config = LookupConfig::default();
    config.storage.backend = BackendKind::Sqlite;

    let err = LookupContext::open(&config).err().unwrap();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn history_settings_flow_into_ledger() {
    let mut config = LookupConfig::default();
    config.history.capacity = 4;
    config.history.view_size = 2;

    let ctx = LookupContext::open(&config).unwrap();
    assert_eq!(ctx.ledger().capacity(), 4);
    assert_eq!(ctx.ledger().view_size(), 2);
}

#[tokio::test(start_paused = true)]
async fn suggestion_fetcher_uses_configured_debounce() {
    let mut config = LookupConfig::default();
    config.search.debounce_ms = 50;
    config.search.suggestion_limit = 2;

    let ctx = LookupContext::open(&config).unwrap();
    let mut fetcher = ctx.suggestion_fetcher();
    assert_eq!(fetcher.config().debounce, Duration::from_millis(50));

    fetcher.on_input("nv");
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(fetcher.current().items.len(), 2);
}
