mod common;

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::json;

use common::{workbook, workbook_json, InMemoryStore};
use folio_sync::errors::AppError;
use folio_sync::ingestion::{JsonWorkbook, Normalizer, SourceError, SourceLayout};
use folio_sync::services::{run_migration, run_options_reimport, ImportMode, MigrationOptions};

fn options(mode: Option<ImportMode>) -> MigrationOptions {
    MigrationOptions {
        mode,
        cancel_window: Duration::ZERO,
    }
}

async fn migrate(store: &InMemoryStore, mode: Option<ImportMode>) -> Result<folio_sync::services::MigrationSummary, AppError> {
    run_migration(
        store,
        &workbook(),
        &SourceLayout::default(),
        &Normalizer::default(),
        &options(mode),
    )
    .await
}

#[tokio::test]
async fn test_migration_populates_every_table() {
    let store = InMemoryStore::new();

    let summary = migrate(&store, None).await.unwrap();

    assert_eq!(summary.table_ids.len(), 8);
    assert_eq!(summary.symbols, 4);
    assert_eq!(summary.transactions, 3);
    assert_eq!(summary.deposits, 3);
    assert_eq!(summary.deposit_months, 2);
    assert_eq!(summary.options_wheel, 2);
    assert_eq!(summary.options_leaps, 1);
    assert_eq!(summary.options_total(), 3);
    assert_eq!(summary.snapshots, 2);
    assert_eq!(summary.settings, 4);

    assert!(store.records_by_title("dividends").is_empty());
    assert!(store.records_by_title("price_history").is_empty());
}

#[tokio::test]
async fn test_migrated_records_are_normalized() {
    let store = InMemoryStore::new();
    migrate(&store, None).await.unwrap();

    let symbols = store.records_by_title("symbols");
    let tickers: Vec<_> = symbols.iter().map(|s| s["symbol"].clone()).collect();
    assert_eq!(tickers, vec![json!("AAPL"), json!("MSFT"), json!("NVDA"), json!("TSLA")]);
    assert_eq!(symbols[1]["name"], json!("Microsoft"));
    assert_eq!(symbols[1]["sector"], json!("Technology"));
    assert_eq!(symbols[1]["strategy"], json!("Value"));
    assert_eq!(symbols[2]["sector"], json!(null));

    let transactions = store.records_by_title("transactions");
    assert_eq!(transactions[0]["platform"], json!("Robinhood"));
    assert_eq!(transactions[1]["type"], json!("Sell"));
    assert_eq!(transactions[1]["shares"], json!(4.0));
    assert_eq!(transactions[1]["date"], json!("2024-02-16"));
    assert_eq!(transactions[2]["platform"], json!("eToro"));

    let deposits = store.records_by_title("deposits");
    let platforms: Vec<_> = deposits.iter().map(|d| d["platform"].clone()).collect();
    assert_eq!(platforms, vec![json!("IBKR"), json!("Trading 212"), json!("Robinhood")]);
    assert_eq!(deposits[2]["month"], json!("2024-02-01"));

    let options = store.records_by_title("options");
    assert_eq!(options[0]["strategy_type"], json!("Wheel"));
    assert_eq!(options[0]["call_put"], json!("Put"));
    assert_eq!(options[0]["status"], json!("Closed"));
    assert_eq!(options[1]["strategy_type"], json!("VPCS"));
    assert_eq!(options[2]["ticker"], json!("MSFT"));
    assert_eq!(options[2]["strategy_type"], json!("LEAPS"));
    assert_eq!(options[2]["collateral"], json!(null));
    assert_eq!(options[2]["platform"], json!("IBKR"));

    let snapshots = store.records_by_title("monthly_snapshots");
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[1]["gain_loss_pct"], json!(-5.0));
    assert_eq!(snapshots[1]["total_deposits"], json!(2000.0));
}

#[tokio::test]
async fn test_populated_tables_require_a_mode() {
    let store = InMemoryStore::new();
    migrate(&store, None).await.unwrap();
    let inserts = store.insert_calls();

    let err = migrate(&store, None).await.unwrap_err();

    match err {
        AppError::ExistingData { tables } => {
            assert!(tables.contains(&"symbols".to_string()));
            assert!(tables.contains(&"settings".to_string()));
            assert!(!tables.contains(&"dividends".to_string()));
        }
        other => panic!("expected ExistingData, got {other:?}"),
    }
    assert_eq!(store.insert_calls(), inserts);
    assert_eq!(store.records_by_title("symbols").len(), 4);
}

#[tokio::test]
async fn test_replace_mode_purges_before_import() {
    let store = InMemoryStore::new();
    migrate(&store, None).await.unwrap();

    let summary = migrate(&store, Some(ImportMode::Replace)).await.unwrap();

    assert_eq!(summary.purged, 4 + 3 + 3 + 3 + 2 + 4);
    assert_eq!(store.records_by_title("symbols").len(), 4);
    assert_eq!(store.records_by_title("settings").len(), 4);
    assert_eq!(store.records_by_title("deposits").len(), 3);
}

#[tokio::test]
async fn test_append_mode_adds_to_existing() {
    let store = InMemoryStore::new();
    migrate(&store, None).await.unwrap();

    migrate(&store, Some(ImportMode::Append)).await.unwrap();

    assert_eq!(store.records_by_title("symbols").len(), 8);
    assert_eq!(store.records_by_title("settings").len(), 8);
}

#[tokio::test]
async fn test_missing_source_table_fails_before_any_write() {
    let mut raw = workbook_json();
    raw["sheets"][1]["tables"]
        .as_array_mut()
        .unwrap()
        .retain(|t| t["name"] != json!("Deposited"));
    let source = JsonWorkbook::from_value(raw).unwrap();
    let store = InMemoryStore::new();

    let err = run_migration(
        &store,
        &source,
        &SourceLayout::default(),
        &Normalizer::default(),
        &options(None),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Source(SourceError::TableNotFound { .. })));
    assert_eq!(store.table_count(), 0);
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn test_missing_reference_table_degrades() {
    let mut raw = workbook_json();
    raw["sheets"].as_array_mut().unwrap().remove(0);
    let source = JsonWorkbook::from_value(raw).unwrap();
    let store = InMemoryStore::new();

    let summary = run_migration(
        &store,
        &source,
        &SourceLayout::default(),
        &Normalizer::default(),
        &options(None),
    )
    .await
    .unwrap();

    assert_eq!(summary.symbols, 4);
    let symbols = store.records_by_title("symbols");
    assert!(symbols.iter().all(|s| s["sector"].is_null()));
}

#[tokio::test]
async fn test_options_reimport_replaces_table() {
    let store = InMemoryStore::new();
    let table = store.add_table("options");
    store.seed(&table, (0..5).map(|i| json!({"ticker": format!("OLD{i}")})).collect());

    let summary = run_options_reimport(
        &store,
        &workbook(),
        &SourceLayout::default(),
        &Normalizer::default(),
        &table,
    )
    .await
    .unwrap();

    assert_eq!(summary.deleted, 5);
    assert_eq!(summary.inserted, 3);
    assert_eq!((summary.wheel, summary.leaps), (2, 1));
    let expected: BTreeMap<String, usize> = [("LEAPS", 1), ("VPCS", 1), ("Wheel", 1)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    assert_eq!(summary.strategies, expected);

    let stored = store.records(&table);
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[1]["outer_strike"], json!(650.0));
    assert_eq!(stored[0]["commission"], json!(1.05));
}
