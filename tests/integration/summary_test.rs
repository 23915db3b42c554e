//! End-to-end summaries against SQLite.

use super::common::{SalesDb, SALES};
use db_summary::db::Value;
use db_summary::error::ErrorKind;
use db_summary::summary::Summary;
use pretty_assertions::assert_eq;

fn fields(summary: &Summary) -> Vec<(String, Value)> {
    summary
        .record()
        .expect("expected a summary record")
        .iter()
        .map(|(alias, value)| (alias.to_string(), value.clone()))
        .collect()
}

#[tokio::test]
async fn test_summarize_numeric_and_text_columns() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let summary = catalog.summarize(SALES, "main", "ORDERS").await.unwrap();

    assert_eq!(
        fields(&summary),
        vec![
            ("AMT_count".to_string(), Value::Int(3)),
            ("AMT_min".to_string(), Value::Int(10)),
            ("AMT_max".to_string(), Value::Int(30)),
            ("AMT_avg".to_string(), Value::Float(20.0)),
            ("REGION_count".to_string(), Value::Int(3)),
            ("REGION_unique".to_string(), Value::Int(2)),
        ]
    );
}

#[tokio::test]
async fn test_summary_orders_numeric_block_first() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let summary = catalog.summarize(SALES, "main", "PRODUCTS").await.unwrap();
    let record = summary.record().unwrap();

    let aliases: Vec<&str> = record.iter().map(|(alias, _)| alias).collect();
    assert_eq!(
        aliases,
        vec![
            "PRICE_count",
            "PRICE_min",
            "PRICE_max",
            "PRICE_avg",
            "STOCK_count",
            "STOCK_min",
            "STOCK_max",
            "STOCK_avg",
            "NAME_count",
            "NAME_unique",
            "NOTES_count",
            "NOTES_unique",
        ]
    );
    assert_eq!(record.get("PRICE_min"), Some(&Value::Float(0.5)));
    assert_eq!(record.get("STOCK_avg"), Some(&Value::Float(200.0)));
    assert_eq!(record.get("NOTES_count"), Some(&Value::Int(1)));
}

#[tokio::test]
async fn test_summarize_empty_table_still_returns_record() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let summary = catalog.summarize(SALES, "main", "AUDIT_LOG").await.unwrap();

    assert_eq!(
        fields(&summary),
        vec![
            ("ENTRY_count".to_string(), Value::Int(0)),
            ("ENTRY_unique".to_string(), Value::Int(0)),
        ]
    );
}

#[tokio::test]
async fn test_summarize_reflects_new_rows() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    catalog.summarize(SALES, "main", "ORDERS").await.unwrap();
    db.execute(&["INSERT INTO ORDERS VALUES (40, 'APAC')"]).await;
    let summary = catalog.summarize(SALES, "main", "ORDERS").await.unwrap();

    let record = summary.record().unwrap();
    assert_eq!(record.get("AMT_count"), Some(&Value::Int(4)));
    assert_eq!(record.get("REGION_unique"), Some(&Value::Int(3)));
}

#[tokio::test]
async fn test_summarize_missing_table_is_invalid_target() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let err = catalog
        .summarize(SALES, "main", "FAKE_TABLE")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidTarget);
    assert!(err.message().contains("FAKE_TABLE"));
    assert_eq!(err.category(), "Invalid Target");
}

#[tokio::test]
async fn test_summarize_unknown_database_is_invalid_target() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let err = catalog.summarize("NOPE", "main", "ORDERS").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidTarget);
    assert!(err.message().contains("NOPE"));
}

#[tokio::test]
async fn test_summarize_missing_file_is_connection_failure() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();
    std::fs::remove_file(&db.path).unwrap();

    let err = catalog.summarize(SALES, "main", "ORDERS").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConnectionFailure);
    assert!(!err.message().contains("sales.db"));
}
