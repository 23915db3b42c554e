//! Metadata listings against SQLite, including cache behavior.

use super::common::{SalesDb, SALES};
use db_summary::config::CacheConfig;
use db_summary::db::ColumnDescriptor;
use db_summary::error::ErrorKind;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_list_schemas() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let schemas = catalog.list_schemas(SALES).await.unwrap();
    assert_eq!(schemas, vec!["main".to_string()]);
}

#[tokio::test]
async fn test_list_tables_sorted() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let tables = catalog.list_tables(SALES, "main").await.unwrap();
    assert_eq!(tables, vec!["AUDIT_LOG", "ORDERS", "PRODUCTS"]);
}

#[tokio::test]
async fn test_list_columns_in_declaration_order() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let columns = catalog.list_columns(SALES, "main", "PRODUCTS").await.unwrap();
    assert_eq!(
        columns,
        vec![
            ColumnDescriptor::new("NAME", "VARCHAR(40)"),
            ColumnDescriptor::new("PRICE", "FLOAT"),
            ColumnDescriptor::new("STOCK", "INT"),
            ColumnDescriptor::new("NOTES", "TEXT"),
        ]
    );
}

#[tokio::test]
async fn test_unknown_schema_is_invalid_target() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let err = catalog.list_tables(SALES, "FAKE_SCHEMA").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTarget);
    assert!(err.message().contains("FAKE_SCHEMA"));
}

#[tokio::test]
async fn test_unknown_database_is_invalid_target() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let err = catalog.list_schemas("NOPE").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTarget);
    assert!(err.message().contains("NOPE"));
}

#[tokio::test]
async fn test_listings_are_served_from_cache() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let before = catalog.list_tables(SALES, "main").await.unwrap();
    db.execute(&["CREATE TABLE REFUNDS (AMT INTEGER)"]).await;

    let cached = catalog.list_tables(SALES, "main").await.unwrap();
    assert_eq!(cached, before);

    catalog.invalidate_all();
    let refreshed = catalog.list_tables(SALES, "main").await.unwrap();
    assert_eq!(refreshed, vec!["AUDIT_LOG", "ORDERS", "PRODUCTS", "REFUNDS"]);
}

#[tokio::test]
async fn test_zero_ttl_disables_reuse() {
    let db = SalesDb::create().await;
    let catalog = db.catalog_with_cache(CacheConfig {
        ttl_secs: 0,
        max_entries: 100,
    });

    catalog.list_tables(SALES, "main").await.unwrap();
    db.execute(&["DROP TABLE AUDIT_LOG"]).await;

    let tables = catalog.list_tables(SALES, "main").await.unwrap();
    assert_eq!(tables, vec!["ORDERS", "PRODUCTS"]);
}

#[tokio::test]
async fn test_failed_listing_is_retried() {
    let db = SalesDb::create().await;
    let catalog = db.catalog();

    let err = catalog
        .list_columns(SALES, "main", "REFUNDS")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTarget);

    db.execute(&["CREATE TABLE REFUNDS (AMT INTEGER)"]).await;
    let columns = catalog.list_columns(SALES, "main", "REFUNDS").await.unwrap();
    assert_eq!(columns, vec![ColumnDescriptor::new("AMT", "INTEGER")]);
}
