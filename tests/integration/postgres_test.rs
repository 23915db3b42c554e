//! PostgreSQL end-to-end tests.
//!
//! These tests require a running PostgreSQL database and are skipped unless
//! DATABASE_URL is set. Each test creates and drops its own table.

use db_summary::catalog::Catalog;
use db_summary::config::Config;
use db_summary::db::Value;
use db_summary::error::ErrorKind;
use sqlx::{Connection, PgConnection};

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Builds a catalog and returns it with the database name it targets.
fn get_test_catalog(url: &str) -> (Catalog, String) {
    let mut config = Config::default();
    config.apply_url(url).unwrap();
    let database = config
        .connection
        .database
        .clone()
        .unwrap_or_else(|| "postgres".to_string());
    (Catalog::from_config(&config), database)
}

async fn run_sql(url: &str, statements: &[&str]) {
    let mut conn = PgConnection::connect(url).await.unwrap();
    for statement in statements {
        sqlx::query(statement).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_summarize_round_trip() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    run_sql(
        &url,
        &[
            "DROP TABLE IF EXISTS dbsummary_orders",
            "CREATE TABLE dbsummary_orders (amt integer, region varchar(10))",
            "INSERT INTO dbsummary_orders VALUES (10, 'EU'), (20, 'US'), (30, 'EU')",
        ],
    )
    .await;
    let (catalog, database) = get_test_catalog(&url);

    let summary = catalog
        .summarize(&database, "public", "dbsummary_orders")
        .await;
    run_sql(&url, &["DROP TABLE dbsummary_orders"]).await;

    let summary = summary.unwrap();
    let record = summary.record().unwrap();
    assert_eq!(record.get("amt_count"), Some(&Value::Int(3)));
    assert_eq!(record.get("amt_min"), Some(&Value::Int(10)));
    assert_eq!(record.get("amt_max"), Some(&Value::Int(30)));
    assert_eq!(record.get("amt_avg"), Some(&Value::Float(20.0)));
    assert_eq!(record.get("region_unique"), Some(&Value::Int(2)));
}

#[tokio::test]
async fn test_list_columns_includes_comments() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    run_sql(
        &url,
        &[
            "DROP TABLE IF EXISTS dbsummary_products",
            "CREATE TABLE dbsummary_products (name text, price double precision)",
            "COMMENT ON COLUMN dbsummary_products.name IS 'product name'",
        ],
    )
    .await;
    let (catalog, database) = get_test_catalog(&url);

    let columns = catalog
        .list_columns(&database, "public", "dbsummary_products")
        .await;
    run_sql(&url, &["DROP TABLE dbsummary_products"]).await;

    let columns = columns.unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].name, "name");
    assert_eq!(columns[0].comment.as_deref(), Some("product name"));
    assert_eq!(columns[1].declared_type, "double precision");
    assert_eq!(columns[1].comment, None);
}

#[tokio::test]
async fn test_missing_objects_are_invalid_targets() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let (catalog, database) = get_test_catalog(&url);

    let err = catalog
        .summarize(&database, "public", "fake_table_xyz")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTarget);
    assert!(err.message().contains("fake_table_xyz"));

    let err = catalog
        .list_tables(&database, "no_such_schema_xyz")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTarget);

    let err = catalog
        .list_schemas("no_such_database_xyz")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTarget);
    assert!(err.message().contains("no_such_database_xyz"));
}

#[tokio::test]
async fn test_list_schemas_includes_public() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let (catalog, database) = get_test_catalog(&url);

    let schemas = catalog.list_schemas(&database).await.unwrap();
    assert!(schemas.iter().any(|s| s == "public"));
}
