//! Shared fixtures: a seeded SQLite database and a catalog over it.

use db_summary::catalog::Catalog;
use db_summary::config::{CacheConfig, Config};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Logical name the fixture database is registered under.
pub const SALES: &str = "SALES";

/// A temporary SQLite database with a few tables.
pub struct SalesDb {
    // Held so the directory outlives the test.
    _dir: TempDir,
    pub path: PathBuf,
}

impl SalesDb {
    pub async fn create() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.db");

        run_sql(
            &path,
            &[
                "CREATE TABLE ORDERS (AMT INTEGER, REGION TEXT)",
                "INSERT INTO ORDERS VALUES (10, 'EU'), (20, 'US'), (30, 'EU')",
                "CREATE TABLE PRODUCTS (NAME VARCHAR(40), PRICE FLOAT, STOCK INT, NOTES TEXT)",
                "INSERT INTO PRODUCTS VALUES ('bolt', 0.5, 100, NULL), ('nut', 1.5, 300, 'bulk')",
                "CREATE TABLE AUDIT_LOG (ENTRY TEXT)",
            ],
        )
        .await;

        Self { _dir: dir, path }
    }

    /// Configuration registering this file as the only SQLite database.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config
            .apply_url(&format!("sqlite://{}", self.path.display()))
            .unwrap();
        config.sqlite.databases.clear();
        config
            .sqlite
            .databases
            .insert(SALES.to_string(), self.path.clone());
        config.connection.database = Some(SALES.to_string());
        config
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::from_config(&self.config())
    }

    pub fn catalog_with_cache(&self, cache: CacheConfig) -> Catalog {
        let mut config = self.config();
        config.cache = cache;
        Catalog::from_config(&config)
    }

    /// Runs statements on a separate, writable connection.
    pub async fn execute(&self, statements: &[&str]) {
        run_sql(&self.path, statements).await;
    }
}

async fn run_sql(path: &Path, statements: &[&str]) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
    for statement in statements {
        sqlx::query(statement).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();
}
