//! Database abstraction layer for db-summary.
//!
//! A [`ConnectionProvider`] hands out one [`DatabaseConnection`] per call,
//! scoped to a database. Backends implement both traits; the rest of the
//! crate only ever talks to them through trait objects.

mod error;
mod mock;
mod postgres;
mod sqlite;
mod types;

pub use error::{classify, database_error_kind, DbError, ObjectKind};
pub use mock::{MockFailure, MockProvider, MockTable};
pub use postgres::PostgresProvider;
pub use sqlite::SqliteProvider;
pub use types::{ColumnDescriptor, QueryResult, Row, TableRef, Value};

use crate::config::{Config, QueryConfig};
use crate::error::{ErrorContext, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Result type for raw data-access operations.
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

/// Creates the connection provider for the configured backend.
///
/// This is the central factory function for database access. Nothing is
/// connected here; connections are opened per call by the provider.
pub fn provider_for(config: &Config) -> Arc<dyn ConnectionProvider> {
    match config.connection.backend {
        DatabaseBackend::Postgres => Arc::new(PostgresProvider::new(
            config.connection.clone(),
            config.query.clone(),
        )),
        DatabaseBackend::Sqlite => Arc::new(SqliteProvider::new(
            config.sqlite.databases.clone(),
            config.query.clone(),
        )),
    }
}

/// Obtains live connections to the target database.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Opens a connection, optionally overriding the configured database.
    async fn acquire(&self, database: Option<&str>) -> DbResult<Box<dyn DatabaseConnection>>;
}

/// A single live connection, owned by exactly one call.
#[async_trait]
pub trait DatabaseConnection: Send {
    /// Lists the schemas of the connected database.
    async fn list_schemas(&mut self) -> DbResult<Vec<String>>;

    /// Lists the tables of one schema.
    async fn list_tables(&mut self, schema: &str) -> DbResult<Vec<String>>;

    /// Describes a table's columns in declaration order.
    async fn describe(&mut self, table: &TableRef) -> DbResult<Vec<ColumnDescriptor>>;

    /// Executes a query and returns all of its rows.
    async fn execute(&mut self, sql: &str) -> DbResult<QueryResult>;

    /// Closes the connection.
    async fn release(self: Box<Self>) -> DbResult<()>;

    /// Renders the name used to address `table` in a `FROM` clause.
    fn qualify(&self, table: &TableRef) -> String {
        table.fully_qualified()
    }
}

/// Opens a connection for an operation on `context`, classifying failures.
pub(crate) async fn acquire_for(
    provider: &dyn ConnectionProvider,
    context: &ErrorContext,
) -> Result<Box<dyn DatabaseConnection>> {
    provider
        .acquire(Some(&context.database))
        .await
        .map_err(|e| classify_logged(e, context.clone()))
}

/// Releases `conn` and classifies the operation's outcome.
///
/// A failed release is logged; it does not override the outcome.
pub(crate) async fn finish<T>(
    conn: Box<dyn DatabaseConnection>,
    outcome: DbResult<T>,
    context: ErrorContext,
) -> Result<T> {
    if let Err(e) = conn.release().await {
        warn!(target_name = %context, error = %e, "Failed to release connection");
    }
    outcome.map_err(|e| classify_logged(e, context))
}

fn classify_logged(error: DbError, context: ErrorContext) -> crate::error::ClassifiedError {
    let classified = classify(error, context);
    debug!(
        kind = ?classified.kind(),
        target_name = %classified.context(),
        "{}",
        classified
    );
    classified
}

/// Runs `fut` under the configured statement timeout.
pub(crate) async fn with_statement_timeout<T, F>(query: &QueryConfig, fut: F) -> DbResult<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let limit = Duration::from_secs(query.statement_timeout_secs);
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DbError::StatementTimeout(limit))?
        .map_err(DbError::from)
}

/// Runs a connection attempt under the configured connect timeout.
pub(crate) async fn with_connect_timeout<T, F>(query: &QueryConfig, fut: F) -> DbResult<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let limit = Duration::from_secs(query.connect_timeout_secs);
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DbError::ConnectTimeout(limit))?
        .map_err(DbError::from)
}
