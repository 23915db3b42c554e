//! SQLite backend.
//!
//! Each logical database name maps to a database file. Schemas are the
//! names SQLite attaches (`main`, plus anything attached), so a table is
//! addressed as `schema.table`.

use crate::config::QueryConfig;
use crate::db::{
    with_connect_timeout, with_statement_timeout, ColumnDescriptor, ConnectionProvider,
    DatabaseConnection, DbError, DbResult, ObjectKind, QueryResult, Row, TableRef, Value,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column as SqlxColumn, Connection, Row as SqlxRow, TypeInfo, ValueRef};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Opens read-only connections to configured SQLite database files.
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    databases: BTreeMap<String, PathBuf>,
    query: QueryConfig,
}

impl SqliteProvider {
    pub fn new(databases: BTreeMap<String, PathBuf>, query: QueryConfig) -> Self {
        Self { databases, query }
    }

    /// Resolves a logical database name to its file.
    ///
    /// Without a name, the only configured database is used.
    fn resolve(&self, database: Option<&str>) -> DbResult<&PathBuf> {
        match database {
            Some(name) => self
                .databases
                .get(name)
                .ok_or_else(|| DbError::not_found(ObjectKind::Database, name)),
            None if self.databases.len() == 1 => self
                .databases
                .values()
                .next()
                .ok_or_else(|| DbError::Misconfigured("no SQLite databases configured".into())),
            None => Err(DbError::Misconfigured(
                "no database named and more than one SQLite database configured".into(),
            )),
        }
    }
}

#[async_trait]
impl ConnectionProvider for SqliteProvider {
    async fn acquire(&self, database: Option<&str>) -> DbResult<Box<dyn DatabaseConnection>> {
        let path = self.resolve(database)?;
        debug!(path = %path.display(), "Opening SQLite connection");

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false)
            .read_only(true);
        let conn = with_connect_timeout(&self.query, SqliteConnection::connect_with(&options)).await?;

        Ok(Box::new(SqliteDbConnection {
            conn,
            query: self.query.clone(),
        }))
    }
}

/// A single SQLite connection.
pub struct SqliteDbConnection {
    conn: SqliteConnection,
    query: QueryConfig,
}

/// Quotes an identifier for use in catalog queries.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[async_trait]
impl DatabaseConnection for SqliteDbConnection {
    async fn list_schemas(&mut self) -> DbResult<Vec<String>> {
        let rows: Vec<(i64, String, String)> = with_statement_timeout(
            &self.query,
            sqlx::query_as("PRAGMA database_list").fetch_all(&mut self.conn),
        )
        .await?;

        Ok(rows.into_iter().map(|(_, name, _)| name).collect())
    }

    async fn list_tables(&mut self, schema: &str) -> DbResult<Vec<String>> {
        let sql = format!(
            "SELECT name FROM {}.sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
            quote_ident(schema)
        );
        with_statement_timeout(
            &self.query,
            sqlx::query_scalar::<_, String>(&sql).fetch_all(&mut self.conn),
        )
        .await
    }

    async fn describe(&mut self, table: &TableRef) -> DbResult<Vec<ColumnDescriptor>> {
        let sql = format!(
            "PRAGMA {}.table_info({})",
            quote_ident(&table.schema),
            quote_ident(&table.table)
        );
        let rows = with_statement_timeout(&self.query, sqlx::query(&sql).fetch_all(&mut self.conn))
            .await?;

        // table_info reports nothing at all for a table that does not exist.
        if rows.is_empty() {
            return Err(DbError::not_found(ObjectKind::Table, table.fully_qualified()));
        }

        rows.iter()
            .map(|row| -> DbResult<ColumnDescriptor> {
                Ok(ColumnDescriptor {
                    name: row.try_get("name")?,
                    declared_type: row.try_get("type")?,
                    comment: None,
                })
            })
            .collect()
    }

    async fn execute(&mut self, sql: &str) -> DbResult<QueryResult> {
        let rows = with_statement_timeout(&self.query, sqlx::query(sql).fetch_all(&mut self.conn))
            .await?;

        let columns: Vec<String> = rows
            .first()
            .map(|first_row| {
                first_row
                    .columns()
                    .iter()
                    .map(|col| col.name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let rows = rows.iter().map(convert_row).collect::<DbResult<Vec<Row>>>()?;

        Ok(QueryResult::with_data(columns, rows))
    }

    async fn release(self: Box<Self>) -> DbResult<()> {
        let this = *self;
        this.conn.close().await.map_err(DbError::from)
    }

    /// SQLite has no catalog level above the schema.
    fn qualify(&self, table: &TableRef) -> String {
        format!("{}.{}", table.schema, table.table)
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> DbResult<Row> {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts a single value using its runtime storage class.
///
/// Aggregate expressions carry no declared type, so the storage class of
/// the value itself decides how it is decoded. A value that cannot be
/// decoded is an error, never a NULL.
fn convert_value(row: &SqliteRow, index: usize) -> DbResult<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage_class = raw.type_info().name().to_uppercase();

    let value = match storage_class.as_str() {
        "INTEGER" => Value::Int(row.try_get(index)?),
        "REAL" => Value::Float(row.try_get(index)?),
        "BLOB" => Value::Bytes(row.try_get(index)?),
        _ => Value::String(row.try_get(index)?),
    };
    Ok(value)
}
