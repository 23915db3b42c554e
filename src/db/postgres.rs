//! PostgreSQL backend.
//!
//! Provides `PostgresProvider`, which opens one `PgConnection` per call,
//! and the connection type implementing `DatabaseConnection` on top of it.

use crate::config::{ConnectionConfig, QueryConfig};
use crate::db::{
    with_connect_timeout, with_statement_timeout, ColumnDescriptor, ConnectionProvider,
    DatabaseConnection, DbError, DbResult, ObjectKind, QueryResult, Row, TableRef, Value,
};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow, PgSslMode};
use sqlx::{Column as SqlxColumn, Connection, Postgres, Row as SqlxRow, TypeInfo};
use std::str::FromStr;
use tracing::debug;

/// Opens PostgreSQL connections from a base connection configuration.
#[derive(Debug, Clone)]
pub struct PostgresProvider {
    connection: ConnectionConfig,
    query: QueryConfig,
}

impl PostgresProvider {
    pub fn new(connection: ConnectionConfig, query: QueryConfig) -> Self {
        Self { connection, query }
    }

    /// Builds connect options, substituting `database` when given.
    fn connect_options(&self, database: Option<&str>) -> DbResult<PgConnectOptions> {
        let config = &self.connection;
        let mut options = PgConnectOptions::new().port(config.port);

        if let Some(host) = &config.host {
            options = options.host(host);
        }
        if let Some(user) = &config.user {
            options = options.username(user);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }
        if let Some(database) = database.or(config.database.as_deref()) {
            options = options.database(database);
        }
        if let Some(sslmode) = &config.sslmode {
            let mode = PgSslMode::from_str(sslmode)
                .map_err(|_| DbError::Misconfigured(format!("unknown sslmode '{sslmode}'")))?;
            options = options.ssl_mode(mode);
        }

        Ok(options)
    }
}

#[async_trait]
impl ConnectionProvider for PostgresProvider {
    async fn acquire(&self, database: Option<&str>) -> DbResult<Box<dyn DatabaseConnection>> {
        let options = self.connect_options(database)?;
        debug!(database = database.unwrap_or("<default>"), "Opening PostgreSQL connection");

        let conn = with_connect_timeout(&self.query, PgConnection::connect_with(&options)).await?;

        Ok(Box::new(PostgresConnection {
            conn,
            query: self.query.clone(),
        }))
    }
}

/// A single PostgreSQL connection.
pub struct PostgresConnection {
    conn: PgConnection,
    query: QueryConfig,
}

impl PostgresConnection {
    async fn schema_exists(&mut self, schema: &str) -> DbResult<bool> {
        with_statement_timeout(
            &self.query,
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
            )
            .bind(schema)
            .fetch_one(&mut self.conn),
        )
        .await
    }

    async fn table_exists(&mut self, schema: &str, table: &str) -> DbResult<bool> {
        with_statement_timeout(
            &self.query,
            sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM information_schema.tables
                    WHERE table_schema = $1 AND table_name = $2
                )
                "#,
            )
            .bind(schema)
            .bind(table)
            .fetch_one(&mut self.conn),
        )
        .await
    }
}

#[async_trait]
impl DatabaseConnection for PostgresConnection {
    async fn list_schemas(&mut self) -> DbResult<Vec<String>> {
        with_statement_timeout(
            &self.query,
            sqlx::query_scalar::<_, String>(
                "SELECT schema_name::text FROM information_schema.schemata ORDER BY schema_name",
            )
            .fetch_all(&mut self.conn),
        )
        .await
    }

    async fn list_tables(&mut self, schema: &str) -> DbResult<Vec<String>> {
        if !self.schema_exists(schema).await? {
            return Err(DbError::not_found(ObjectKind::Schema, schema));
        }

        with_statement_timeout(
            &self.query,
            sqlx::query_scalar::<_, String>(
                r#"
                SELECT table_name::text
                FROM information_schema.tables
                WHERE table_schema = $1 AND table_type = 'BASE TABLE'
                ORDER BY table_name
                "#,
            )
            .bind(schema)
            .fetch_all(&mut self.conn),
        )
        .await
    }

    async fn describe(&mut self, table: &TableRef) -> DbResult<Vec<ColumnDescriptor>> {
        if !self.table_exists(&table.schema, &table.table).await? {
            return Err(DbError::not_found(ObjectKind::Table, table.fully_qualified()));
        }

        let rows: Vec<(String, String, Option<String>)> = with_statement_timeout(
            &self.query,
            sqlx::query_as(
                r#"
                SELECT
                    c.column_name::text,
                    c.data_type::text,
                    col_description(
                        format('%I.%I', c.table_schema, c.table_name)::regclass,
                        c.ordinal_position::int
                    )
                FROM information_schema.columns c
                WHERE c.table_schema = $1 AND c.table_name = $2
                ORDER BY c.ordinal_position
                "#,
            )
            .bind(&table.schema)
            .bind(&table.table)
            .fetch_all(&mut self.conn),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, declared_type, comment)| ColumnDescriptor {
                name,
                declared_type,
                comment,
            })
            .collect())
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
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> DbResult<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Decodes one nullable column, mapping a present value with `wrap`.
///
/// Only SQL NULL becomes `Value::Null`; a value that cannot be decoded is
/// an error.
fn decode<'r, T>(row: &'r PgRow, index: usize, wrap: impl FnOnce(T) -> Value) -> DbResult<Value>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    Ok(row
        .try_get::<Option<T>, _>(index)?
        .map(wrap)
        .unwrap_or(Value::Null))
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> DbResult<Value> {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => decode(row, index, Value::Bool),
        "INT2" | "SMALLINT" => decode(row, index, |v: i16| Value::Int(v.into())),
        "INT4" | "INT" | "INTEGER" => decode(row, index, |v: i32| Value::Int(v.into())),
        "INT8" | "BIGINT" => decode(row, index, Value::Int),
        "FLOAT4" | "REAL" => decode(row, index, |v: f32| Value::Float(v.into())),
        "FLOAT8" | "DOUBLE PRECISION" => decode(row, index, Value::Float),
        // AVG over integer columns yields NUMERIC.
        "NUMERIC" => decode(row, index, numeric_value),
        // MIN/MAX over interval columns, which classify as numeric.
        "INTERVAL" => decode(row, index, |v: PgInterval| Value::String(interval_text(&v))),
        "BYTEA" => decode(row, index, Value::Bytes),
        _ => decode(row, index, Value::String),
    }
}

/// Renders an interval the way PostgreSQL prints it, e.g. `1 year 2 mons 3 days 04:05:06.5`.
fn interval_text(interval: &PgInterval) -> String {
    fn unit(n: i32, name: &str) -> String {
        if n.abs() == 1 {
            format!("{n} {name}")
        } else {
            format!("{n} {name}s")
        }
    }

    let mut parts = Vec::new();
    let (years, months) = (interval.months / 12, interval.months % 12);
    if years != 0 {
        parts.push(unit(years, "year"));
    }
    if months != 0 {
        parts.push(unit(months, "mon"));
    }
    if interval.days != 0 {
        parts.push(unit(interval.days, "day"));
    }
    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let secs = micros / 1_000_000;
        let mut time = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        let fraction = micros % 1_000_000;
        if fraction != 0 {
            time.push_str(format!(".{fraction:06}").trim_end_matches('0'));
        }
        parts.push(time);
    }
    parts.join(" ")
}

fn numeric_value(decimal: Decimal) -> Value {
    decimal
        .to_f64()
        .map(Value::Float)
        .unwrap_or_else(|| Value::String(decimal.to_string()))
}
