//! Summary engine: describe, classify, build, execute, shape.

use super::{AggregationSpec, ColumnClass};
use crate::db::{
    self, ConnectionProvider, DatabaseConnection, DbError, DbResult, QueryResult, TableRef, Value,
};
use crate::error::{ErrorContext, Result};
use anyhow::anyhow;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Message reported when a table has no columns to aggregate.
pub const NOTHING_TO_SUMMARIZE: &str = "No columns to summarize";

/// Aggregate values keyed by output alias, in query order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryRecord {
    fields: Vec<(String, Value)>,
}

impl SummaryRecord {
    /// Zips the result's column names with the values of its first row.
    pub fn from_result(result: QueryResult) -> DbResult<Self> {
        let QueryResult { columns, rows } = result;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Unexpected(anyhow!("aggregation query returned no rows")))?;

        Ok(Self {
            fields: columns.into_iter().zip(row).collect(),
        })
    }

    /// Returns the value for an alias.
    pub fn get(&self, alias: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, Value)> for SummaryRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for SummaryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (alias, value) in &self.fields {
            map.serialize_entry(alias, value)?;
        }
        map.end()
    }
}

/// Outcome of summarizing a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    /// One aggregate value per alias.
    Record(SummaryRecord),
    /// The table has no columns, so no query was issued.
    Empty,
}

impl Summary {
    pub fn record(&self) -> Option<&SummaryRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Empty => None,
        }
    }
}

impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Record(record) => record.serialize(serializer),
            Self::Empty => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("message", NOTHING_TO_SUMMARIZE)?;
                map.end()
            }
        }
    }
}

/// Computes per-table statistical summaries. Results are never cached.
pub struct SummaryEngine {
    provider: Arc<dyn ConnectionProvider>,
}

impl SummaryEngine {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { provider }
    }

    /// Summarizes one table on a connection scoped to its database.
    ///
    /// The connection is released whether or not summarizing succeeded.
    pub async fn summarize(&self, table: &TableRef) -> Result<Summary> {
        info!(
            database = %table.database,
            schema = %table.schema,
            table = %table.table,
            "Summarizing table"
        );
        let context = ErrorContext::table(&table.database, &table.schema, &table.table);

        let mut conn = db::acquire_for(self.provider.as_ref(), &context).await?;
        let outcome = summarize_on(conn.as_mut(), table).await;
        db::finish(conn, outcome, context).await
    }
}

async fn summarize_on(conn: &mut dyn DatabaseConnection, table: &TableRef) -> DbResult<Summary> {
    let columns = conn.describe(table).await?;

    let classified: Vec<(&str, ColumnClass)> = columns
        .iter()
        .map(|c| (c.name.as_str(), ColumnClass::classify(&c.declared_type)))
        .collect();

    let Some(spec) = AggregationSpec::build(&classified) else {
        debug!(table = %table, "{}", NOTHING_TO_SUMMARIZE);
        return Ok(Summary::Empty);
    };

    let sql = spec.render(&conn.qualify(table));
    debug!(
        sql = %sql,
        aliases = ?spec.aliases().collect::<Vec<_>>(),
        "Executing aggregation query"
    );

    let result = conn.execute(&sql).await?;
    SummaryRecord::from_result(result).map(Summary::Record)
}
