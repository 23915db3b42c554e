//! Catalog: the public entry points for metadata listings and summaries.
//!
//! Every operation acquires its own connection and releases it before
//! returning. Listings are memoized per argument tuple; summaries are
//! always computed fresh. Callers only ever see [`ClassifiedError`]s.
//!
//! [`ClassifiedError`]: crate::error::ClassifiedError

use crate::cache::MetadataCache;
use crate::config::{CacheConfig, Config};
use crate::db::{self, ColumnDescriptor, ConnectionProvider, TableRef};
use crate::error::{ErrorContext, Result};
use crate::summary::{Summary, SummaryEngine};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Metadata listings and summaries for one configured connection.
pub struct Catalog {
    provider: Arc<dyn ConnectionProvider>,
    schemas: MetadataCache<String, Vec<String>>,
    tables: MetadataCache<(String, String), Vec<String>>,
    columns: MetadataCache<TableRef, Vec<ColumnDescriptor>>,
    engine: SummaryEngine,
}

impl Catalog {
    /// Creates a catalog over `provider` with caches sized by `cache`.
    pub fn new(provider: Arc<dyn ConnectionProvider>, cache: &CacheConfig) -> Self {
        let ttl = Duration::from_secs(cache.ttl_secs);
        Self {
            schemas: MetadataCache::new("schemas", ttl, cache.max_entries),
            tables: MetadataCache::new("tables", ttl, cache.max_entries),
            columns: MetadataCache::new("columns", ttl, cache.max_entries),
            engine: SummaryEngine::new(Arc::clone(&provider)),
            provider,
        }
    }

    /// Creates a catalog for the configured backend.
    pub fn from_config(config: &Config) -> Self {
        Self::new(db::provider_for(config), &config.cache)
    }

    /// Lists the schemas of `database`.
    pub async fn list_schemas(&self, database: &str) -> Result<Vec<String>> {
        self.schemas
            .get_or_try_insert_with(database.to_string(), || async {
                let context = ErrorContext::database(database);
                let mut conn = db::acquire_for(self.provider.as_ref(), &context).await?;
                let outcome = conn.list_schemas().await;
                db::finish(conn, outcome, context).await
            })
            .await
    }

    /// Lists the tables of `database.schema`.
    pub async fn list_tables(&self, database: &str, schema: &str) -> Result<Vec<String>> {
        let key = (database.to_string(), schema.to_string());
        self.tables
            .get_or_try_insert_with(key, || async {
                let context = ErrorContext::schema(database, schema);
                let mut conn = db::acquire_for(self.provider.as_ref(), &context).await?;
                let outcome = conn.list_tables(schema).await;
                db::finish(conn, outcome, context).await
            })
            .await
    }

    /// Describes the columns of `database.schema.table` in declaration order.
    pub async fn list_columns(
        &self,
        database: &str,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>> {
        let table = TableRef::new(database, schema, table);
        self.columns
            .get_or_try_insert_with(table.clone(), || async {
                let context = ErrorContext::table(&table.database, &table.schema, &table.table);
                let mut conn = db::acquire_for(self.provider.as_ref(), &context).await?;
                let outcome = conn.describe(&table).await;
                db::finish(conn, outcome, context).await
            })
            .await
    }

    /// Computes a statistical summary of `database.schema.table`.
    pub async fn summarize(&self, database: &str, schema: &str, table: &str) -> Result<Summary> {
        self.engine
            .summarize(&TableRef::new(database, schema, table))
            .await
    }

    /// Drops every cached listing.
    pub fn invalidate_all(&self) {
        debug!("Clearing metadata caches");
        self.schemas.clear();
        self.tables.clear();
        self.columns.clear();
    }
}
