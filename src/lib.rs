//! db-summary: relational-database metadata and per-table statistical summaries.
//!
//! [`catalog::Catalog`] is the entry point: it lists schemas, tables and
//! columns through a time-bounded cache and computes summaries on demand,
//! reporting every failure as an [`error::ClassifiedError`].
//!
//! This library exposes the core modules for the binary and integration tests.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod summary;
