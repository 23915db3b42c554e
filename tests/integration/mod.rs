//! Integration tests for db-summary.

pub mod common;
pub mod metadata_test;
pub mod postgres_test;
pub mod summary_test;
