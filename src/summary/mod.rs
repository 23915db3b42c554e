//! Per-table statistical summaries.
//!
//! Column types are classified as numeric or text, an aggregation query is
//! built for the classified columns, and its single result row is shaped
//! into a [`SummaryRecord`].

mod column_class;
mod engine;
mod query;

pub use column_class::ColumnClass;
pub use engine::{Summary, SummaryEngine, SummaryRecord, NOTHING_TO_SUMMARIZE};
pub use query::{AggregateKind, Aggregation, AggregationSpec};
