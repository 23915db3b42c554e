//! Aggregation query construction.
//!
//! Column names and the table name are interpolated into the SQL text
//! verbatim, without quoting or escaping. Callers must only pass identifiers
//! that came from the database's own catalog (describe output) or that were
//! validated upstream; this module does not defend against injection.

use super::ColumnClass;
use serde::Serialize;
use std::fmt;

/// One aggregate function applied to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    Count,
    Min,
    Max,
    Avg,
    CountDistinct,
}

impl AggregateKind {
    /// Aggregates emitted for numeric columns, in output order.
    pub const NUMERIC: [AggregateKind; 4] = [Self::Count, Self::Min, Self::Max, Self::Avg];

    /// Aggregates emitted for text columns, in output order.
    pub const TEXT: [AggregateKind; 2] = [Self::Count, Self::CountDistinct];

    /// Returns the aggregates used for a column class.
    pub fn for_class(class: ColumnClass) -> &'static [AggregateKind] {
        match class {
            ColumnClass::Numeric => &Self::NUMERIC,
            ColumnClass::Text => &Self::TEXT,
        }
    }

    /// Suffix appended to the column name to form the output alias.
    pub fn alias_suffix(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Avg => "avg",
            Self::CountDistinct => "unique",
        }
    }

    /// Renders the aggregate expression over `column`.
    pub fn expression(&self, column: &str) -> String {
        match self {
            Self::Count => format!("COUNT({column})"),
            Self::Min => format!("MIN({column})"),
            Self::Max => format!("MAX({column})"),
            Self::Avg => format!("AVG({column})"),
            Self::CountDistinct => format!("COUNT(DISTINCT {column})"),
        }
    }
}

/// An aliased aggregate expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    pub column: String,
    pub kind: AggregateKind,
    pub alias: String,
    pub expression: String,
}

impl Aggregation {
    pub fn new(column: &str, kind: AggregateKind) -> Self {
        Self {
            column: column.to_string(),
            kind,
            alias: format!("{column}_{}", kind.alias_suffix()),
            expression: kind.expression(column),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.expression, self.alias)
    }
}

/// The ordered aggregate expressions of one summary query. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationSpec {
    aggregations: Vec<Aggregation>,
}

impl AggregationSpec {
    /// Builds the aggregations for a classified column list.
    ///
    /// Numeric columns come first as a block, then text columns; each block
    /// keeps the input order. Returns `None` when there is nothing to
    /// aggregate, so no empty query is ever rendered.
    pub fn build<S: AsRef<str>>(columns: &[(S, ColumnClass)]) -> Option<Self> {
        let block = move |class: ColumnClass| {
            columns
                .iter()
                .filter(move |(_, c)| *c == class)
                .flat_map(move |(name, _)| {
                    AggregateKind::for_class(class)
                        .iter()
                        .map(move |kind| Aggregation::new(name.as_ref(), *kind))
                })
        };

        let aggregations: Vec<Aggregation> = block(ColumnClass::Numeric)
            .chain(block(ColumnClass::Text))
            .collect();

        if aggregations.is_empty() {
            None
        } else {
            Some(Self { aggregations })
        }
    }

    /// Output aliases, in order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aggregations.iter().map(|a| a.alias.as_str())
    }

    /// Renders `SELECT <expr> AS <alias>, ... FROM <table>`.
    pub fn render(&self, fully_qualified_table: &str) -> String {
        let select_list = self
            .aggregations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("SELECT {select_list} FROM {fully_qualified_table}")
    }
}
