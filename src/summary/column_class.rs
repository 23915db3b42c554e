//! Numeric/text classification of declared column types.

use serde::Serialize;

/// Type substrings that mark a column as numeric.
const NUMERIC_MARKERS: &[&str] = &["NUMBER", "INT", "FLOAT"];

/// How a column is summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnClass {
    /// Summarized with count, min, max and average.
    Numeric,
    /// Summarized with count and distinct count.
    Text,
}

impl ColumnClass {
    /// Classifies a declared type string.
    ///
    /// A case-insensitive substring match: anything containing `NUMBER`,
    /// `INT` or `FLOAT` is numeric, everything else (dates, booleans,
    /// semi-structured types, the empty string) is text.
    pub fn classify(declared_type: &str) -> Self {
        let upper = declared_type.to_uppercase();
        if NUMERIC_MARKERS.iter().any(|marker| upper.contains(marker)) {
            Self::Numeric
        } else {
            Self::Text
        }
    }
}
