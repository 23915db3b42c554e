//! Rendering of catalog results for the command line.

use crate::catalog::Catalog;
use crate::cli::{Command, OutputFormat};
use crate::db::ColumnDescriptor;
use crate::error::Result;
use crate::summary::{Summary, NOTHING_TO_SUMMARIZE};

/// Result of one command, independent of how it is presented.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Schema or table names.
    Names(Vec<String>),
    /// Column descriptions of a table.
    Columns(Vec<ColumnDescriptor>),
    /// A table summary.
    Summary(Summary),
}

impl CommandOutput {
    /// Renders the output in the requested format, without a trailing newline.
    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.render_text()),
            OutputFormat::Json => self.render_json(),
        }
    }

    fn render_text(&self) -> String {
        match self {
            Self::Names(names) => names.join("\n"),
            Self::Columns(columns) => format_table(
                columns
                    .iter()
                    .map(|c| {
                        vec![
                            c.name.clone(),
                            c.declared_type.clone(),
                            c.comment.clone().unwrap_or_default(),
                        ]
                    })
                    .collect(),
            ),
            Self::Summary(Summary::Empty) => NOTHING_TO_SUMMARIZE.to_string(),
            Self::Summary(Summary::Record(record)) => format_table(
                record
                    .iter()
                    .map(|(alias, value)| vec![alias.to_string(), value.to_display_string()])
                    .collect(),
            ),
        }
    }

    fn render_json(&self) -> serde_json::Result<String> {
        match self {
            Self::Names(names) => serde_json::to_string_pretty(names),
            Self::Columns(columns) => serde_json::to_string_pretty(columns),
            Self::Summary(summary) => serde_json::to_string_pretty(summary),
        }
    }
}

/// Runs one command against the catalog.
pub async fn run_command(catalog: &Catalog, command: &Command) -> Result<CommandOutput> {
    match command {
        Command::Schemas { database } => catalog
            .list_schemas(database)
            .await
            .map(CommandOutput::Names),
        Command::Tables { database, schema } => catalog
            .list_tables(database, schema)
            .await
            .map(CommandOutput::Names),
        Command::Columns {
            database,
            schema,
            table,
        } => catalog
            .list_columns(database, schema, table)
            .await
            .map(CommandOutput::Columns),
        Command::Summary {
            database,
            schema,
            table,
        } => catalog
            .summarize(database, schema, table)
            .await
            .map(CommandOutput::Summary),
    }
}

/// Left-aligns cells into columns separated by two spaces.
fn format_table(rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = Vec::new();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }

    rows.iter()
        .map(|row| {
            row.iter()
                .zip(widths.iter().copied())
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
