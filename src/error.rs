//! Error types for db-summary.
//!
//! Every failure that crosses the catalog boundary is a [`ClassifiedError`]:
//! one of four kinds, a human-readable message, and the identifiers of the
//! target that was being accessed. Raw driver errors never escape past it.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The small, closed set of failure kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad database, schema or table name, or access to it was denied.
    InvalidTarget,
    /// Transport, authentication or connectivity failure.
    ConnectionFailure,
    /// Any other failure reported by the database layer.
    DatabaseError,
    /// Anything the classifier did not recognize.
    Unexpected,
}

impl ErrorKind {
    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidTarget => "Invalid Target",
            Self::ConnectionFailure => "Connection Error",
            Self::DatabaseError => "Database Error",
            Self::Unexpected => "Unexpected Error",
        }
    }

    /// Process exit code the command-line front end reports for this kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidTarget => 2,
            Self::ConnectionFailure => 3,
            Self::DatabaseError => 4,
            Self::Unexpected => 1,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category())
    }
}

/// Identifiers of the object an operation was targeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorContext {
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

impl ErrorContext {
    /// Context for a database-level operation.
    pub fn database(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: None,
            table: None,
        }
    }

    /// Context for a schema-level operation.
    pub fn schema(database: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: Some(schema.into()),
            table: None,
        }
    }

    /// Context for a table-level operation.
    pub fn table(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: Some(schema.into()),
            table: Some(table.into()),
        }
    }

    /// Dotted form of the identifiers that are present, e.g. `DB.PUBLIC.ORDERS`.
    pub fn qualified(&self) -> String {
        [
            Some(self.database.as_str()),
            self.schema.as_deref(),
            self.table.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(".")
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// A database failure mapped into the user-facing taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    context: ErrorContext,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, context: ErrorContext) -> Self {
        Self {
            kind,
            message: message.into(),
            context,
        }
    }

    /// Creates an invalid-target error whose message names the target.
    pub fn invalid_target(context: ErrorContext) -> Self {
        let message = format!("'{context}' does not exist or access is not authorized");
        Self::new(ErrorKind::InvalidTarget, message, context)
    }

    /// Creates a connection error. The message is deliberately generic so
    /// that connection strings and credentials never end up in it.
    pub fn connection_failure(context: ErrorContext) -> Self {
        Self::new(
            ErrorKind::ConnectionFailure,
            "Could not connect to the database server. Check that it is reachable and the credentials are valid.",
            context,
        )
    }

    /// Creates a connection error for a configuration the backend rejected.
    ///
    /// The detail comes from our own configuration checks and carries no
    /// credentials.
    pub fn misconfigured(detail: impl fmt::Display, context: ErrorContext) -> Self {
        let message = format!("Could not connect to the database server: {detail}");
        Self::new(ErrorKind::ConnectionFailure, message, context)
    }

    /// Creates a database error embedding the original failure text.
    pub fn database(detail: impl fmt::Display, context: ErrorContext) -> Self {
        let message = format!("Database error while accessing '{context}': {detail}");
        Self::new(ErrorKind::DatabaseError, message, context)
    }

    /// Creates an unexpected error embedding the original failure text.
    pub fn unexpected(detail: impl fmt::Display, context: ErrorContext) -> Self {
        let message = format!("Unexpected error while accessing '{context}': {detail}");
        Self::new(ErrorKind::Unexpected, message, context)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        self.kind.category()
    }
}

/// Result type alias using ClassifiedError.
pub type Result<T> = std::result::Result<T, ClassifiedError>;
