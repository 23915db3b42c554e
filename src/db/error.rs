//! Raw data-access failures and their classification.
//!
//! Backends report failures as [`DbError`]. [`classify`] is the single place
//! where those are mapped into a [`ClassifiedError`], checked in priority
//! order: invalid target, connection failure, database error, unexpected.

use crate::error::{ClassifiedError, ErrorContext, ErrorKind};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Kind of catalog object a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Database,
    Schema,
    Table,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Database => "database",
            Self::Schema => "schema",
            Self::Table => "table",
        })
    }
}

/// A failure reported by the data-access layer.
#[derive(Error, Debug)]
pub enum DbError {
    /// Error surfaced by the sqlx driver.
    #[error(transparent)]
    Driver(#[from] sqlx::Error),

    /// The named object does not exist, or is not visible to this user.
    #[error("{object} '{name}' does not exist or not authorized")]
    NotFound { object: ObjectKind, name: String },

    /// Opening a connection took longer than the configured limit.
    #[error("connection attempt timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// A statement took longer than the configured limit.
    #[error("statement timed out after {0:?}")]
    StatementTimeout(Duration),

    /// The backend could not build a connection from its configuration.
    #[error("backend misconfigured: {0}")]
    Misconfigured(String),

    /// Anything else.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl DbError {
    pub fn not_found(object: ObjectKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            object,
            name: name.into(),
        }
    }
}

/// Maps a raw failure into the user-facing taxonomy, attaching the target.
pub fn classify(error: DbError, context: ErrorContext) -> ClassifiedError {
    match kind_of(&error) {
        ErrorKind::InvalidTarget => ClassifiedError::invalid_target(context),
        ErrorKind::ConnectionFailure => match &error {
            DbError::Misconfigured(detail) => ClassifiedError::misconfigured(detail, context),
            _ => ClassifiedError::connection_failure(context),
        },
        ErrorKind::DatabaseError => ClassifiedError::database(describe(&error), context),
        ErrorKind::Unexpected => ClassifiedError::unexpected(describe(&error), context),
    }
}

fn kind_of(error: &DbError) -> ErrorKind {
    match error {
        DbError::NotFound { .. } => ErrorKind::InvalidTarget,
        DbError::ConnectTimeout(_) | DbError::Misconfigured(_) => ErrorKind::ConnectionFailure,
        DbError::StatementTimeout(_) => ErrorKind::DatabaseError,
        DbError::Driver(e) => driver_kind(e),
        DbError::Unexpected(_) => ErrorKind::Unexpected,
    }
}

fn driver_kind(error: &sqlx::Error) -> ErrorKind {
    match error {
        sqlx::Error::Database(db_error) => {
            let code = db_error.code();
            database_error_kind(code.as_deref(), db_error.message())
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => ErrorKind::ConnectionFailure,
        sqlx::Error::Protocol(_)
        | sqlx::Error::RowNotFound
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_) => ErrorKind::DatabaseError,
        _ => ErrorKind::Unexpected,
    }
}

/// Classifies a server-reported error by its code and message.
///
/// PostgreSQL codes are five-character SQLSTATEs; SQLite codes are numeric
/// result codes, and SQLite reports missing objects only through the message.
pub fn database_error_kind(code: Option<&str>, message: &str) -> ErrorKind {
    const PG_INVALID_TARGET: &[&str] = &[
        "3D000", // invalid_catalog_name
        "3F000", // invalid_schema_name
        "42P01", // undefined_table
        "42501", // insufficient_privilege
        "42602", // invalid_name
    ];
    const SQLITE_INVALID_TARGET: &[i32] = &[3, 23]; // SQLITE_PERM, SQLITE_AUTH
    const SQLITE_CONNECTION: &[i32] = &[14, 26]; // SQLITE_CANTOPEN, SQLITE_NOTADB

    let lowered = message.to_lowercase();

    if let Some(code) = code {
        if PG_INVALID_TARGET.contains(&code)
            || sqlite_primary_code(code).is_some_and(|c| SQLITE_INVALID_TARGET.contains(&c))
        {
            return ErrorKind::InvalidTarget;
        }
    }
    if lowered.contains("no such table") || lowered.contains("unknown database") {
        return ErrorKind::InvalidTarget;
    }

    if let Some(code) = code {
        // Class 08: connection exception, class 28: invalid authorization,
        // 57P0x: server shutting down or not accepting connections.
        if code.starts_with("08")
            || code.starts_with("28")
            || code.starts_with("57P0")
            || sqlite_primary_code(code).is_some_and(|c| SQLITE_CONNECTION.contains(&c))
        {
            return ErrorKind::ConnectionFailure;
        }
    }

    ErrorKind::DatabaseError
}

/// Reduces a SQLite (possibly extended) result code to its primary code.
///
/// SQLSTATEs are always five characters, so shorter numeric codes are SQLite's.
fn sqlite_primary_code(code: &str) -> Option<i32> {
    if code.len() >= 5 {
        return None;
    }
    code.parse::<i32>().ok().map(|c| c & 0xff)
}

fn describe(error: &DbError) -> String {
    match error {
        DbError::Driver(sqlx::Error::Database(db_error)) => db_error.message().to_string(),
        other => other.to_string(),
    }
}
