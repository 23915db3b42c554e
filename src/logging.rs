//! Logging configuration for db-summary.
//!
//! Library code only emits `tracing` events; the binary installs exactly one
//! subscriber at startup, writing to stderr or to a log file.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initializes logging to a file, keeping stdout clean for results.
///
/// Falls back to stderr logging if the file cannot be created.
pub fn init_file_logging(path: &Path) {
    let log_file = match open_log_file(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {}: {e}", path.display());
            init_stderr_logging();
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .init();
}

/// Creates the log file and its parent directories, truncating any previous log.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}
