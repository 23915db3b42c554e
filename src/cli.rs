//! Command-line argument parsing for dbsummary.

use crate::config::{Config, ConfigError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain, column-aligned text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Lists database metadata and summarizes tables.
#[derive(Parser, Debug)]
#[command(name = "dbsummary")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Connection URL (postgres://user@host/db or sqlite://path/to/file.db)
    #[arg(long, value_name = "URL", env = "DBSUMMARY_URL", global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the schemas of a database
    Schemas {
        database: String,
    },
    /// List the tables of a schema
    Tables {
        database: String,
        schema: String,
    },
    /// Describe the columns of a table
    Columns {
        database: String,
        schema: String,
        table: String,
    },
    /// Compute a statistical summary of a table
    Summary {
        database: String,
        schema: String,
        table: String,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Builds the effective configuration.
    ///
    /// Precedence, highest first: `--url`, the config file, then `PG*`
    /// environment variables for any connection fields still unset.
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::load_from_file(&self.config_path())?;
        if let Some(url) = &self.url {
            config.apply_url(url)?;
        }
        config.connection.apply_env_defaults();
        Ok(config)
    }
}
