//! dbsummary: database metadata listings and per-table statistical summaries.

use anyhow::Context;
use db_summary::catalog::Catalog;
use db_summary::cli::Cli;
use db_summary::error::ClassifiedError;
use db_summary::logging;
use db_summary::output::run_command;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    match &cli.log_file {
        Some(path) => logging::init_file_logging(path),
        None => logging::init_stderr_logging(),
    }

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<ClassifiedError>() {
            Some(classified) => {
                eprintln!("{}: {}", classified.category(), classified);
                std::process::exit(classified.kind().exit_code());
            }
            None => {
                error!("{e:#}");
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = cli
        .resolve_config()
        .with_context(|| format!("Could not load configuration from {}", config_path.display()))?;
    info!("Connection: {}", config.connection.display_string());

    let catalog = Catalog::from_config(&config);
    let output = run_command(&catalog, &cli.command).await?;
    println!("{}", output.render(cli.format)?);

    Ok(())
}
