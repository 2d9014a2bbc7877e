use std::process::ExitCode;

use anyhow::{Context, Result};
use drone_purge_core::{DroneClient, PurgeConfig, purge};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const ENV_FILE: &str = ".env";

#[tokio::main]
async fn main() -> ExitCode {
    // Load before logging is set up so RUST_LOG can come from the file.
    let env_file = dotenvy::from_path(ENV_FILE);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(env_file).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(env_file: dotenvy::Result<()>) -> Result<()> {
    env_file.with_context(|| format!("Error loading {ENV_FILE} file"))?;
    let config = PurgeConfig::from_env().context("Invalid configuration")?;

    let client =
        DroneClient::new(&config.host, &config.token).context("Failed to create Drone client")?;

    let report = purge::run(&client, &config).await?;

    info!(
        builds_listed = report.builds_listed,
        builds_skipped = report.builds_skipped,
        builds_cleaned = report.builds_cleaned,
        logs_purged = report.logs_purged,
        builds_purged = report.builds_purged,
        "Purge complete"
    );
    Ok(())
}
