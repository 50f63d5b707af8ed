//! `capstat`: per-actor conformance tables from FHIR CapabilityStatements.

mod cli;
mod config;
mod logging;
mod runner;

use anyhow::Context;
use clap::Parser;

use crate::cli::Cli;
use crate::config::Config;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_cli(&cli);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let _logging_guard =
        logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting capstat");

    let summary = runner::run(&config)?;
    tracing::info!(
        written = summary.written,
        empty = summary.empty,
        skipped = summary.skipped,
        failed = summary.failed,
        "Run complete"
    );

    if config.strict && summary.failed > 0 {
        anyhow::bail!("{} CapabilityStatement(s) failed to process", summary.failed);
    }
    Ok(())
}
