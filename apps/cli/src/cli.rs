//! Command-line arguments for `capstat`.

use clap::Parser;
use std::path::PathBuf;

/// Summarise FHIR CapabilityStatement conformance per actor.
///
/// Every `<name>-<actor>.xml` file in the input directory becomes
/// `<actor>.tsv` in the output directory.
#[derive(Parser, Debug)]
#[command(name = "capstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory containing CapabilityStatement XML files
    #[arg(long, value_name = "DIR")]
    pub capstatdir: Option<PathBuf>,

    /// Directory to store processed capability statement summaries
    #[arg(long, value_name = "DIR")]
    pub datadir: Option<PathBuf>,

    /// Only process these actors (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "ACTORS")]
    pub actors: Option<Vec<String>>,

    /// Actor defaults document (JSON)
    #[arg(long, value_name = "FILE")]
    pub defaults: Option<PathBuf>,

    /// Remove and recreate the output directory before processing
    #[arg(long)]
    pub recreate: bool,

    /// Exit with an error when any document fails
    #[arg(long)]
    pub strict: bool,

    /// Configuration file (TOML); defaults to ./capstat.toml when present
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}
