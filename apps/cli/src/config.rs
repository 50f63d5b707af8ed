//! Configuration for the `capstat` CLI.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. `capstat.toml` in the working directory (or the file given by `--config`)
//! 3. `CAPSTAT_*` environment variables, `__` separating nested keys
//!    (e.g. `CAPSTAT_LOGGING__LEVEL=debug`, `CAPSTAT_ACTORS=placer,filler`)
//! 4. Command-line arguments

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Cli;

const DEFAULT_CONFIG_FILE: &str = "capstat";
const ENV_PREFIX: &str = "CAPSTAT";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory containing CapabilityStatement XML files
    pub capstat_dir: PathBuf,
    /// Output directory for the per-actor tables
    pub data_dir: PathBuf,
    /// Actor defaults document
    pub defaults_path: PathBuf,
    /// Actor allowlist; `None` processes every actor
    pub actors: Option<Vec<String>>,
    pub recreate: bool,
    pub strict: bool,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// daily, hourly, minutely or never
    pub file_rotation: String,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            capstat_dir: home
                .join("Development")
                .join("hl7au")
                .join("mjo-au-fhir-erequesting")
                .join("input")
                .join("resources"),
            data_dir: home.join("data").join("capstat-review"),
            defaults_path: PathBuf::from(ferrum_capstat::DEFAULT_DEFAULTS_PATH),
            actors: None,
            recreate: false,
            strict: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_enabled: false,
            file_directory: "logs".to_string(),
            file_prefix: "capstat".to_string(),
            file_rotation: "daily".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the optional file and the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("actors")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Command-line arguments take precedence over every other source.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.capstatdir {
            self.capstat_dir = dir.clone();
        }
        if let Some(dir) = &cli.datadir {
            self.data_dir = dir.clone();
        }
        if let Some(actors) = &cli.actors {
            self.actors = Some(actors.clone());
        }
        if let Some(path) = &cli.defaults {
            self.defaults_path = path.clone();
        }
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
        self.recreate |= cli.recreate;
        self.strict |= cli.strict;
        self.logging.json |= cli.log_json;
    }

    /// Normalized allowlist: trimmed, without empty entries.
    pub fn actor_allowlist(&self) -> Option<Vec<String>> {
        self.actors.as_ref().map(|actors| {
            actors
                .iter()
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("output directory must not be empty".to_string());
        }
        if self.capstat_dir.starts_with(&self.data_dir) {
            return Err(format!(
                "input directory {} must not be inside the output directory {}",
                self.capstat_dir.display(),
                self.data_dir.display()
            ));
        }
        if !matches!(
            self.logging.file_rotation.as_str(),
            "daily" | "hourly" | "minutely" | "never"
        ) {
            return Err(format!(
                "unknown log file rotation '{}'",
                self.logging.file_rotation
            ));
        }
        Ok(())
    }
}
