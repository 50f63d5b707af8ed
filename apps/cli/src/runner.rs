//! Batch processing of a CapabilityStatement directory.

use anyhow::Context;
use ferrum_capstat::{process_document, resolve_actor, Outcome};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Per-run document counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub written: usize,
    pub empty: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Create the output directory, wiping it first when `recreate` is set.
pub fn prepare_output_dir(path: &Path, recreate: bool) -> anyhow::Result<()> {
    if path.exists() && recreate {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    fs::create_dir_all(path).with_context(|| format!("Failed to create {}", path.display()))
}

/// `.xml` files directly inside `dir`, sorted by file name.
pub fn discover_documents(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        let path = entry.path();
        let is_xml = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".xml"));
        if is_xml && path.is_file() {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

pub fn run(config: &Config) -> anyhow::Result<RunSummary> {
    prepare_output_dir(&config.data_dir, config.recreate)?;
    let documents = discover_documents(&config.capstat_dir)?;
    let allowlist = config.actor_allowlist();

    tracing::info!(
        input = %config.capstat_dir.display(),
        output = %config.data_dir.display(),
        documents = documents.len(),
        "Processing CapabilityStatements"
    );

    let mut summary = RunSummary::default();
    for document in &documents {
        let file_name = document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let resolution = resolve_actor(document);
        if let (Some(allowlist), Some(actor)) = (&allowlist, resolution.actor()) {
            if !allowlist.iter().any(|a| a == actor) {
                tracing::info!(file = %file_name, actor, "Skipping, actor not selected");
                summary.skipped += 1;
                continue;
            }
        }

        match process_document(document, &config.data_dir, &config.defaults_path) {
            Ok(Outcome::Written { .. }) => summary.written += 1,
            Ok(Outcome::NoResources { .. }) => summary.empty += 1,
            Ok(Outcome::Skipped { .. }) => summary.skipped += 1,
            Err(e) => {
                tracing::error!(file = %file_name, error = %e, "Failed to process CapabilityStatement");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
