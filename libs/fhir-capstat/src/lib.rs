//! Per-actor conformance summaries from FHIR CapabilityStatement XML.
//!
//! A CapabilityStatement named `<anything>-<actor>.xml` describes what one
//! actor supports for each resource: resource and profile conformance,
//! interactions and search parameters. This crate extracts those facts,
//! merges them with per-actor defaults from a JSON document, and writes one
//! tab-separated table per actor.
//!
//! # Example
//!
//! ```rust,no_run
//! use ferrum_capstat::{process_document, Outcome};
//!
//! # fn main() -> ferrum_capstat::Result<()> {
//! match process_document(
//!     "resources/CapabilityStatement-placer.xml",
//!     "out",
//!     "config/actor.json",
//! )? {
//!     Outcome::Written { output, .. } => println!("wrote {}", output.display()),
//!     Outcome::NoResources { .. } | Outcome::Skipped { .. } => {}
//! }
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod defaults;
pub mod error;
pub mod extract;
pub mod table;
pub mod xml;

use std::path::{Path, PathBuf};

pub use actor::{resolve_actor, ActorResolution};
pub use defaults::{ActorDefaults, DefaultsStore};
pub use error::{Error, Result};
pub use extract::{
    extract, extract_str, CapabilityDocument, ConformanceRecord, Extraction, COLUMNS,
    INTERACTION_ORDER,
};
pub use table::{emit, read_table, read_table_file, write_table};

/// Conventional location of the actor defaults document.
pub const DEFAULT_DEFAULTS_PATH: &str = "./config/actor.json";

/// What happened to a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written {
        actor: String,
        source: PathBuf,
        output: PathBuf,
        records: usize,
    },
    NoResources {
        source: PathBuf,
    },
    /// The file name is not a CapabilityStatement (`.xml`) name.
    Skipped {
        source: PathBuf,
    },
}

/// Resolve, extract, merge and emit one CapabilityStatement.
///
/// The defaults document is loaded on every call that finds resources; a
/// missing one degrades to empty defaults.
pub fn process_document(
    document_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    defaults_path: impl AsRef<Path>,
) -> Result<Outcome> {
    let source = document_path.as_ref();
    let actor = match resolve_actor(source) {
        ActorResolution::Actor(actor) => actor,
        ActorResolution::NotApplicable => {
            tracing::debug!(path = %source.display(), "Not a CapabilityStatement file name");
            return Ok(Outcome::Skipped {
                source: source.to_path_buf(),
            });
        }
    };

    let text = extract::read_document(source)?;
    let document = extract::parse_document(source, &text)?;
    if document.resource_count() == 0 {
        tracing::info!(path = %source.display(), "No resource elements found in the XML");
        return Ok(Outcome::NoResources {
            source: source.to_path_buf(),
        });
    }

    // Defaults are only consulted once the document is known to have resources.
    let defaults = DefaultsStore::load(defaults_path)?;
    let records: Vec<_> = document.records(&actor, &defaults).collect();

    let output = emit(&actor, &records, output_dir)?;
    let xml_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::info!(
        actor = %actor,
        source = %xml_name,
        output = %output.display(),
        resources = records.len(),
        "Processed CapabilityStatement"
    );

    Ok(Outcome::Written {
        actor,
        source: source.to_path_buf(),
        output,
        records: records.len(),
    })
}
