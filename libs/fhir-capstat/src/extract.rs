//! Extraction of per-resource conformance records from a CapabilityStatement.
//!
//! Every `resource` element in the document yields one [`ConformanceRecord`],
//! merged with the defaults configured for the document's actor. Missing
//! sub-elements produce empty fields; a record is never dropped.

use roxmltree::{Descendants, Document, Node, ParsingOptions};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::defaults::{ActorDefaults, DefaultsStore};
use crate::error::{Error, Result};
use crate::xml::{descendants_named, first_descendant, first_nested, is_fhir_element, value_of};

/// Output column names, in table order.
pub const COLUMNS: [&str; 9] = [
    "resource",
    "resourceConformance",
    "defaultResourceConformance",
    "profileConformance",
    "defaultProfileConformance",
    "interaction",
    "defaultInteraction",
    "searchParams",
    "defaultSearchParams",
];

/// Interactions reported in the `interaction` column, in output order.
pub const INTERACTION_ORDER: [&str; 4] = ["read", "search-type", "create", "update"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConformanceRecord {
    pub resource: String,
    pub resource_conformance: String,
    pub default_resource_conformance: String,
    pub profile_conformance: String,
    pub default_profile_conformance: String,
    pub interaction: String,
    pub default_interaction: String,
    pub search_params: String,
    pub default_search_params: String,
}

impl ConformanceRecord {
    /// Field values in [`COLUMNS`] order.
    pub fn fields(&self) -> [&str; 9] {
        [
            &self.resource,
            &self.resource_conformance,
            &self.default_resource_conformance,
            &self.profile_conformance,
            &self.default_profile_conformance,
            &self.interaction,
            &self.default_interaction,
            &self.search_params,
            &self.default_search_params,
        ]
    }

    pub fn from_fields(fields: [String; 9]) -> Self {
        let [
            resource,
            resource_conformance,
            default_resource_conformance,
            profile_conformance,
            default_profile_conformance,
            interaction,
            default_interaction,
            search_params,
            default_search_params,
        ] = fields;
        Self {
            resource,
            resource_conformance,
            default_resource_conformance,
            profile_conformance,
            default_profile_conformance,
            interaction,
            default_interaction,
            search_params,
            default_search_params,
        }
    }
}

/// Outcome of extracting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Records(Vec<ConformanceRecord>),
    /// The document contains no `resource` elements.
    NoResources,
}

/// A parsed CapabilityStatement.
pub struct CapabilityDocument<'input> {
    doc: Document<'input>,
}

impl<'input> CapabilityDocument<'input> {
    pub fn parse(text: &'input str) -> std::result::Result<Self, roxmltree::Error> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        Ok(Self {
            doc: Document::parse_with_options(text, options)?,
        })
    }

    pub fn resource_count(&self) -> usize {
        descendants_named(self.doc.root_element(), "resource").count()
    }

    /// Lazily build one record per `resource` element, in document order.
    pub fn records<'a>(&'a self, actor: &str, defaults: &DefaultsStore) -> Records<'a, 'input> {
        let mut nodes = self.doc.root_element().descendants();
        // The root itself never counts as a resource.
        nodes.next();
        Records {
            nodes,
            defaults: defaults.for_actor(actor),
        }
    }

    pub fn extract(&self, actor: &str, defaults: &DefaultsStore) -> Extraction {
        let records: Vec<_> = self.records(actor, defaults).collect();
        if records.is_empty() {
            Extraction::NoResources
        } else {
            Extraction::Records(records)
        }
    }
}

/// Iterator over the conformance records of a [`CapabilityDocument`].
pub struct Records<'a, 'input: 'a> {
    nodes: Descendants<'a, 'input>,
    defaults: ActorDefaults,
}

impl Iterator for Records<'_, '_> {
    type Item = ConformanceRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let resource = self.nodes.find(|n| is_fhir_element(n, "resource"))?;
        Some(resource_record(resource, &self.defaults))
    }
}

/// Read and parse `document_path`, then extract its records for `actor`.
pub fn extract(
    document_path: impl AsRef<Path>,
    actor: &str,
    defaults: &DefaultsStore,
) -> Result<Extraction> {
    let path = document_path.as_ref();
    let text = read_document(path)?;
    let document = parse_document(path, &text)?;

    let extraction = document.extract(actor, defaults);
    if let Extraction::Records(records) = &extraction {
        tracing::debug!(
            path = %path.display(),
            actor,
            resources = records.len(),
            "Extracted conformance records"
        );
    }
    Ok(extraction)
}

pub(crate) fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

pub(crate) fn parse_document<'input>(
    path: &Path,
    text: &'input str,
) -> Result<CapabilityDocument<'input>> {
    CapabilityDocument::parse(text).map_err(|source| Error::Xml {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract from an in-memory document.
pub fn extract_str(
    xml: &str,
    actor: &str,
    defaults: &DefaultsStore,
) -> std::result::Result<Extraction, roxmltree::Error> {
    Ok(CapabilityDocument::parse(xml)?.extract(actor, defaults))
}

fn resource_record(resource: Node, defaults: &ActorDefaults) -> ConformanceRecord {
    ConformanceRecord {
        resource: value_of(first_descendant(resource, "type")),
        // First conformance extension wins, wherever it sits below the resource.
        resource_conformance: value_of(first_nested(resource, "extension", "valueCode")),
        default_resource_conformance: defaults.resource_conformance.clone(),
        profile_conformance: profile_conformance(resource),
        default_profile_conformance: defaults.profile_conformance.clone(),
        interaction: interactions(resource),
        default_interaction: defaults.interaction.clone(),
        search_params: search_params(resource),
        default_search_params: defaults.search_params.clone(),
    }
}

/// `name:code` per supported profile; the name is the canonical's last path segment.
fn profile_conformance(resource: Node) -> String {
    descendants_named(resource, "supportedProfile")
        .map(|profile| {
            let canonical = profile.attribute("value").unwrap_or_default();
            let name = canonical.rsplit('/').next().unwrap_or(canonical);
            let code = value_of(first_descendant(profile, "valueCode"));
            format!("{name}:{code}")
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn interactions(resource: Node) -> String {
    let mut by_code: HashMap<&str, String> = HashMap::new();
    for interaction in descendants_named(resource, "interaction") {
        let (Some(code), Some(conformance)) = (
            first_descendant(interaction, "code"),
            first_descendant(interaction, "valueCode"),
        ) else {
            continue;
        };
        let (Some(code), Some(conformance)) =
            (code.attribute("value"), conformance.attribute("value"))
        else {
            continue;
        };
        // Duplicate codes: the later element replaces the earlier one.
        by_code.insert(code, format!("{conformance} {code}"));
    }

    INTERACTION_ORDER
        .iter()
        .filter_map(|code| by_code.remove(code))
        .collect::<Vec<_>>()
        .join(", ")
}

fn search_params(resource: Node) -> String {
    descendants_named(resource, "searchParam")
        .filter_map(|param| {
            let name = first_descendant(param, "name")?;
            let conformance = first_descendant(param, "valueCode")?;
            Some(format!(
                "{}:{}",
                value_of(Some(name)),
                value_of(Some(conformance))
            ))
        })
        .collect::<Vec<_>>()
        .join(",")
}
