//! Actor defaults store.
//!
//! The defaults document maps `category -> actor -> value`. The scalar
//! categories (`resourceConformance`, `profileConformance`) hold a code per
//! actor; the mapping categories (`interaction`, `searchParams`) hold an
//! ordered `code -> value` mapping per actor. Key order of the source
//! document is preserved and drives the rendering order of defaults.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};

pub const RESOURCE_CONFORMANCE: &str = "resourceConformance";
pub const PROFILE_CONFORMANCE: &str = "profileConformance";
pub const INTERACTION: &str = "interaction";
pub const SEARCH_PARAMS: &str = "searchParams";

/// Per-actor fallback conformance values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct DefaultsStore {
    categories: Map<String, Value>,
}

impl DefaultsStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the store from a JSON document.
    ///
    /// A missing file is not an error: it yields an empty store and a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "Configuration file not found, using empty defaults"
                );
                return Ok(Self::empty());
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        let store = Self::from_json_str(&content).map_err(|source| Error::Defaults {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            categories = store.categories.len(),
            "Loaded actor defaults"
        );
        Ok(store)
    }

    pub fn from_json_str(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Two-level lookup. A missing category and a missing actor are both `None`.
    pub fn lookup(&self, category: &str, actor: &str) -> Option<&Value> {
        self.categories
            .get(category)
            .and_then(Value::as_object)
            .and_then(|actors| actors.get(actor))
    }

    /// Scalar default for `category`/`actor`, empty when absent or not a scalar.
    pub fn scalar(&self, category: &str, actor: &str) -> String {
        match self.lookup(category, actor) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(v @ (Value::Bool(_) | Value::Number(_))) => v.to_string(),
            Some(other) => {
                tracing::debug!(category, actor, value = %other, "Ignoring non-scalar default");
                String::new()
            }
        }
    }

    /// Ordered `(key, value)` pairs of a mapping default, empty when absent.
    pub fn entries(&self, category: &str, actor: &str) -> Vec<(&str, String)> {
        match self.lookup(category, actor) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.as_str(), render_scalar(v)))
                .collect(),
            Some(other) => {
                tracing::debug!(category, actor, value = %other, "Ignoring non-mapping default");
                Vec::new()
            }
        }
    }

    /// Resolve every default column for one actor.
    pub fn for_actor(&self, actor: &str) -> ActorDefaults {
        ActorDefaults {
            resource_conformance: self.resource_conformance(actor),
            profile_conformance: self.profile_conformance(actor),
            interaction: self.interaction(actor),
            search_params: self.search_params(actor),
        }
    }

    pub fn resource_conformance(&self, actor: &str) -> String {
        self.scalar(RESOURCE_CONFORMANCE, actor)
    }

    pub fn profile_conformance(&self, actor: &str) -> String {
        self.scalar(PROFILE_CONFORMANCE, actor)
    }

    /// `"<value> <code>"` pairs joined with `", "`.
    pub fn interaction(&self, actor: &str) -> String {
        self.entries(INTERACTION, actor)
            .into_iter()
            .map(|(code, value)| format!("{value} {code}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `"<name>:<value>"` pairs joined with `,`.
    pub fn search_params(&self, actor: &str) -> String {
        self.entries(SEARCH_PARAMS, actor)
            .into_iter()
            .map(|(name, value)| format!("{name}:{value}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Rendered default columns for a single actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorDefaults {
    pub resource_conformance: String,
    pub profile_conformance: String,
    pub interaction: String,
    pub search_params: String,
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
