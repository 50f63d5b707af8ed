//! Actor resolution from CapabilityStatement file names.
//!
//! Files follow the `<anything>-<actor>.xml` naming convention, e.g.
//! `capstat-myspec-placer.xml` describes the `placer` actor.

use std::path::Path;

const XML_SUFFIX: &str = ".xml";

/// Result of resolving an actor from a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorResolution {
    Actor(String),
    /// The name does not end in `.xml`; the file should be skipped.
    NotApplicable,
}

impl ActorResolution {
    pub fn actor(&self) -> Option<&str> {
        match self {
            ActorResolution::Actor(actor) => Some(actor),
            ActorResolution::NotApplicable => None,
        }
    }
}

/// Derive the actor from a file name (or path; only the final component is used).
///
/// The token after the last `-` of the stem is the actor. A stem without any
/// `-` is returned whole.
pub fn resolve_actor(filename: impl AsRef<Path>) -> ActorResolution {
    let path = filename.as_ref();
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return ActorResolution::NotApplicable,
    };

    match name.strip_suffix(XML_SUFFIX) {
        Some(stem) => {
            let actor = stem.rsplit('-').next().unwrap_or(stem);
            ActorResolution::Actor(actor.to_string())
        }
        None => ActorResolution::NotApplicable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_last_hyphen_segment() {
        assert_eq!(
            resolve_actor("capstat-myspec-actorA.xml"),
            ActorResolution::Actor("actorA".into())
        );
    }

    #[test]
    fn non_xml_is_not_applicable() {
        assert_eq!(resolve_actor("notes.txt"), ActorResolution::NotApplicable);
        assert_eq!(resolve_actor("capstat-placer.XML"), ActorResolution::NotApplicable);
        assert_eq!(resolve_actor("capstat-placer.xml.bak"), ActorResolution::NotApplicable);
    }

    #[test]
    fn name_without_hyphen_is_its_own_actor() {
        assert_eq!(resolve_actor("filler.xml"), ActorResolution::Actor("filler".into()));
    }

    #[test]
    fn only_file_name_is_considered() {
        let resolved = resolve_actor("/data/au-erequesting/CapabilityStatement-placer.xml");
        assert_eq!(resolved.actor(), Some("placer"));
    }

    #[test]
    fn trailing_hyphen_yields_empty_actor() {
        assert_eq!(resolve_actor("capstat-.xml"), ActorResolution::Actor(String::new()));
    }
}
