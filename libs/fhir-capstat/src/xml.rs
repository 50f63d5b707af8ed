//! Namespace-aware navigation over FHIR XML trees.
//!
//! FHIR XML carries primitive values in the `value` attribute, so most
//! lookups here return that attribute of the first matching element.

use roxmltree::Node;

pub const FHIR_NS: &str = "http://hl7.org/fhir";

pub fn is_fhir_element(node: &Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(FHIR_NS)
}

/// All FHIR elements called `name` strictly below `node`, in document order.
pub fn descendants_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.descendants()
        .skip(1)
        .filter(move |n| is_fhir_element(n, name))
}

pub fn first_descendant<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> Option<Node<'a, 'input>> {
    descendants_named(node, name).next()
}

/// First `child` element directly inside a FHIR `parent` element below `node`
/// (the `.//parent/child` path). Parents are visited in document order.
pub fn first_nested<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    parent: &'a str,
    child: &'a str,
) -> Option<Node<'a, 'input>> {
    descendants_named(node, parent)
        .find_map(|p| p.children().find(|c| is_fhir_element(c, child)))
}

/// The `value` attribute, or an empty string when the attribute is missing.
pub fn value_of(node: Option<Node>) -> String {
    node.and_then(|n| n.attribute("value"))
        .unwrap_or_default()
        .to_string()
}
