//! The Schema Index: per-element metadata derived once from the XSD.

use crate::xsd_tree::{self, XsdNode, XsdParseError};
use failure::Fail;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// Failure while building a [`SchemaIndex`].
#[derive(Debug, Fail)]
pub enum SchemaError {
    /// The XSD file could not be read.
    #[fail(display = "could not read XSD file: {}", _0)]
    Io(String),
    /// The XSD's own XML was malformed.
    #[fail(display = "{}", _0)]
    Parse(XsdParseError),
    /// No global element declaration was found at all.
    #[fail(display = "XSD declares no root element")]
    NoRootElement,
}

impl From<XsdParseError> for SchemaError {
    fn from(e: XsdParseError) -> Self {
        SchemaError::Parse(e)
    }
}

/// Per-element metadata the structural validator consults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementMeta {
    /// The `type` attribute of the declaration, if it referenced a named
    /// complex type rather than declaring one inline.
    pub type_name: Option<String>,
    /// `true` if this element is optional under its parent.
    pub optional: bool,
    /// `(name, optional, repeatable)` for each direct child, in declaration
    /// order. `repeatable` mirrors `maxOccurs` > 1 / `unbounded`: the
    /// Structure Validator matches a repeatable child against any number of
    /// consecutive actual occurrences instead of at most one.
    pub direct_children: Vec<(String, bool, bool)>,
    /// Every element name reachable by recursively following
    /// `direct_children`.
    pub transitive_children: BTreeSet<String>,
    /// Every tag this element was found as a direct child of.
    pub parents: BTreeSet<String>,
}

/// Element-metadata lookup built once from the bundled XSD.
#[derive(Clone, Debug, Default)]
pub struct SchemaIndex {
    elements: HashMap<String, ElementMeta>,
    root_name: Option<String>,
}

impl SchemaIndex {
    /// Load and build the index from an XSD file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let source = fs::read_to_string(path.as_ref())
            .map_err(|e| SchemaError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_str(&source)
    }

    /// Build the index from an in-memory XSD string (used by tests and by
    /// `saftcr-xml`'s healed-namespace rebuild path).
    pub fn from_str(source: &str) -> Result<Self, SchemaError> {
        let tree = xsd_tree::parse(source)?;
        Self::from_tree(&tree)
    }

    fn from_tree(schema: &XsdNode) -> Result<Self, SchemaError> {
        let named_types = collect_named_types(schema);

        let mut elements: HashMap<String, ElementMeta> = HashMap::new();
        let mut root_name = None;

        for top in &schema.children {
            if top.tag != "element" {
                continue;
            }
            let name = match top.attrs.get("name") {
                Some(n) => n.clone(),
                None => continue,
            };
            if root_name.is_none() {
                root_name = Some(name.clone());
            }
            build_element_meta(top, &named_types, &mut elements);
        }

        if root_name.is_none() {
            return Err(SchemaError::NoRootElement);
        }

        derive_transitive_and_parents(&mut elements);

        Ok(SchemaIndex {
            elements,
            root_name,
        })
    }

    /// Look up metadata for an element by local name.
    pub fn lookup(&self, name: &str) -> Option<&ElementMeta> {
        self.elements.get(name)
    }

    /// The document's expected root element local name.
    pub fn root_name(&self) -> Option<&str> {
        self.root_name.as_deref()
    }

    /// `true` if `child` is declared as a direct child of `parent`.
    pub fn is_direct_child(&self, parent: &str, child: &str) -> bool {
        self.lookup(parent)
            .map(|meta| meta.direct_children.iter().any(|(n, _, _)| n == child))
            .unwrap_or(false)
    }

    /// `true` if `child` is declared as a direct, *optional* child of
    /// `parent`.
    pub fn is_optional_direct_child(&self, parent: &str, child: &str) -> bool {
        self.lookup(parent)
            .map(|meta| {
                meta.direct_children
                    .iter()
                    .any(|(n, optional, _)| n == child && *optional)
            })
            .unwrap_or(false)
    }

    /// Every tag `child` is declared under, anywhere in the schema.
    pub fn parents_of(&self, child: &str) -> BTreeSet<String> {
        self.lookup(child)
            .map(|meta| meta.parents.clone())
            .unwrap_or_default()
    }
}

/// Name → cloned `xs:element` child declarations of a named `xs:complexType`.
fn collect_named_types(schema: &XsdNode) -> HashMap<String, Vec<XsdNode>> {
    let mut types = HashMap::new();
    for node in schema.walk() {
        if node.tag == "complexType" {
            if let Some(name) = node.attrs.get("name") {
                types.insert(name.clone(), sequence_element_children(node));
            }
        }
    }
    types
}

/// Cloned `xs:element` children of the first `xs:sequence`/`xs:choice`/`xs:all`
/// found directly under a complex type. Children of an `xs:choice` are all
/// treated as optional, since at most one is actually present per instance.
fn sequence_element_children(complex_type: &XsdNode) -> Vec<XsdNode> {
    for child in &complex_type.children {
        if child.tag == "sequence" || child.tag == "choice" || child.tag == "all" {
            let force_optional = child.tag == "choice";
            return child
                .children
                .iter()
                .filter(|n| n.tag == "element")
                .map(|n| {
                    if force_optional && n.attrs.get("minOccurs").map(|m| m.as_str()) != Some("0")
                    {
                        let mut n = clone_node(n);
                        n.attrs.insert("minOccurs".to_string(), "0".to_string());
                        n
                    } else {
                        clone_node(n)
                    }
                })
                .collect();
        }
    }
    Vec::new()
}

fn clone_node(node: &XsdNode) -> XsdNode {
    XsdNode {
        tag: node.tag.clone(),
        attrs: node.attrs.clone(),
        children: node.children.iter().map(clone_node).collect(),
    }
}

fn is_optional(node: &XsdNode) -> bool {
    node.attrs
        .get("minOccurs")
        .map(|m| m == "0")
        .unwrap_or(false)
}

/// `true` if `maxOccurs` permits more than one instance (`unbounded` or a
/// number greater than 1). A real XSD-validating parser never treats extra
/// instances of such an element as an error; the Structure Validator must
/// match it against any run of consecutive occurrences instead of at most
/// one.
fn is_repeatable(node: &XsdNode) -> bool {
    node.attrs
        .get("maxOccurs")
        .map(|m| m == "unbounded" || m.parse::<u32>().map(|n| n > 1).unwrap_or(false))
        .unwrap_or(false)
}

/// Populate `elements[name]` for `node` (an `xs:element`) and recurse into
/// its children, resolving a `type="..."` reference against `named_types`
/// when the element has no inline `xs:complexType` of its own.
fn build_element_meta(
    node: &XsdNode,
    named_types: &HashMap<String, Vec<XsdNode>>,
    elements: &mut HashMap<String, ElementMeta>,
) {
    let name = match node.attrs.get("name") {
        Some(n) => n.clone(),
        None => return,
    };
    if elements.contains_key(&name) {
        return;
    }

    let type_name = node.attrs.get("type").cloned();

    let child_nodes: Vec<XsdNode> = node
        .children
        .iter()
        .find(|c| c.tag == "complexType")
        .map(sequence_element_children)
        .or_else(|| type_name.as_deref().and_then(|t| named_types.get(t)).cloned())
        .unwrap_or_default();

    let meta = ElementMeta {
        type_name: type_name.clone(),
        optional: is_optional(node),
        direct_children: child_nodes
            .iter()
            .filter_map(|c| c.attrs.get("name").map(|n| (n.clone(), is_optional(c), is_repeatable(c))))
            .collect(),
        transitive_children: BTreeSet::new(),
        parents: BTreeSet::new(),
    };
    elements.insert(name, meta);

    for child in &child_nodes {
        build_element_meta(child, named_types, elements);
    }
}

fn derive_transitive_and_parents(elements: &mut HashMap<String, ElementMeta>) {
    let direct_map: BTreeMap<String, Vec<String>> = elements
        .iter()
        .map(|(k, v)| {
            (
                k.clone(),
                v.direct_children.iter().map(|(n, _, _)| n.clone()).collect(),
            )
        })
        .collect();

    for meta in elements.values_mut() {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<String> = meta.direct_children.iter().map(|(n, _, _)| n.clone()).collect();
        while let Some(child) = stack.pop() {
            if !seen.insert(child.clone()) {
                continue;
            }
            if let Some(grandchildren) = direct_map.get(&child) {
                stack.extend(grandchildren.iter().cloned());
            }
        }
        meta.transitive_children = seen;
    }

    let parent_links: Vec<(String, String)> = direct_map
        .iter()
        .flat_map(|(parent, children)| children.iter().map(move |c| (c.clone(), parent.clone())))
        .collect();
    for (child, parent) in parent_links {
        elements
            .entry(child)
            .or_insert_with(ElementMeta::default)
            .parents
            .insert(parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:element name="auditfile">
            <xs:complexType>
                <xs:sequence>
                    <xs:element name="header" type="HeaderType"/>
                    <xs:element name="company" minOccurs="0" type="CompanyType"/>
                </xs:sequence>
            </xs:complexType>
        </xs:element>
        <xs:complexType name="HeaderType">
            <xs:sequence>
                <xs:element name="auditFileVersion"/>
            </xs:sequence>
        </xs:complexType>
        <xs:complexType name="CompanyType">
            <xs:sequence>
                <xs:element name="companyIdent"/>
            </xs:sequence>
        </xs:complexType>
    </xs:schema>"#;

    #[test]
    fn builds_direct_children_and_optionality() {
        let idx = SchemaIndex::from_str(SAMPLE).unwrap();
        assert_eq!(idx.root_name(), Some("auditfile"));
        assert!(idx.is_direct_child("auditfile", "header"));
        assert!(idx.is_direct_child("auditfile", "company"));
        assert!(!idx.is_optional_direct_child("auditfile", "header"));
        assert!(idx.is_optional_direct_child("auditfile", "company"));
    }

    #[test]
    fn resolves_named_complex_type_grandchildren() {
        let idx = SchemaIndex::from_str(SAMPLE).unwrap();
        assert!(idx.is_direct_child("header", "auditFileVersion"));
        assert!(idx.is_direct_child("company", "companyIdent"));
        assert!(idx
            .lookup("auditfile")
            .unwrap()
            .transitive_children
            .contains("auditFileVersion"));
    }

    #[test]
    fn parents_relation_is_inverted_from_children() {
        let idx = SchemaIndex::from_str(SAMPLE).unwrap();
        assert!(idx.parents_of("header").contains("auditfile"));
        assert!(idx.parents_of("company").contains("auditfile"));
    }
}
