//! A mutable element tree with per-element row tracking, used by the
//! Document Loader and Structure Validator. Distinct from
//! `saftcr_schema::xsd_tree::XsdNode`, which is read-only and used only to
//! load the (static) XSD itself.

use failure::Fail;
use quick_xml::events::Event;
use quick_xml::Reader;
use saftcr_schema::line_map::{ElementId, LineMap};
use std::collections::BTreeMap;

/// Failure while parsing an audit file's XML.
#[derive(Debug, Fail)]
pub enum TreeParseError {
    /// The underlying XML reader choked; the message is whatever quick-xml
    /// reported, inspected by the Document Loader to pick a healing step.
    #[fail(display = "{}", _0)]
    Malformed(String),
    /// The document had no root element.
    #[fail(display = "document is empty")]
    Empty,
}

/// One element in a parsed audit file.
#[derive(Debug)]
pub struct Node {
    /// Local name (namespace prefix stripped).
    pub tag: String,
    /// Attribute local-name → value.
    pub attrs: BTreeMap<String, String>,
    /// Text content, if any (leaf elements only, in this profile).
    pub text: Option<String>,
    /// Child element ids, in document order.
    pub children: Vec<ElementId>,
    /// Parent element id (`None` only for the root).
    pub parent: Option<ElementId>,
}

/// An arena-backed, mutably-editable element tree.
///
/// Removal orphans a node rather than compacting the arena, so previously
/// issued [`ElementId`]s (and therefore [`LineMap`] entries) stay valid for
/// the lifetime of one file analysis.
#[derive(Debug)]
pub struct ElementTree {
    nodes: Vec<Node>,
    root: ElementId,
}

fn local_name(qname: &[u8]) -> String {
    let full = String::from_utf8_lossy(qname);
    match full.rfind(':') {
        Some(idx) => full[idx + 1..].to_string(),
        None => full.into_owned(),
    }
}

/// Converts a byte offset into a 1-based source row, via a precomputed
/// newline index.
struct RowIndex {
    newline_offsets: Vec<usize>,
}

impl RowIndex {
    fn build(source: &str) -> Self {
        let newline_offsets = source
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i)
            .collect();
        RowIndex { newline_offsets }
    }

    fn row_at(&self, offset: usize) -> u32 {
        match self.newline_offsets.binary_search(&offset) {
            Ok(i) | Err(i) => (i + 1) as u32,
        }
    }
}

impl ElementTree {
    /// Parse `source` into a fresh tree, recording every element's source
    /// row into `line_map`.
    pub fn parse(source: &str, line_map: &mut LineMap) -> Result<Self, TreeParseError> {
        let rows = RowIndex::build(source);
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(true);

        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<ElementId> = Vec::new();
        let mut root: Option<ElementId> = None;

        loop {
            let pos = reader.buffer_position() as usize;
            let row = rows.row_at(pos);
            match reader
                .read_event()
                .map_err(|e| TreeParseError::Malformed(e.to_string()))?
            {
                Event::Start(e) => {
                    let id = push_node(&mut nodes, local_name(e.name().as_ref()), &e, stack.last().copied());
                    attach(&mut nodes, &mut root, &mut stack, id);
                    line_map.record(id, row);
                    stack.push(id);
                }
                Event::Empty(e) => {
                    let id = push_node(&mut nodes, local_name(e.name().as_ref()), &e, stack.last().copied());
                    attach(&mut nodes, &mut root, &mut stack, id);
                    line_map.record(id, row);
                }
                Event::Text(t) => {
                    if let Some(&parent) = stack.last() {
                        if let Ok(text) = t.unescape() {
                            let text = text.into_owned();
                            if !text.trim().is_empty() {
                                nodes[parent as usize].text = Some(text);
                            }
                        }
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let root = root.ok_or(TreeParseError::Empty)?;
        Ok(ElementTree { nodes, root })
    }

    /// The root element's id.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Look up a node by id.
    pub fn node(&self, id: ElementId) -> &Node {
        &self.nodes[id as usize]
    }

    /// Look up a node's tag by id.
    pub fn tag(&self, id: ElementId) -> &str {
        &self.nodes[id as usize].tag
    }

    /// This node's children, in document order.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.nodes[id as usize].children
    }

    /// This node's parent, if any.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes[id as usize].parent
    }

    /// Depth-first iterator over the whole tree, rooted at `id`.
    pub fn walk(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut stack = vec![id];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            for &child in self.nodes[next as usize].children.iter().rev() {
                stack.push(child);
            }
            Some(next)
        })
    }

    /// Append a synthetic child with the given tag and text under `parent`,
    /// returning its newly allocated id. Does not touch the Line Map;
    /// callers record synthetic origin themselves (the id is only known
    /// after allocation).
    pub fn append_synthetic_child(&mut self, parent: ElementId, tag: &str, text: &str) -> ElementId {
        let id = self.nodes.len() as ElementId;
        self.nodes.push(Node {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            text: Some(text.to_string()),
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent as usize].children.push(id);
        id
    }

    /// Insert a synthetic element with the given tag and text immediately
    /// before `sibling` under `sibling`'s parent, returning its new id.
    ///
    /// Panics if `sibling` is the root (the root has no parent to insert
    /// a sibling under).
    pub fn insert_synthetic_before(&mut self, sibling: ElementId, tag: &str, text: &str) -> ElementId {
        let parent = self.nodes[sibling as usize]
            .parent
            .expect("insert_synthetic_before: sibling has no parent");
        let id = self.nodes.len() as ElementId;
        self.nodes.push(Node {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            text: Some(text.to_string()),
            children: Vec::new(),
            parent: Some(parent),
        });
        let siblings = &mut self.nodes[parent as usize].children;
        let pos = siblings.iter().position(|&s| s == sibling).unwrap_or(siblings.len());
        siblings.insert(pos, id);
        id
    }

    /// Detach `id` from its parent's children list. The node itself stays
    /// resident in the arena (orphaned) so its id, and any Line Map entry
    /// keyed on it, stays valid.
    pub fn remove(&mut self, id: ElementId) {
        if let Some(parent) = self.nodes[id as usize].parent {
            self.nodes[parent as usize].children.retain(|&c| c != id);
        }
    }
}

fn push_node(
    nodes: &mut Vec<Node>,
    tag: String,
    e: &quick_xml::events::BytesStart,
    parent: Option<ElementId>,
) -> ElementId {
    let mut attrs = BTreeMap::new();
    for attr in e.attributes().flatten() {
        let key = local_name(attr.key.as_ref());
        if let Ok(value) = attr.unescape_value() {
            attrs.insert(key, value.into_owned());
        }
    }
    let id = nodes.len() as ElementId;
    nodes.push(Node {
        tag,
        attrs,
        text: None,
        children: Vec::new(),
        parent,
    });
    id
}

fn attach(nodes: &mut [Node], root: &mut Option<ElementId>, stack: &mut [ElementId], id: ElementId) {
    match stack.last() {
        Some(&parent) => nodes[parent as usize].children.push(id),
        None => *root = Some(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_tree_with_rows() {
        let xml = "<root>\n  <a>text</a>\n  <b/>\n</root>";
        let mut lm = LineMap::new();
        let tree = ElementTree::parse(xml, &mut lm).unwrap();
        assert_eq!(tree.tag(tree.root()), "root");
        let children = tree.children(tree.root());
        assert_eq!(children.len(), 2);
        assert_eq!(tree.tag(children[0]), "a");
        assert_eq!(lm.row_of(children[0]), Some(2));
        assert_eq!(tree.node(children[0]).text.as_deref(), Some("text"));
    }

    #[test]
    fn synthetic_insertion_and_removal() {
        let xml = "<root><a/><b/></root>";
        let mut lm = LineMap::new();
        let mut tree = ElementTree::parse(xml, &mut lm).unwrap();
        let root = tree.root();
        let b = tree.children(root)[1];
        let dummy = tree.insert_synthetic_before(b, "c", "SENTINEL");
        lm.record_synthetic(dummy, lm.row_of(b).unwrap());
        assert_eq!(tree.children(root), &[tree.children(root)[0], dummy, b]);

        tree.remove(dummy);
        assert_eq!(tree.children(root).len(), 2);
        assert!(lm.is_synthetic(dummy));
    }
}
