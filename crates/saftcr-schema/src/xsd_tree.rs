//! A minimal read-only element tree, used only to load the (static) XSD
//! document once at startup. The audit-file tree used by `saftcr-xml` is a
//! separate, mutable structure with line tracking; this one needs neither.

use failure::Fail;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

/// One XML element in the loaded XSD.
#[derive(Debug, Default)]
pub struct XsdNode {
    /// Local name (namespace prefix stripped).
    pub tag: String,
    /// Attribute local-name → value.
    pub attrs: BTreeMap<String, String>,
    /// Child elements, in document order.
    pub children: Vec<XsdNode>,
}

/// Failure while loading the XSD's own XML.
#[derive(Debug, Fail)]
pub enum XsdParseError {
    /// The underlying XML reader choked.
    #[fail(display = "malformed XSD XML: {}", _0)]
    Malformed(String),
    /// The document had no root element.
    #[fail(display = "XSD document is empty")]
    Empty,
}

fn local_name(qname: &[u8]) -> String {
    let full = String::from_utf8_lossy(qname);
    match full.rfind(':') {
        Some(idx) => full[idx + 1..].to_string(),
        None => full.into_owned(),
    }
}

/// Parse an XSD source string into a read-only tree rooted at `xs:schema`.
pub fn parse(source: &str) -> Result<XsdNode, XsdParseError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XsdNode> = Vec::new();
    let mut root: Option<XsdNode> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| XsdParseError::Malformed(e.to_string()))?
        {
            Event::Start(e) => {
                let mut node = XsdNode {
                    tag: local_name(e.name().as_ref()),
                    ..Default::default()
                };
                for attr in e.attributes().flatten() {
                    let key = local_name(attr.key.as_ref());
                    if let Ok(value) = attr.unescape_value() {
                        node.attrs.insert(key, value.into_owned());
                    }
                }
                stack.push(node);
            }
            Event::Empty(e) => {
                let mut node = XsdNode {
                    tag: local_name(e.name().as_ref()),
                    ..Default::default()
                };
                for attr in e.attributes().flatten() {
                    let key = local_name(attr.key.as_ref());
                    if let Ok(value) = attr.unescape_value() {
                        node.attrs.insert(key, value.into_owned());
                    }
                }
                push_finished_node(&mut stack, &mut root, node);
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    push_finished_node(&mut stack, &mut root, node);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or(XsdParseError::Empty)
}

fn push_finished_node(stack: &mut Vec<XsdNode>, root: &mut Option<XsdNode>, node: XsdNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else {
        *root = Some(node);
    }
}

impl XsdNode {
    /// Depth-first iterator over this node and every descendant.
    pub fn walk(&self) -> impl Iterator<Item = &XsdNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            for child in node.children.iter().rev() {
                stack.push(child);
            }
            Some(node)
        })
    }
}
