//! Document Loader: parse an audit file, healing the well-known failure
//! modes seen in the wild before giving up.

use crate::tree::ElementTree;
use encoding_rs::WINDOWS_1252;
use saftcr_model::check::Check;
use saftcr_model::error_kind::ErrorKind;
use saftcr_model::finding::Finding;
use saftcr_schema::line_map::LineMap;
use saftcr_schema::SchemaIndex;
use std::path::Path;

/// The expected default namespace for a well-formed audit file.
pub const EXPECTED_NAMESPACE: &str = "urn:StandardAuditFile-Taxation-CashRegister:DK";

/// A document that was parsed, possibly after healing.
pub struct LoadedDocument {
    /// The parsed (and possibly healed) tree.
    pub tree: ElementTree,
    /// Source-row bookkeeping for the tree above.
    pub line_map: LineMap,
    /// `true` if the file needed a non-UTF-8 re-encode to parse at all.
    pub encoding_fixed: bool,
    /// Findings produced by the healing steps themselves (encoding repair,
    /// namespace rewrite). Structural-repair findings are produced
    /// separately by the Structure Validator.
    pub healing_findings: Vec<Finding>,
}

/// Result of attempting to load one file.
pub enum LoadOutcome {
    /// Parsing succeeded, with zero or more healing steps applied.
    Loaded(LoadedDocument),
    /// Every healing step was exhausted; the file is unreadable.
    Unreadable {
        /// `XML_FILE_CORRUPT` plus one `CANNOT_DO_CHECK_DUE_TO_READ_ERROR`
        /// per check that cannot run. The value check is skipped silently,
        /// per the component design.
        findings: Vec<Finding>,
    },
}

/// Load and heal the audit file at `path`.
pub fn load(path: &Path, schema: &SchemaIndex) -> LoadOutcome {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(_) => return unreadable(Vec::new()),
    };

    let mut healing_findings = Vec::new();
    let mut encoding_fixed = false;

    let mut source = match std::str::from_utf8(&bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            encoding_fixed = true;
            log::warn!("{}: not valid UTF-8, re-decoding as Windows-1252", path.display());
            let (decoded, _, _) = WINDOWS_1252.decode(&bytes);
            healing_findings.push(Finding::error(Check::XmlRead, ErrorKind::XmlFileEncodingCorrupt));
            decoded.into_owned()
        }
    };

    let mut line_map = LineMap::new();
    let mut parsed = ElementTree::parse(&source, &mut line_map);

    if parsed.is_err() {
        log::debug!("{}: initial parse failed, healing raw ampersands", path.display());
        let repaired = heal_raw_ampersands(&source);
        if repaired != source {
            source = repaired;
            line_map = LineMap::new();
            parsed = ElementTree::parse(&source, &mut line_map);
        }
    }

    let mut tree = match parsed {
        Ok(t) => t,
        Err(_) => return unreadable(healing_findings),
    };

    if let Some(expected_root) = schema.root_name() {
        let needs_heal = tree
            .node(tree.root())
            .attrs
            .get("xmlns")
            .map(|ns| ns != EXPECTED_NAMESPACE)
            .unwrap_or(true);
        if needs_heal {
            log::debug!("{}: root namespace mismatch, rewriting start tag", path.display());
            if let Some(rewritten) = heal_root_namespace(&source, expected_root) {
                let mut retry_map = LineMap::new();
                if let Ok(retried) = ElementTree::parse(&rewritten, &mut retry_map) {
                    tree = retried;
                    line_map = retry_map;
                    healing_findings.push(Finding::error(
                        Check::Structure,
                        ErrorKind::StructureOther {
                            xsd_error_type: "NAMESPACE_MISMATCH".to_string(),
                        },
                    ));
                }
            }
        }
    }

    LoadOutcome::Loaded(LoadedDocument {
        tree,
        line_map,
        encoding_fixed,
        healing_findings,
    })
}

fn unreadable(mut healing_findings: Vec<Finding>) -> LoadOutcome {
    healing_findings.push(Finding::error(Check::XmlRead, ErrorKind::XmlFileCorrupt));
    for check in [Check::Structure, Check::Certificate, Check::Signature] {
        healing_findings.push(Finding::error(check, ErrorKind::CannotDoCheckDueToReadError));
    }
    LoadOutcome::Unreadable {
        findings: healing_findings,
    }
}

const KNOWN_ENTITY_NAMES: [&str; 5] = ["amp;", "lt;", "gt;", "quot;", "apos;"];

/// Replace every `&` that does not start a known entity (`&amp;`, `&lt;`,
/// `&gt;`, `&quot;`, `&apos;`, or a numeric `&#…;`) with `&amp;`.
fn heal_raw_ampersands(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for (i, c) in source.char_indices() {
        if c == '&' {
            let rest = &source[i + 1..];
            let is_known =
                rest.starts_with('#') || KNOWN_ENTITY_NAMES.iter().any(|e| rest.starts_with(e));
            if is_known {
                out.push('&');
            } else {
                out.push_str("&amp;");
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Rewrite the root element's start tag so its default namespace is
/// [`EXPECTED_NAMESPACE`], injecting the attribute if absent.
fn heal_root_namespace(source: &str, root_local_name: &str) -> Option<String> {
    let (start, end) = find_root_start_tag(source, root_local_name)?;
    let tag_text = &source[start..=end];
    let healed = if let Some(attr_start) = tag_text.find("xmlns=\"") {
        let value_start = attr_start + "xmlns=\"".len();
        let value_end = tag_text[value_start..].find('"')? + value_start;
        let mut healed = String::with_capacity(tag_text.len());
        healed.push_str(&tag_text[..value_start]);
        healed.push_str(EXPECTED_NAMESPACE);
        healed.push_str(&tag_text[value_end..]);
        healed
    } else {
        let insert_at = tag_text.find(|c: char| c.is_whitespace() || c == '>' || c == '/')?;
        let mut healed = String::with_capacity(tag_text.len() + EXPECTED_NAMESPACE.len() + 10);
        healed.push_str(&tag_text[..insert_at]);
        healed.push_str(&format!(" xmlns=\"{}\"", EXPECTED_NAMESPACE));
        healed.push_str(&tag_text[insert_at..]);
        healed
    };

    let mut out = String::with_capacity(source.len() + healed.len());
    out.push_str(&source[..start]);
    out.push_str(&healed);
    out.push_str(&source[end + 1..]);
    Some(out)
}

/// Locate the byte range `[start, end]` (inclusive of `<` and `>`) of the
/// document's root start tag, skipping any leading XML/processing-
/// instruction declarations and comments.
fn find_root_start_tag(source: &str, root_local_name: &str) -> Option<(usize, usize)> {
    let mut search_from = 0;
    loop {
        let start = source[search_from..].find('<')? + search_from;
        if source[start..].starts_with("<?") || source[start..].starts_with("<!") {
            let end = source[start..].find('>')? + start;
            search_from = end + 1;
            continue;
        }
        let end = source[start..].find('>')? + start;
        let tag_text = &source[start..end];
        let name_part = tag_text[1..]
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");
        let local = name_part.rsplit(':').next().unwrap_or(name_part);
        if local == root_local_name {
            return Some((start, end));
        }
        search_from = end + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heals_raw_ampersand_leaves_known_entities_alone() {
        let input = "<a>Tom &amp; Jerry &amp Huey &#65; &amp;</a>";
        let healed = heal_raw_ampersands(input);
        assert_eq!(healed, "<a>Tom &amp; Jerry &amp;amp Huey &#65; &amp;</a>");
    }

    #[test]
    fn injects_missing_xmlns_on_root() {
        let source = "<auditfile><header/></auditfile>";
        let healed = heal_root_namespace(source, "auditfile").unwrap();
        assert!(healed.starts_with(&format!("<auditfile xmlns=\"{}\">", EXPECTED_NAMESPACE)));
    }

    #[test]
    fn replaces_wrong_xmlns_value_on_root() {
        let source = "<auditfile xmlns=\"urn:wrong\"><header/></auditfile>";
        let healed = heal_root_namespace(source, "auditfile").unwrap();
        assert!(healed.contains(&format!("xmlns=\"{}\"", EXPECTED_NAMESPACE)));
        assert!(!healed.contains("urn:wrong"));
    }
}
