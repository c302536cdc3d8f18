//! Structure Validator: the repair-and-iterate algorithm.
//!
//! Where the original tool asked libxml2 to validate against the compiled
//! XSD and parsed its error log, this validator drives the same repair loop
//! directly off the [`SchemaIndex`], which is built for exactly this
//! purpose (see its doc comment). Each pass finds the first group of
//! "identical" structural mismatches (same parent tag / involved tag),
//! heals every member of the group with the first applicable strategy, and
//! reloops until the tree matches the schema or only non-structural issues
//! (currently none are raised by this implementation) remain.

use saftcr_model::check::Check;
use saftcr_model::dummy;
use saftcr_model::error_kind::ErrorKind;
use saftcr_model::finding::Finding;
use saftcr_schema::line_map::{ElementId, LineMap};
use saftcr_schema::SchemaIndex;
use std::collections::{BTreeMap, HashSet};

use crate::tree::ElementTree;

/// One structural mismatch found by comparing a parent's actual children
/// against its schema-declared sequence.
#[derive(Clone, Debug)]
enum Issue {
    /// `tag` is present under `parent` but is not a valid child there (or
    /// its valid position has already been satisfied).
    Unexpected {
        id: ElementId,
        parent: ElementId,
        tag: String,
        /// The schema child name that "should" occupy this position, if
        /// one could be determined.
        expected_hint: Option<String>,
    },
    /// A required child `expected_tag` never appears under `parent`.
    Missing {
        parent: ElementId,
        expected_tag: String,
        /// The actual child the synthetic element must be inserted before
        /// to land in its schema-declared position. `None` means the gap
        /// is at the tail, after every actual child.
        insert_before: Option<ElementId>,
    },
}

impl Issue {
    fn group_key(&self, tree: &ElementTree) -> (&'static str, String, String) {
        match self {
            Issue::Unexpected { parent, tag, .. } => {
                ("unexpected", tree.tag(*parent).to_string(), tag.clone())
            }
            Issue::Missing {
                parent,
                expected_tag,
                ..
            } => (
                "missing",
                tree.tag(*parent).to_string(),
                expected_tag.clone(),
            ),
        }
    }
}

/// Run the repair loop to completion, mutating `tree` and `line_map` in
/// place, and return the findings the repairs produced.
pub fn validate_and_heal(
    tree: &mut ElementTree,
    line_map: &mut LineMap,
    schema: &SchemaIndex,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut added_dummies: HashSet<(ElementId, String)> = HashSet::new();

    // Schema depth bounds how many distinct repair rounds are possible;
    // this cap only guards against a logic error turning the loop infinite.
    let max_rounds = 10_000;
    for _ in 0..max_rounds {
        let issues = collect_issues(tree, schema);
        if issues.is_empty() {
            break;
        }

        let mut groups: BTreeMap<(&'static str, String, String), Vec<Issue>> = BTreeMap::new();
        for issue in issues {
            groups.entry(issue.group_key(tree)).or_default().push(issue);
        }
        let first_group = groups.into_values().next().unwrap();

        for issue in first_group {
            heal(tree, line_map, schema, &mut added_dummies, issue, &mut findings);
        }
    }

    findings
}

/// Walk every node with schema metadata and report at most one mismatch
/// per parent (the next one a reparse-and-retry loop would surface).
fn collect_issues(tree: &ElementTree, schema: &SchemaIndex) -> Vec<Issue> {
    let mut issues = Vec::new();
    for parent in tree.walk(tree.root()) {
        if let Some(issue) = diagnose(tree, schema, parent) {
            issues.push(issue);
        }
    }
    issues
}

fn diagnose(tree: &ElementTree, schema: &SchemaIndex, parent: ElementId) -> Option<Issue> {
    let parent_tag = tree.tag(parent).to_string();
    let meta = schema.lookup(&parent_tag)?;
    let expected = &meta.direct_children;
    let actual = tree.children(parent);

    let mut ei = 0usize;
    let mut ai = 0usize;
    while ai < actual.len() {
        let actual_tag = tree.tag(actual[ai]).to_string();
        if ei < expected.len() && expected[ei].0 == actual_tag {
            ai += 1;
            // A repeatable child stays the expected slot across any number
            // of consecutive occurrences instead of being consumed once.
            if !expected[ei].2 {
                ei += 1;
            }
            continue;
        }
        if let Some(offset) = expected[ei..].iter().position(|(n, _, _)| *n == actual_tag) {
            let skipped = &expected[ei..ei + offset];
            if let Some((missing_name, _, _)) = skipped.iter().find(|(_, optional, _)| !optional) {
                return Some(Issue::Missing {
                    parent,
                    expected_tag: missing_name.clone(),
                    insert_before: Some(actual[ai]),
                });
            }
            ei += offset + 1;
            ai += 1;
            continue;
        }
        return Some(Issue::Unexpected {
            id: actual[ai],
            parent,
            tag: actual_tag,
            expected_hint: expected.get(ei).map(|(n, _, _)| n.clone()),
        });
    }

    expected[ei..]
        .iter()
        .find(|(_, optional, _)| !optional)
        .map(|(name, _, _)| Issue::Missing {
            parent,
            expected_tag: name.clone(),
            insert_before: None,
        })
}

fn heal(
    tree: &mut ElementTree,
    line_map: &mut LineMap,
    schema: &SchemaIndex,
    added_dummies: &mut HashSet<(ElementId, String)>,
    issue: Issue,
    findings: &mut Vec<Finding>,
) {
    match issue {
        Issue::Missing {
            parent,
            expected_tag,
            insert_before,
        } => {
            let type_name = schema
                .lookup(&expected_tag)
                .and_then(|m| m.type_name.as_deref());
            let text = dummy::for_type(type_name);
            let (new_id, row, trail) = match insert_before {
                Some(sibling) => {
                    let row = line_map.row_of(sibling).unwrap_or_else(|| line_map.row_of(parent).unwrap_or(0));
                    let new_id = tree.insert_synthetic_before(sibling, &expected_tag, text);
                    (new_id, row, audit_trail(tree, sibling))
                }
                None => {
                    let row = line_map.row_of(parent).unwrap_or(0);
                    let new_id = tree.append_synthetic_child(parent, &expected_tag, text);
                    (new_id, row, audit_trail(tree, parent))
                }
            };
            line_map.record_synthetic(new_id, row);
            added_dummies.insert((parent, expected_tag.clone()));
            findings.push(
                Finding::error(
                    Check::Structure,
                    ErrorKind::SchemavElementContent {
                        expected_tag: expected_tag.clone(),
                    },
                )
                .with_element_tag(expected_tag)
                .with_source_row(row)
                .with_audit_trail(trail),
            );
        }
        Issue::Unexpected {
            id,
            parent,
            tag,
            expected_hint,
        } => {
            let parent_tag = tree.tag(parent).to_string();
            let row = line_map.row_of(id).unwrap_or_else(|| line_map.row_of(parent).unwrap_or(0));
            let trail = audit_trail(tree, id);

            // 1. Wrong-place: not a valid child of this parent at all.
            if !schema.is_direct_child(&parent_tag, &tag) {
                tree.remove(id);
                findings.push(out_of_sequence(tag, row, trail));
                return;
            }

            // 2. Out-of-sequence duplicate: parent already got this dummy.
            if added_dummies.contains(&(parent, tag.clone())) {
                tree.remove(id);
                findings.push(out_of_sequence(tag, row, trail));
                return;
            }

            // 3. Repeated same tag: childless offender, sibling duplicates.
            if tree.children(id).is_empty() {
                let siblings: Vec<ElementId> = tree
                    .children(parent)
                    .iter()
                    .copied()
                    .filter(|&c| tree.tag(c) == tag)
                    .collect();
                if siblings.len() > 1 {
                    for &dup in siblings.iter().skip(1) {
                        let dup_row = line_map.row_of(dup).unwrap_or(row);
                        let dup_trail = audit_trail(tree, dup);
                        tree.remove(dup);
                        findings.push(out_of_sequence(tag.clone(), dup_row, dup_trail));
                    }
                    return;
                }
            }

            // 5. Skippable optional: the hinted expected element is optional.
            if let Some(hint) = &expected_hint {
                if schema.is_optional_direct_child(&parent_tag, hint) {
                    tree.remove(id);
                    findings.push(out_of_sequence(tag, row, trail));
                    return;
                }
            }

            // 6. Fallback: insert the expected element above the offender.
            let expected_tag = expected_hint.unwrap_or_else(|| tag.clone());
            let type_name = schema
                .lookup(&expected_tag)
                .and_then(|m| m.type_name.as_deref());
            let text = dummy::for_type(type_name);
            let new_id = tree.insert_synthetic_before(id, &expected_tag, text);
            line_map.record_synthetic(new_id, row);
            added_dummies.insert((parent, expected_tag.clone()));
            findings.push(
                Finding::error(
                    Check::Structure,
                    ErrorKind::SchemavElementContent {
                        expected_tag: expected_tag.clone(),
                    },
                )
                .with_element_tag(expected_tag)
                .with_source_row(row)
                .with_audit_trail(trail),
            );
        }
    }
}

fn out_of_sequence(tag: String, row: u32, trail: String) -> Finding {
    Finding::error(
        Check::Structure,
        ErrorKind::SchemavOutOfSequence {
            expected_tag: tag.clone(),
        },
    )
    .with_element_tag(tag)
    .with_source_row(row)
    .with_audit_trail(trail)
}

/// Root-to-parent tag path, e.g. `auditfile/company/cashRegisters`.
fn audit_trail(tree: &ElementTree, id: ElementId) -> String {
    let mut path = Vec::new();
    let mut cur = tree.parent(id);
    while let Some(p) = cur {
        path.push(tree.tag(p).to_string());
        cur = tree.parent(p);
    }
    path.reverse();
    path.join("/")
}
