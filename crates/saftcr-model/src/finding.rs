//! A single reportable outcome of a validator: [`Finding`].

use crate::check::Check;
use crate::error_kind::ErrorKind;
use std::cmp::Ordering;

/// Whether a [`Finding`] represents a pass or a problem.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// The check ran and found nothing to report.
    Ok,
    /// The check found something worth reporting.
    Error,
}

/// One outcome of running a check against the audit file.
///
/// # Equality
///
/// Per the report's dedup rule, two findings are equal iff `(check,
/// source_row)` match — *not* full structural equality. This lets the
/// Report Aggregator dedup findings that differ only in incidental detail
/// (e.g. a re-derived `audit_trail`) but share a check and a source row.
#[derive(Clone, Debug)]
pub struct Finding {
    /// Which of the five checks (or the upstream read step) raised this.
    pub check: Check,
    /// Pass/fail.
    pub status: Status,
    /// The concrete error classification.
    pub error_kind: ErrorKind,
    /// The XML tag the finding is anchored to, if any.
    pub element_tag: Option<String>,
    /// The original source line the finding is anchored to. `None` sorts
    /// after every `Some`, matching the "null rows last" ordering rule.
    pub source_row: Option<u32>,
    /// Human-readable parent-to-root tag path, for the report's "error
    /// area" column.
    pub audit_trail: Option<String>,
    /// Positional parameters substituted into the locale-table message
    /// template (`[1]`, `[2]`, ...).
    pub parameters: Vec<String>,
}

impl Finding {
    /// Build the synthetic "this check passed" finding the Report
    /// Aggregator injects for every check that produced no error.
    pub fn ok(check: Check) -> Self {
        Finding {
            check,
            status: Status::Ok,
            error_kind: ErrorKind::Ok,
            element_tag: None,
            source_row: None,
            audit_trail: None,
            parameters: Vec::new(),
        }
    }

    /// Build an error finding.
    pub fn error(check: Check, error_kind: ErrorKind) -> Self {
        Finding {
            check,
            status: Status::Error,
            error_kind,
            element_tag: None,
            source_row: None,
            audit_trail: None,
            parameters: Vec::new(),
        }
    }

    /// Attach the element tag this finding is anchored to.
    pub fn with_element_tag(mut self, tag: impl Into<String>) -> Self {
        self.element_tag = Some(tag.into());
        self
    }

    /// Attach the original source row this finding is anchored to.
    pub fn with_source_row(mut self, row: u32) -> Self {
        self.source_row = Some(row);
        self
    }

    /// Attach the original source row, if any is known.
    pub fn with_source_row_opt(mut self, row: Option<u32>) -> Self {
        self.source_row = row;
        self
    }

    /// Attach the audit-trail path this finding is anchored to.
    pub fn with_audit_trail(mut self, trail: impl Into<String>) -> Self {
        self.audit_trail = Some(trail.into());
        self
    }

    /// Attach positional message parameters.
    pub fn with_parameters(mut self, parameters: Vec<String>) -> Self {
        self.parameters = parameters;
        self
    }

    /// `true` if this finding represents a failure.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}

impl PartialEq for Finding {
    fn eq(&self, other: &Self) -> bool {
        self.check == other.check && self.source_row == other.source_row
    }
}

impl Eq for Finding {}

impl PartialOrd for Finding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Finding {
    fn cmp(&self, other: &Self) -> Ordering {
        self.check.rank().cmp(&other.check.rank()).then_with(|| {
            match (self.source_row, other.source_row) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_error_kind() {
        let a = Finding::error(Check::Structure, ErrorKind::CannotGetPublicKey).with_source_row(5);
        let b = Finding::error(Check::Structure, ErrorKind::NoSignature).with_source_row(5);
        assert_eq!(a, b);
    }

    #[test]
    fn equality_requires_same_check() {
        let a = Finding::error(Check::Structure, ErrorKind::NoSignature).with_source_row(5);
        let b = Finding::error(Check::Signature, ErrorKind::NoSignature).with_source_row(5);
        assert_ne!(a, b);
    }

    #[test]
    fn ordering_is_rank_then_row_then_null_last() {
        let mut findings = vec![
            Finding::error(Check::Value, ErrorKind::NoRelationToArticlesFound {
                value: "x".into(),
            })
            .with_source_row(1),
            Finding::error(Check::Naming, ErrorKind::Filename),
            Finding::error(Check::Structure, ErrorKind::SchemavOutOfSequence {
                expected_tag: "empID".into(),
            })
            .with_source_row(10),
            Finding::error(Check::Structure, ErrorKind::SchemavOutOfSequence {
                expected_tag: "empID".into(),
            })
            .with_source_row(2),
        ];
        findings.sort();
        assert_eq!(findings[0].check, Check::Naming);
        assert_eq!(findings[0].source_row, None);
        assert_eq!(findings[1].source_row, Some(2));
        assert_eq!(findings[2].source_row, Some(10));
        assert_eq!(findings[3].check, Check::Value);
    }
}
