//! Report Aggregator (§4.8): inject `ok` findings, dedup, sort, and compute
//! the file prefix.

use saftcr_model::{Check, Finding};

/// The five checks that get an injected `ok` finding when they raised
/// nothing. `Check::XmlRead` is the upstream read step, not one of the
/// five the report lists explicitly, so it is excluded here.
const REPORTED_CHECKS: [Check; 5] =
    [Check::Naming, Check::Structure, Check::Certificate, Check::Signature, Check::Value];

/// File-prefix classification, in dominance order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Prefix {
    /// A non-value check raised an error: document integrity is in doubt.
    Nok,
    /// Only value (business-rule) checks raised errors.
    Flag,
    /// Every check passed clean.
    Ok,
}

impl Prefix {
    /// The filename prefix string, as used in report output naming.
    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::Nok => "NOK_",
            Prefix::Flag => "FLAG_",
            Prefix::Ok => "OK_",
        }
    }
}

/// The aggregated, report-ready outcome of one file analysis.
pub struct AggregatedReport {
    /// Deduped, sorted findings, with `ok` markers injected for clean checks.
    pub findings: Vec<Finding>,
    /// The file prefix computed from `findings`.
    pub prefix: Prefix,
}

fn dedup(findings: Vec<Finding>) -> Vec<Finding> {
    let mut out: Vec<Finding> = Vec::with_capacity(findings.len());
    for finding in findings {
        if !out.contains(&finding) {
            out.push(finding);
        }
    }
    out
}

fn inject_ok_findings(findings: &mut Vec<Finding>, reported_checks: &[Check]) {
    for &check in reported_checks {
        let already_raised = findings.iter().any(|f| f.check == check && f.is_error());
        if !already_raised {
            findings.push(Finding::ok(check));
        }
    }
}

fn compute_prefix(findings: &[Finding]) -> Prefix {
    let any_non_value_error = findings.iter().any(|f| f.is_error() && f.check != Check::Value);
    let any_value_error = findings.iter().any(|f| f.is_error() && f.check == Check::Value);
    if any_non_value_error {
        Prefix::Nok
    } else if any_value_error {
        Prefix::Flag
    } else {
        Prefix::Ok
    }
}

/// Run the aggregation pipeline over the raw findings collected from every
/// validator that ran, injecting `ok` findings for all five reported checks.
pub fn aggregate(raw_findings: Vec<Finding>) -> AggregatedReport {
    aggregate_with_checks(raw_findings, &REPORTED_CHECKS)
}

/// Like [`aggregate`], but only `reported_checks` get an injected `ok`
/// finding when clean. Used when the file was unreadable: the value check
/// never ran at all, so it is skipped silently rather than reported `ok`.
pub fn aggregate_with_checks(raw_findings: Vec<Finding>, reported_checks: &[Check]) -> AggregatedReport {
    let mut findings = dedup(raw_findings);
    inject_ok_findings(&mut findings, reported_checks);
    findings.sort();
    let prefix = compute_prefix(&findings);
    AggregatedReport { findings, prefix }
}
