//! Report reconciliation (§4.7a): per-register, per-report windowed sums
//! over matching `CashTrans`, checked against the report's declared totals.

use chrono::NaiveDateTime;
use saftcr_model::entities::{CashTrans, EventReport, ReportType};
use saftcr_model::{Check, ErrorKind, Finding};
use std::collections::BTreeMap;

const RECONCILE_PREDEFINED: &[&str] = &[
    "11001", "11002", "11004", "11005", "11006", "11009", "11012", "11013", "11015", "11016", "11017",
];
const TIP_PREDEFINED_ID: &str = "10001";
const TOLERANCE: f64 = 1e-3;

/// A report with its reconciliation window and carry value resolved, and
/// whether it falls in the pre-first-Z window this register started with.
struct Linked<'a> {
    report: &'a EventReport,
    window_start: Option<NaiveDateTime>,
    grand_total_previous: Option<f64>,
    eligible: bool,
}

/// Walk a register's reports in datetime order, resolving each report's
/// window start (the previous report's datetime, of any type) and, for Z
/// reports, the previous Z's grand total. Reports seen before the first Z
/// are marked ineligible when `skip_pre_first_z` is set.
fn link<'a>(reports: &[&'a EventReport], skip_pre_first_z: bool) -> Vec<Linked<'a>> {
    let mut sorted: Vec<&EventReport> = reports.to_vec();
    sorted.sort_by_key(|r| r.datetime);

    let mut out = Vec::with_capacity(sorted.len());
    let mut prev_datetime: Option<NaiveDateTime> = None;
    let mut prev_z_grand_total: Option<f64> = None;
    let mut seen_first_z = false;

    for report in sorted {
        let eligible = !skip_pre_first_z || seen_first_z || report.report_type == ReportType::Z;
        out.push(Linked {
            report,
            window_start: prev_datetime,
            grand_total_previous: prev_z_grand_total,
            eligible,
        });
        if report.report_type == ReportType::Z {
            seen_first_z = true;
            prev_z_grand_total = Some(report.totals.grand_total_cash_sale);
        }
        prev_datetime = Some(report.datetime);
    }
    out
}

fn in_reconciliation_set(trans: &CashTrans) -> bool {
    !trans.void_trans
        && !trans.is_training()
        && trans
            .predefined_id
            .as_deref()
            .map_or(false, |pid| RECONCILE_PREDEFINED.contains(&pid))
}

fn window_transactions<'a>(
    trans: &'a [&'a CashTrans],
    window_start: Option<NaiveDateTime>,
    window_end: NaiveDateTime,
) -> Vec<&'a CashTrans> {
    trans
        .iter()
        .copied()
        .filter(|t| match window_start {
            Some(start) => t.datetime > start && t.datetime <= window_end,
            None => t.datetime <= window_end,
        })
        .filter(|t| in_reconciliation_set(t))
        .collect()
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE
}

fn reconcile_one(linked: &Linked, trans: &[&CashTrans], findings: &mut Vec<Finding>) {
    let window = window_transactions(trans, linked.window_start, linked.report.datetime);
    if window.is_empty() {
        findings.push(
            Finding::error(Check::Value, ErrorKind::EventReportCouldNotRun)
                .with_audit_trail(linked.report.report_id.clone()),
        );
        return;
    }

    let cash_sum: f64 =
        window.iter().map(|t| t.signed_amnt_incl()).sum::<f64>() + linked.report.totals.return_amnt.abs();
    let tips_sum: f64 = window
        .iter()
        .flat_map(|t| t.raises.iter())
        .map(|r| r.tip_contribution())
        .sum();

    if !approx_eq(cash_sum, linked.report.totals.cash_sale) {
        findings.push(
            Finding::error(
                Check::Value,
                ErrorKind::EventReportTotalCashSales {
                    computed: cash_sum,
                    declared: linked.report.totals.cash_sale,
                },
            )
            .with_audit_trail(linked.report.report_id.clone()),
        );
    }

    if !approx_eq(tips_sum, linked.report.totals.tip) {
        findings.push(
            Finding::error(
                Check::Value,
                ErrorKind::EventReportTips {
                    computed: tips_sum,
                    declared: linked.report.totals.tip,
                },
            )
            .with_audit_trail(linked.report.report_id.clone()),
        );
    }

    if linked.report.report_type == ReportType::Z {
        if let Some(previous) = linked.grand_total_previous {
            let carry = linked.report.totals.grand_total_cash_sale - previous;
            if !approx_eq(carry, linked.report.totals.cash_sale) {
                findings.push(
                    Finding::error(
                        Check::Value,
                        ErrorKind::EventReportGrandTotalSales {
                            computed: carry,
                            declared: linked.report.totals.cash_sale,
                        },
                    )
                    .with_audit_trail(linked.report.report_id.clone()),
                );
            }
        }
    }
}

/// Reconcile every register's Z and X reports against their matching
/// transactions. `skip_pre_first_z_for_x_reports` governs whether reports
/// seen before a register's first Z report are reconciled at all.
pub fn check(
    event_reports: &[EventReport],
    cash_trans: &[CashTrans],
    skip_pre_first_z_for_x_reports: bool,
) -> Vec<Finding> {
    let mut reports_by_register: BTreeMap<&str, Vec<&EventReport>> = BTreeMap::new();
    for report in event_reports {
        reports_by_register.entry(report.register_id.as_str()).or_default().push(report);
    }

    let mut trans_by_register: BTreeMap<&str, Vec<&CashTrans>> = BTreeMap::new();
    for trans in cash_trans {
        trans_by_register.entry(trans.register_id.as_str()).or_default().push(trans);
    }

    let mut findings = Vec::new();
    for (register_id, reports) in reports_by_register {
        let linked = link(&reports, skip_pre_first_z_for_x_reports);
        let trans = trans_by_register.get(register_id).cloned().unwrap_or_default();
        for entry in linked.iter().filter(|l| l.eligible) {
            reconcile_one(entry, &trans, &mut findings);
        }
    }
    findings
}
