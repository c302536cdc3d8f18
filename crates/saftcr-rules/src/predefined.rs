//! Predefined-basic correctness (§4.7f): the resolved code's first two
//! digits must match the owning entity's category.

use saftcr_model::entities::{Basics, CashTrans, Event};
use saftcr_model::{Check, ErrorKind, Finding};

fn category_prefix(predefined_basic: &str) -> &str {
    if predefined_basic.len() >= 2 {
        &predefined_basic[0..2]
    } else {
        predefined_basic
    }
}

fn wrong(predefined_basic: &str, source_row: Option<u32>) -> Finding {
    Finding::error(
        Check::Value,
        ErrorKind::WrongPredefinedBasicUsed {
            predefined_basic: predefined_basic.to_string(),
        },
    )
    .with_source_row_opt(source_row)
}

/// `true` if `prefix` belongs to the Event category: `{06, 13, 14}` or any
/// code starting with `6`.
fn event_category_ok(prefix: &str, predefined_basic: &str) -> bool {
    matches!(prefix, "06" | "13" | "14") || predefined_basic.starts_with('6')
}

/// Run the category check over every entity kind that carries a resolved
/// predefined-basic code.
pub fn check(basics: &[Basics], events: &[Event], cash_trans: &[CashTrans]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for event in events {
        if let Some(pid) = crate::basics::predefined_id(basics, &event.basic_type) {
            let prefix = category_prefix(pid);
            if !event_category_ok(prefix, pid) {
                findings.push(wrong(pid, None));
            }
        }
    }

    for trans in cash_trans {
        if let Some(pid) = crate::basics::predefined_id(basics, &trans.trans_type) {
            if category_prefix(pid) != "11" {
                findings.push(wrong(pid, trans.source_row));
            }
        }

        for payment in &trans.payments {
            if let Some(pid) = crate::basics::predefined_id(basics, &payment.payment_type) {
                if category_prefix(pid) != "12" {
                    findings.push(wrong(pid, payment.source_row));
                }
            }
        }

        for raise in &trans.raises {
            if let Some(pid) = raise.predefined_id.as_deref() {
                if category_prefix(pid) != "10" {
                    findings.push(wrong(pid, trans.source_row));
                }
            }
        }
    }

    findings
}
