//! Mandatory-if-available (§4.7e): a resolved predefined-basic code in a
//! rule's trigger set makes the indicated child element required.
//!
//! Void transactions implicitly satisfy every `CashTrans` row here: a voided
//! sale was never completed, so its line items/payments were never filled
//! in either, and flagging that would just be noise on top of whatever
//! voided the transaction in the first place.

use saftcr_common::traits::bool_ext::BoolExt;
use saftcr_model::entities::{Basics, CashTrans, Event};
use saftcr_model::{Check, ErrorKind, Finding};

const EVENT_REPORT_SET: &[&str] = &["13008", "13009"];
const EVENT_TRANSID_SET: &[&str] = &[
    "13010", "13011", "13012", "13013", "13014", "13015", "13016", "13019", "13028",
];
const PAYMENT_REFID_SET: &[&str] = &["12002", "12003", "12011"];
const CTLINE_SET: &[&str] = &[
    "11001", "11002", "11004", "11006", "11009", "11012", "11013", "11015", "11016", "11017",
];
const PAYMENT_SET: &[&str] = &[
    "11001", "11002", "11003", "11004", "11005", "11006", "11008", "11009", "11012", "11015",
    "11016", "11017", "11999",
];
const BASICS_TYPES_REQUIRING_PREDEFINED: &[&str] = &["10", "11", "12", "13"];

fn missing(predefined_basic: &str, element_name: &str, source_row: Option<u32>) -> Finding {
    Finding::error(
        Check::Value,
        ErrorKind::ElementNotFoundWhenExpected {
            predefined_basic: predefined_basic.to_string(),
            element_name: element_name.to_string(),
        },
    )
    .with_source_row_opt(source_row)
}

fn non_empty(value: Option<&str>) -> bool {
    value.map_or(false, |s| !s.trim().is_empty())
}

fn check_events(basics: &[Basics], events: &[Event], findings: &mut Vec<Finding>) {
    for event in events {
        let pid = match crate::basics::predefined_id(basics, &event.basic_type) {
            Some(pid) => pid,
            None => continue,
        };
        if EVENT_REPORT_SET.contains(&pid) {
            if let Err(finding) =
                non_empty(event.report.as_deref()).or_err(missing(pid, "eventReport", None))
            {
                findings.push(finding);
            }
        }
        if EVENT_TRANSID_SET.contains(&pid) {
            if let Err(finding) =
                non_empty(event.trans_id.as_deref()).or_err(missing(pid, "transID", None))
            {
                findings.push(finding);
            }
        }
    }
}

fn check_cash_trans(basics: &[Basics], cash_trans: &[CashTrans], findings: &mut Vec<Finding>) {
    for trans in cash_trans {
        if trans.void_trans {
            continue;
        }
        let pid = match crate::basics::predefined_id(basics, &trans.trans_type) {
            Some(pid) => pid,
            None => continue,
        };

        if CTLINE_SET.contains(&pid) {
            if let Err(finding) =
                (!trans.ct_lines.is_empty()).or_err(missing(pid, "ctLine", trans.source_row))
            {
                findings.push(finding);
            }
            for line in &trans.ct_lines {
                if let Err(finding) = line.qnt.is_some().or_err(missing(pid, "qnt", line.source_row)) {
                    findings.push(finding);
                }
                if let Err(finding) =
                    non_empty(line.art_id.as_deref()).or_err(missing(pid, "artID", line.source_row))
                {
                    findings.push(finding);
                }
            }
        }

        if PAYMENT_SET.contains(&pid) {
            if let Err(finding) =
                (!trans.payments.is_empty()).or_err(missing(pid, "payment", trans.source_row))
            {
                findings.push(finding);
            }
        }

        for payment in &trans.payments {
            let payment_pid = match crate::basics::predefined_id(basics, &payment.payment_type) {
                Some(pid) => pid,
                None => continue,
            };
            if PAYMENT_REFID_SET.contains(&payment_pid) {
                if let Err(finding) = non_empty(payment.payment_ref_id.as_deref())
                    .or_err(missing(payment_pid, "paymentRefID", payment.source_row))
                {
                    findings.push(finding);
                }
            }
        }
    }
}

fn check_basics_rows(basics: &[Basics], findings: &mut Vec<Finding>) {
    for basic in basics {
        if BASICS_TYPES_REQUIRING_PREDEFINED.contains(&basic.basic_type.as_str()) {
            if let Err(finding) = non_empty(basic.predefined_id.as_deref())
                .or_err(missing(&basic.basic_type, "predefinedBasicID", None))
            {
                findings.push(finding);
            }
        }
    }
}

/// Run every mandatory-if-available row from the table.
pub fn check(basics: &[Basics], events: &[Event], cash_trans: &[CashTrans]) -> Vec<Finding> {
    let mut findings = Vec::new();
    check_events(basics, events, &mut findings);
    check_cash_trans(basics, cash_trans, &mut findings);
    check_basics_rows(basics, &mut findings);
    findings
}
