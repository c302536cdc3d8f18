//! Numbering continuity (§4.7b): per-register strict `+1`, then a global
//! dedup-by-`nr` step-of-1 check.

use saftcr_model::entities::CashTrans;
use saftcr_model::{Check, ErrorKind, Finding};
use std::collections::BTreeMap;

const STEP_TOLERANCE: f64 = 1e-9;

fn breaks_step(a: f64, b: f64) -> bool {
    (b - a - 1.0).abs() > STEP_TOLERANCE
}

/// Check per-register and, if every register is clean, global numbering
/// continuity. A per-register break short-circuits the whole check with a
/// single file-level finding, per the spec's "return" instruction.
pub fn check(cash_trans: &[CashTrans]) -> Vec<Finding> {
    let mut by_register: BTreeMap<&str, Vec<&CashTrans>> = BTreeMap::new();
    for trans in cash_trans {
        by_register.entry(trans.register_id.as_str()).or_default().push(trans);
    }

    for trans in by_register.values() {
        for pair in trans.windows(2) {
            if breaks_step(pair[0].nr, pair[1].nr) {
                return vec![Finding::error(Check::Value, ErrorKind::ContinuousNumberingPrCashRegister)];
            }
        }
    }

    let mut all: Vec<&CashTrans> = cash_trans.iter().collect();
    all.sort_by(|a, b| a.nr.partial_cmp(&b.nr).unwrap_or(std::cmp::Ordering::Equal));
    all.dedup_by(|a, b| (a.nr - b.nr).abs() < STEP_TOLERANCE);

    all.windows(2)
        .filter(|pair| breaks_step(pair[0].nr, pair[1].nr))
        .map(|pair| {
            Finding::error(
                Check::Value,
                ErrorKind::NotContinuousNumbering {
                    nr: pair[1].nr.round() as i64,
                    previous_nr: pair[0].nr.round() as i64,
                },
            )
            .with_source_row_opt(pair[1].source_row)
        })
        .collect()
}
