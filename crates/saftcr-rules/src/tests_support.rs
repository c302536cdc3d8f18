//! Shared fixture builders for the sub-check unit tests.

use chrono::NaiveDate;
use saftcr_model::entities::CashTrans;

/// A minimal, otherwise-empty transaction ready for field overrides.
pub fn sample_trans() -> CashTrans {
    CashTrans {
        nr: 1.0,
        nr_raw: "1".to_string(),
        register_id: "R1".to_string(),
        trans_id: None,
        trans_type: String::new(),
        emp_id: None,
        amnt_incl: 0.0,
        amnt_excl: 0.0,
        amnt_incl_raw: String::new(),
        amnt_excl_raw: String::new(),
        datetime: NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
        trans_date_raw: String::new(),
        trans_time_raw: String::new(),
        void_trans: false,
        training_id: None,
        signature: None,
        cert: None,
        ct_lines: Vec::new(),
        payments: Vec::new(),
        raises: Vec::new(),
        ref_id: None,
        predefined_id: None,
        source_row: None,
    }
}
