//! Signature Validator: verifies the per-register chained transaction
//! signature, discovering the signing mode adaptively via
//! [`crate::priority::SignaturePriority`].

use crate::message::{full_message, verify_mode, MessageFields};
use crate::priority::SignaturePriority;
use crate::PublicKeySource;
use saftcr_model::check::Check;
use saftcr_model::dummy;
use saftcr_model::entities::CashTrans;
use saftcr_model::error_kind::ErrorKind;
use saftcr_model::finding::Finding;
use std::collections::BTreeMap;

/// Verify every register's signature chain. `cash_trans_by_register` must
/// list each register's transactions in file order (chain order), not
/// sorted by `nr`.
pub fn validate(
    cash_trans_by_register: &BTreeMap<String, Vec<CashTrans>>,
    company_id: &str,
    priority: &SignaturePriority,
    keys: &dyn PublicKeySource,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut any_signature_seen = false;

    for (register_id, trans) in cash_trans_by_register {
        let mut prev_signature: Option<String> = None;
        let mut first_signature_row: Option<u32> = None;
        let mut nr_of_signatures = 0u32;
        let mut nr_of_errors = 0u32;

        for tran in trans {
            let signature_text = match &tran.signature {
                Some(s) if !dummy::is_sentinel(s) => s.trim(),
                _ => continue,
            };
            any_signature_seen = true;

            let prev = match prev_signature.take() {
                None => {
                    // First signature in this register's chain: recorded,
                    // not verified.
                    first_signature_row = tran.source_row;
                    prev_signature = Some(signature_text.to_string());
                    continue;
                }
                Some(p) => p,
            };

            nr_of_signatures += 1;
            let outcome = verify_one(register_id, company_id, &prev, tran, signature_text, priority, keys);
            match outcome {
                Ok(()) => {}
                Err(kind) => {
                    nr_of_errors += 1;
                    findings.push(
                        Finding::error(Check::Signature, kind)
                            .with_element_tag("signature")
                            .with_source_row_opt(tran.source_row),
                    );
                }
            }
            prev_signature = Some(signature_text.to_string());
        }

        if nr_of_signatures > 0 && nr_of_errors == nr_of_signatures {
            findings.push(
                Finding::error(Check::Signature, ErrorKind::SignatureNotVerified)
                    .with_element_tag("signature")
                    .with_source_row_opt(first_signature_row),
            );
        }
    }

    if !any_signature_seen {
        findings.push(Finding::error(Check::Signature, ErrorKind::NoSignature));
    }

    findings
}

fn verify_one(
    register_id: &str,
    company_id: &str,
    prev_signature: &str,
    tran: &CashTrans,
    signature_text: &str,
    priority: &SignaturePriority,
    keys: &dyn PublicKeySource,
) -> Result<(), ErrorKind> {
    if company_id.is_empty() || dummy::is_sentinel(company_id) {
        return Err(ErrorKind::SignatureCompleteError);
    }

    let signature_bytes = base64::decode(signature_text).map_err(|_| ErrorKind::SignatureCompleteError)?;

    let cert_pem = tran
        .cert
        .as_deref()
        .filter(|c| !dummy::is_sentinel(c))
        .ok_or(ErrorKind::CannotGetPublicKey)?;
    let key = keys.public_key(cert_pem).ok_or(ErrorKind::CannotGetPublicKey)?;

    let trans_id = tran.trans_id.as_deref().unwrap_or_default();
    let emp_id = tran.emp_id.as_deref().unwrap_or_default();

    let try_with = |prev: &str| -> bool {
        let fields = MessageFields {
            prev_signature: prev,
            nr: &tran.nr_raw,
            trans_id,
            trans_type: &tran.trans_type,
            trans_date: &tran.trans_date_raw,
            trans_time: &tran.trans_time_raw,
            emp_id,
            trans_amnt_in: &tran.amnt_incl_raw,
            trans_amnt_ex: &tran.amnt_excl_raw,
            register_id,
            company_ident: company_id,
        };
        for mode in priority.snapshot() {
            if verify_mode(&key, &fields, mode, &signature_bytes) {
                priority.promote(mode);
                return true;
            }
        }
        false
    };

    if try_with(prev_signature) {
        return Ok(());
    }
    if prev_signature != "0" && try_with("0") {
        return Err(ErrorKind::SignatureBreak);
    }
    Err(ErrorKind::SignatureNotVerified)
}

/// Reconstruct the message a given `(register, prev_signature)` pair would
/// sign for `tran`, for logging/diagnostics.
#[cfg(test)]
fn debug_message(register_id: &str, company_id: &str, prev_signature: &str, tran: &CashTrans) -> String {
    let fields = MessageFields {
        prev_signature,
        nr: &tran.nr_raw,
        trans_id: tran.trans_id.as_deref().unwrap_or_default(),
        trans_type: &tran.trans_type,
        trans_date: &tran.trans_date_raw,
        trans_time: &tran.trans_time_raw,
        emp_id: tran.emp_id.as_deref().unwrap_or_default(),
        trans_amnt_in: &tran.amnt_incl_raw,
        trans_amnt_ex: &tran.amnt_excl_raw,
        register_id,
        company_ident: company_id,
    };
    full_message(&fields, crate::priority::TimeForm::AsWritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn sample_tran(nr_raw: &str, signature: Option<&str>, source_row: Option<u32>) -> CashTrans {
        CashTrans {
            nr: nr_raw.parse().unwrap_or(0.0),
            nr_raw: nr_raw.to_string(),
            register_id: "R1".to_string(),
            trans_id: Some("T1".to_string()),
            trans_type: "11001".to_string(),
            emp_id: Some("E1".to_string()),
            amnt_incl: 100.0,
            amnt_excl: 80.0,
            amnt_incl_raw: "100.00".to_string(),
            amnt_excl_raw: "80.00".to_string(),
            datetime: NaiveDateTime::parse_from_str("2024-01-02T14:30:59", "%Y-%m-%dT%H:%M:%S").unwrap(),
            trans_date_raw: "2024-01-02".to_string(),
            trans_time_raw: "14:30:59".to_string(),
            void_trans: false,
            training_id: None,
            signature: signature.map(|s| s.to_string()),
            cert: Some("PEM".to_string()),
            ct_lines: Vec::new(),
            payments: Vec::new(),
            raises: Vec::new(),
            ref_id: None,
            predefined_id: None,
            source_row,
        }
    }

    struct NoKeys;
    impl PublicKeySource for NoKeys {
        fn public_key(&self, _cert_pem: &str) -> Option<rsa::RsaPublicKey> {
            None
        }
    }

    #[test]
    fn no_signature_anywhere_reports_no_signature() {
        let mut by_register = BTreeMap::new();
        by_register.insert("R1".to_string(), vec![sample_tran("1", None, Some(2))]);
        let priority = SignaturePriority::new();
        let findings = validate(&by_register, "12345678", &priority, &NoKeys);
        assert!(findings.iter().any(|f| f.error_kind == ErrorKind::NoSignature));
    }

    #[test]
    fn first_transaction_in_chain_is_not_verified() {
        let mut by_register = BTreeMap::new();
        by_register.insert("R1".to_string(), vec![sample_tran("1", Some("c2lnbmF0dXJl"), Some(2))]);
        let priority = SignaturePriority::new();
        let findings = validate(&by_register, "12345678", &priority, &NoKeys);
        assert!(findings.is_empty());
    }

    #[test]
    fn missing_public_key_reports_cannot_get_public_key() {
        let mut by_register = BTreeMap::new();
        by_register.insert(
            "R1".to_string(),
            vec![
                sample_tran("1", Some("c2lnbmF0dXJl"), Some(2)),
                sample_tran("2", Some("c2lnbmF0dXJlMg=="), Some(3)),
            ],
        );
        let priority = SignaturePriority::new();
        let findings = validate(&by_register, "12345678", &priority, &NoKeys);
        assert!(findings.iter().any(|f| f.error_kind == ErrorKind::CannotGetPublicKey));
    }

    #[test]
    fn debug_message_matches_expected_shape() {
        let tran = sample_tran("1", None, None);
        let msg = debug_message("R1", "12345678", "0", &tran);
        assert_eq!(msg, "0;1;T1;11001;2024-01-02;14:30:59;E1;100.00;80.00;R1;12345678");
    }
}
