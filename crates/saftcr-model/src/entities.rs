//! Domain entities materialised from a (possibly repaired) audit file.
//!
//! These are plain data: extraction from the XML tree lives in
//! `saftcr-xml`, which depends on this crate for the shapes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A row of the file's own code table, mapping a local code to a national
/// predefined-basic id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Basics {
    /// The `type` attribute/element (event/line/payment/raise/trans).
    pub basic_type: String,
    /// Local code. Identity key, with `desc` as fallback.
    pub id: String,
    /// Human description. Used as a lookup fallback when `id` misses.
    pub desc: String,
    /// The 5-digit national predefined-basic code, if given.
    pub predefined_id: Option<String>,
}

impl Basics {
    /// The value other entities resolve against: prefer `id`, fall back to
    /// `desc`.
    #[inline]
    pub fn identity_key(&self) -> &str {
        if self.id.is_empty() {
            &self.desc
        } else {
            &self.id
        }
    }

    /// First two digits of `predefined_id`, the category discriminator.
    pub fn category_prefix(&self) -> Option<&str> {
        self.predefined_id.as_deref().and_then(|code| {
            if code.len() >= 2 {
                Some(&code[0..2])
            } else {
                None
            }
        })
    }
}

/// An article (product) row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Identity key.
    pub art_id: String,
    /// Article group id.
    pub group_id: Option<String>,
    /// Human description.
    pub desc: Option<String>,
    /// Date the article was registered/modified.
    pub date: Option<NaiveDateTime>,
}

/// An employee row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Identity key.
    pub emp_id: String,
    /// Employee name(s).
    pub names: String,
    /// Local role code.
    pub role: Option<String>,
    /// Human role description.
    pub role_desc: Option<String>,
}

/// A logged event (register open/close, training toggle, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Identity of the event within the file (an incrementing local id).
    pub event_id: String,
    /// Reference into the `Basics` table.
    pub basic_type: String,
    /// Transaction this event refers to, if any.
    pub trans_id: Option<String>,
    /// Report this event refers to, if any.
    pub report: Option<String>,
    /// When the event occurred.
    pub datetime: Option<NaiveDateTime>,
}

/// A report kind: end-of-shift closing vs. intermediate interim report.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ReportType {
    /// End-of-shift closing report.
    Z,
    /// Intermediate interim report.
    X,
}

/// Monetary totals declared on an [`EventReport`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventReportTotals {
    /// Declared total cash-sale amount.
    pub cash_sale: f64,
    /// Declared grand-total cash-sale amount (running cumulative, Z only).
    pub grand_total_cash_sale: f64,
    /// Declared tip amount.
    pub tip: f64,
    /// Declared number of returns.
    pub return_num: f64,
    /// Declared return amount.
    pub return_amnt: f64,
    /// Declared discount count.
    pub discount_num: f64,
    /// Declared discount amount.
    pub discount_amnt: f64,
}

/// A Z or X report closing a register's shift/interim period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventReport {
    /// Identity key.
    pub report_id: String,
    /// The register (cash point) this report belongs to.
    pub register_id: String,
    /// Z or X.
    pub report_type: ReportType,
    /// When the report was produced.
    pub datetime: NaiveDateTime,
    /// Declared totals.
    pub totals: EventReportTotals,
    /// Start of the reconciliation window: the previous report's datetime
    /// on this register (exclusive bound).
    pub report_datetime_start: Option<NaiveDateTime>,
    /// The previous Z report's `grand_total_cash_sale`, for the carry law.
    pub grand_total_cash_sale_previous: Option<f64>,
}

/// A line item within a [`CashTrans`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CtLine {
    /// Reference into the `Basics` table.
    pub line_type: String,
    /// Reference into the `Article` table.
    pub art_id: Option<String>,
    /// Quantity sold.
    pub qnt: Option<f64>,
    /// Line description.
    pub desc: Option<String>,
    /// The source row this line was parsed from (for mandatory-if-available
    /// findings anchored per-line).
    pub source_row: Option<u32>,
}

/// A payment applied to a [`CashTrans`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Reference into the `Basics` table.
    pub payment_type: String,
    /// Payment amount.
    pub amnt: Option<f64>,
    /// Reference id for card/voucher payments.
    pub payment_ref_id: Option<String>,
    /// The source row this payment was parsed from.
    pub source_row: Option<u32>,
}

/// An add-on amount (tip, rounding, ...) applied to a [`CashTrans`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Raise {
    /// Reference into the `Basics` table.
    pub raise_type: String,
    /// Raise amount.
    pub amnt: Option<f64>,
    /// The predefined-basic code resolved for this raise, if any (`10001`
    /// marks a tip).
    pub predefined_id: Option<String>,
}

impl Raise {
    /// Predefined-basic id marking a tip raise.
    pub const TIP_PREDEFINED_ID: &'static str = "10001";

    /// This raise's contribution to a report's tips total.
    pub fn tip_contribution(&self) -> f64 {
        if self.predefined_id.as_deref() == Some(Self::TIP_PREDEFINED_ID) {
            self.amnt.unwrap_or(0.0)
        } else {
            0.0
        }
    }
}

/// A single cash-register transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CashTrans {
    /// The file-ordered transaction number (`nr`), parsed per the spec's
    /// lenient numeric-extraction rule.
    pub nr: f64,
    /// The raw `nr` text as it appeared in the file (for findings).
    pub nr_raw: String,
    /// The register (cash point) this transaction belongs to.
    pub register_id: String,
    /// Local transaction id.
    pub trans_id: Option<String>,
    /// Reference into the `Basics` table.
    pub trans_type: String,
    /// Employee id, as referenced in the signed message.
    pub emp_id: Option<String>,
    /// Signed amount including tax.
    pub amnt_incl: f64,
    /// Signed amount excluding tax.
    pub amnt_excl: f64,
    /// `transAmntIn` exactly as written, for the signature message (the
    /// signed text predates any sign-normalisation `amnt_incl` applies).
    pub amnt_incl_raw: String,
    /// `transAmntEx` exactly as written, for the signature message.
    pub amnt_excl_raw: String,
    /// When the transaction occurred.
    pub datetime: NaiveDateTime,
    /// `transDate` exactly as written, for the signature message.
    pub trans_date_raw: String,
    /// `transTime` exactly as written, for the signature message.
    pub trans_time_raw: String,
    /// Whether this transaction was voided.
    pub void_trans: bool,
    /// Training-mode transaction id, if this was a training transaction.
    pub training_id: Option<String>,
    /// Base64 signature text, if present and not a structural sentinel.
    pub signature: Option<String>,
    /// PEM certificate text, if present and not a structural sentinel.
    pub cert: Option<String>,
    /// Line items.
    pub ct_lines: Vec<CtLine>,
    /// Payments.
    pub payments: Vec<Payment>,
    /// Raises (tips, roundings, ...).
    pub raises: Vec<Raise>,
    /// Reference to a related transaction (e.g. a refund's original sale).
    pub ref_id: Option<String>,
    /// Predefined-basic id resolved for `trans_type`, if any.
    pub predefined_id: Option<String>,
    /// Original source row, for findings anchored on the whole transaction.
    pub source_row: Option<u32>,
}

impl CashTrans {
    /// `true` if this transaction is a training transaction.
    #[inline]
    pub fn is_training(&self) -> bool {
        self.training_id.is_some()
    }

    /// The signed amount contributed to a report's cash-sale reconciliation.
    #[inline]
    pub fn signed_amnt_incl(&self) -> f64 {
        self.amnt_incl
    }
}

/// Company identification, part of [`Metadata`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// National company identifier (e.g. CVR number).
    pub id: String,
    /// Registered company name.
    pub name: String,
}

/// Software identification, part of [`Metadata`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftwareInfo {
    /// Producing software's company name.
    pub company: String,
    /// Producing software's product description.
    pub description: String,
    /// Producing software's version string.
    pub version: String,
}

/// A postal address, part of [`Metadata`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Street name and number.
    pub street_name: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
}

/// File-level metadata (singleton).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// The audited company.
    pub company: Company,
    /// Free-form header fields (audit file id, file version, ...).
    pub header: std::collections::BTreeMap<String, String>,
    /// The producing software.
    pub software: SoftwareInfo,
    /// Addresses listed in the file.
    pub addresses: Vec<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basics_identity_key_falls_back_to_desc() {
        let b = Basics {
            basic_type: "lineType".into(),
            id: String::new(),
            desc: "Sale".into(),
            predefined_id: None,
        };
        assert_eq!(b.identity_key(), "Sale");
    }

    #[test]
    fn basics_category_prefix() {
        let b = Basics {
            basic_type: "transType".into(),
            id: "1".into(),
            desc: "Sale".into(),
            predefined_id: Some("11001".into()),
        };
        assert_eq!(b.category_prefix(), Some("11"));
    }

    #[test]
    fn raise_tip_contribution_only_for_predefined_10001() {
        let tip = Raise {
            raise_type: "raiseType".into(),
            amnt: Some(12.5),
            predefined_id: Some("10001".into()),
        };
        let rounding = Raise {
            raise_type: "raiseType".into(),
            amnt: Some(0.5),
            predefined_id: Some("10002".into()),
        };
        assert_eq!(tip.tip_contribution(), 12.5);
        assert_eq!(rounding.tip_contribution(), 0.0);
    }
}
