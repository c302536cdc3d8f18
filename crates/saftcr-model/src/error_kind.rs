//! The concrete error/finding kinds each validator can raise.
//!
//! Every variant name mirrors the technical error code used in the report
//! (see the distilled spec's per-component sections); the `code()` accessor
//! returns exactly that string, since the locale tables key their
//! descriptions on it.

use std::fmt;

/// Classification of one [`crate::Finding`].
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    /// Nothing wrong: the synthetic "this check passed" marker.
    Ok,

    /// The file could not be parsed after every healing attempt.
    XmlFileCorrupt,
    /// The file was not valid UTF-8 and had to be re-encoded.
    XmlFileEncodingCorrupt,
    /// A downstream check could not run because the file is unreadable.
    CannotDoCheckDueToReadError,

    /// Filename does not match the expected naming grammar.
    Filename,

    /// A required element was missing (libxml2's `SCHEMAV_ELEMENT_CONTENT`
    /// class), repaired by inserting a synthetic element.
    SchemavElementContent {
        /// The tag that was synthesized in.
        expected_tag: String,
    },
    /// An element was out of its expected sequence position, repaired by
    /// removing it (libxml2's `SCHEMAV_OUT_OF_SEQUENCE` class).
    SchemavOutOfSequence {
        /// The tag that was removed or skipped.
        expected_tag: String,
    },
    /// Any other schema-validation error type, not part of the
    /// structural-miss class the repair loop understands.
    StructureOther {
        /// The raw schema error type name.
        xsd_error_type: String,
    },

    /// The leaf certificate could not be parsed.
    CertificateCompleteError,
    /// The OCSP round-trip failed (network error, malformed response).
    CertificateOcspCompleteError,
    /// The certificate's issuer is not in the trust set.
    CertificateNotTrustedIssuer,
    /// OCSP reported the certificate revoked before the transaction date.
    CertificateRevoked,
    /// OCSP reported an unknown status while the certificate was still
    /// nominally valid.
    CertificateUnknown,
    /// The transaction date is after the certificate's `notAfter`.
    CertificateExpired,
    /// The transaction date is before the certificate's `notBefore`.
    CertificateNotValidYet,
    /// No non-dummy certificate was found anywhere in the document.
    NoCertificate,
    /// The certificate check could not run (blocked by a structural
    /// sentinel value such as a dummy `transDate`).
    CertificateCouldNotRun,

    /// The public key could not be extracted from `certificateData`.
    CannotGetPublicKey,
    /// Verification only succeeded once the chain was reset to `"0"`.
    SignatureBreak,
    /// No combination of padding/digest/time-format verified.
    SignatureNotVerified,
    /// An unexpected failure occurred while verifying.
    SignatureCompleteError,
    /// The document contains no signature element at all.
    NoSignature,

    /// Reconciled cash-sale total does not match `totalCashSaleAmnt`.
    EventReportTotalCashSales {
        /// Sum computed from matching cash transactions.
        computed: f64,
        /// Value declared in the report.
        declared: f64,
    },
    /// Reconciled tips total does not match `tipAmnt`.
    EventReportTips {
        /// Sum computed from matching raises.
        computed: f64,
        /// Value declared in the report.
        declared: f64,
    },
    /// Z-report grand-total carry law violated.
    EventReportGrandTotalSales {
        /// `grand_total(k) - grand_total(k-1)`.
        computed: f64,
        /// `total_cash_sale(k)`.
        declared: f64,
    },
    /// No transaction could be attributed to a report at all.
    EventReportCouldNotRun,
    /// Per-register numbering continuity failed somewhere in the file.
    ContinuousNumberingPrCashRegister,
    /// A specific break in the global numbering sequence.
    NotContinuousNumbering {
        /// The offending transaction number.
        nr: i64,
        /// The number immediately before it in file order.
        previous_nr: i64,
    },
    /// `nr` could not be parsed as a number at all.
    ValueDoesNotContainNr,
    /// A `*Type` reference did not resolve against the `Basics` table.
    NoRelationToBasicsFound {
        /// The unresolved string.
        value: String,
    },
    /// A `CTLine.artID` did not resolve against the `Article` table.
    NoRelationToArticlesFound {
        /// The unresolved string.
        value: String,
    },
    /// A mandatory-if-available child element was missing or empty.
    ElementNotFoundWhenExpected {
        /// The triggering predefined-basic code.
        predefined_basic: String,
        /// The required child element's name.
        element_name: String,
    },
    /// An entity's predefined-basic code did not match its category.
    WrongPredefinedBasicUsed {
        /// The offending predefined-basic code.
        predefined_basic: String,
    },
}

impl ErrorKind {
    /// The technical error code this kind renders as, used both for the
    /// report's "technical error type" column and as the locale table key.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Ok => "OK",
            ErrorKind::XmlFileCorrupt => "XML_FILE_CORRUPT",
            ErrorKind::XmlFileEncodingCorrupt => "XML_FILE_ENCODING_CORRUPT",
            ErrorKind::CannotDoCheckDueToReadError => "CANNOT_DO_CHECK_DUE_TO_READ_ERROR",
            ErrorKind::Filename => "FILENAME",
            ErrorKind::SchemavElementContent { .. } => "SCHEMAV_ELEMENT_CONTENT",
            ErrorKind::SchemavOutOfSequence { .. } => "SCHEMAV_OUT_OF_SEQUENCE",
            ErrorKind::StructureOther { .. } => "STRUCTURE_OTHER",
            ErrorKind::CertificateCompleteError => "CERTIFICATE_COMPLETE_ERROR",
            ErrorKind::CertificateOcspCompleteError => "CERTIFICATE_OCSP_COMPLETE_ERROR",
            ErrorKind::CertificateNotTrustedIssuer => "CERTIFICATE_NOT_TRUSTED_ISSUER",
            ErrorKind::CertificateRevoked => "CERTIFICATE_REVOKED",
            ErrorKind::CertificateUnknown => "CERTIFICATE_UNKNOWN",
            ErrorKind::CertificateExpired => "CERTIFICATE_EXPIRED",
            ErrorKind::CertificateNotValidYet => "CERTIFICATE_NOT_VALID_YET",
            ErrorKind::NoCertificate => "NO_CERTIFICATE",
            ErrorKind::CertificateCouldNotRun => "CERTIFICATE_COULD_NOT_RUN",
            ErrorKind::CannotGetPublicKey => "CANNOT_GET_PUBLIC_KEY",
            ErrorKind::SignatureBreak => "SIGNATURE_BREAK",
            ErrorKind::SignatureNotVerified => "SIGNATURE_NOT_VERIFIED",
            ErrorKind::SignatureCompleteError => "SIGNATURE_COMPLETE_ERROR",
            ErrorKind::NoSignature => "NO_SIGNATURE",
            ErrorKind::EventReportTotalCashSales { .. } => "EVENT_REPORT_TOTAL_CASH_SALES",
            ErrorKind::EventReportTips { .. } => "EVENT_REPORT_TIPS",
            ErrorKind::EventReportGrandTotalSales { .. } => "EVENT_REPORT_GRAND_TOTAL_SALES",
            ErrorKind::EventReportCouldNotRun => "EVENT_REPORT_COULD_NOT_RUN",
            ErrorKind::ContinuousNumberingPrCashRegister => {
                "CONTINOUS_NUMBERING_PR_CASH_REGISTER"
            }
            ErrorKind::NotContinuousNumbering { .. } => "NOT_CONTINOUS_NUMBERING",
            ErrorKind::ValueDoesNotContainNr => "VALUE_DOES_NOT_CONTAIN_NR",
            ErrorKind::NoRelationToBasicsFound { .. } => "NO_RELATION_TO_BASICS_FOUND",
            ErrorKind::NoRelationToArticlesFound { .. } => "NO_RELATION_TO_ARTICLES_FOUND",
            ErrorKind::ElementNotFoundWhenExpected { .. } => "ELEMENT_NOT_FOUND_WHEN_EXPECTED",
            ErrorKind::WrongPredefinedBasicUsed { .. } => "WRONG_PREDEFINED_BASIC_USED",
        }
    }

    /// `true` for the synthetic per-check "everything passed" marker.
    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self, ErrorKind::Ok)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
