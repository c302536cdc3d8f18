//! Sentinel text written into synthetic elements the Structure Validator
//! inserts. Every other check treats a value equal to one of these as "not
//! really present" rather than as file content.

/// Placeholder for a `String`-typed element.
pub const STRING: &str = "DUMMY_STRING_VALUE";
/// Placeholder for an `IdentificationString`-typed element.
pub const IDENTIFICATION: &str = "DUMMY_ID_VALUE";
/// Placeholder for a `Nonnegativeinteger`-typed element.
pub const NUMERIC: &str = "0";
/// Placeholder for a signature-reference element (`ds:Signature`).
pub const SIGNATURE: &str = "DUMMY_SIGNATURE_VALUE";
/// Placeholder for a date/dateTime-typed element.
pub const DATE: &str = "1970-01-01T00:00:00";
/// Placeholder for an element with no declared content type.
pub const EMPTY: &str = "";

/// `true` if `text` is one of the sentinel values above, i.e. the element
/// was synthesized rather than read from the file.
pub fn is_sentinel(text: &str) -> bool {
    matches!(text, STRING | IDENTIFICATION | NUMERIC | SIGNATURE | DATE | EMPTY)
}

/// Pick the dummy text for an element whose XSD `type` attribute is
/// `type_name` (or `None` for an element with no declared complex/simple
/// type, i.e. empty content).
pub fn for_type(type_name: Option<&str>) -> &'static str {
    let type_name = match type_name {
        Some(t) => t,
        None => return EMPTY,
    };
    let lower = type_name.to_lowercase();
    if lower.contains("nonnegativeinteger") {
        NUMERIC
    } else if lower.contains("identificationstring") {
        IDENTIFICATION
    } else if lower.contains("string") && !lower.contains("report") {
        STRING
    } else if lower.contains("date") {
        DATE
    } else if lower.contains("signature") {
        SIGNATURE
    } else {
        STRING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_numeric_for_nonnegative_integer_type() {
        assert_eq!(for_type(Some("NonnegativeintegerType")), NUMERIC);
    }

    #[test]
    fn picks_string_but_not_for_report_typed_strings() {
        assert_eq!(for_type(Some("ReportStringType")), STRING);
        assert_eq!(for_type(Some("StringType")), STRING);
    }

    #[test]
    fn no_type_name_is_empty() {
        assert_eq!(for_type(None), EMPTY);
    }

    #[test]
    fn recognises_sentinels() {
        assert!(is_sentinel(STRING));
        assert!(is_sentinel(""));
        assert!(!is_sentinel("real value"));
    }
}
