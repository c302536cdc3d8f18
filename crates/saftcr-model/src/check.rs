//! The five validation passes plus the upstream read step, ordered for
//! report sorting.

use std::fmt;

/// One of the checks a file analysis runs.
///
/// Ordering matches the report's required check rank:
/// `xml_read < naming < structure < certificate < signature < value`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Check {
    /// Reading/parsing the file itself (before any validator runs).
    XmlRead,
    /// Filename pattern validation.
    Naming,
    /// XSD structural validation (with repair).
    Structure,
    /// Certificate trust/validity validation.
    Certificate,
    /// Per-transaction signature chain validation.
    Signature,
    /// Business-rule (value) validation.
    Value,
}

impl Check {
    /// All checks in rank order, as listed in the report.
    pub const ALL: [Check; 6] = [
        Check::XmlRead,
        Check::Naming,
        Check::Structure,
        Check::Certificate,
        Check::Signature,
        Check::Value,
    ];

    /// Rank used for sorting findings; lower sorts first.
    #[inline]
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Whether an error on this check should downgrade the file prefix to
    /// `FLAG_` rather than `NOK_`.
    #[inline]
    pub fn is_flag_only(self) -> bool {
        self == Check::Value
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Check::XmlRead => "xml_read",
            Check::Naming => "naming",
            Check::Structure => "structure",
            Check::Certificate => "certificate",
            Check::Signature => "signature",
            Check::Value => "value",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_total_order() {
        assert!(Check::XmlRead < Check::Naming);
        assert!(Check::Naming < Check::Structure);
        assert!(Check::Structure < Check::Certificate);
        assert!(Check::Certificate < Check::Signature);
        assert!(Check::Signature < Check::Value);
    }

    #[test]
    fn only_value_is_flag_only() {
        for check in Check::ALL.iter().copied() {
            assert_eq!(check.is_flag_only(), check == Check::Value);
        }
    }
}
