//! Lenient numeric parsing shared by the domain-model extractor and the
//! numbering-continuity rule.

/// Result of parsing a transaction `nr` field.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParsedNr {
    /// The parsed value, or `0.0` when parsing failed outright.
    pub value: f64,
    /// `true` if the raw text contained a comma (a decimal-separator
    /// mistake that the structure check flags as `VALUE_DOES_NOT_CONTAIN_NR`
    /// rather than silently truncating).
    pub contains_comma: bool,
}

/// Parse a transaction number leniently: a clean numeric string parses
/// directly; a comma marks the value as unusable (`value = 0.0`,
/// `contains_comma = true`); otherwise the longest run of digits in the
/// string is extracted.
pub fn parse_nr(raw: &str) -> ParsedNr {
    if raw.contains(',') {
        return ParsedNr {
            value: 0.0,
            contains_comma: true,
        };
    }
    if let Ok(value) = raw.trim().parse::<f64>() {
        return ParsedNr {
            value,
            contains_comma: false,
        };
    }

    let mut longest = String::new();
    let mut current = String::new();
    for c in raw.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else {
            if current.len() > longest.len() {
                longest = current.clone();
            }
            current.clear();
        }
    }
    if current.len() > longest.len() {
        longest = current;
    }

    ParsedNr {
        value: longest.parse().unwrap_or(0.0),
        contains_comma: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_numeric_parses_directly() {
        assert_eq!(parse_nr("42").value, 42.0);
        assert!(!parse_nr("42").contains_comma);
    }

    #[test]
    fn comma_marks_unusable() {
        let r = parse_nr("4,2");
        assert_eq!(r.value, 0.0);
        assert!(r.contains_comma);
    }

    #[test]
    fn extracts_longest_digit_run() {
        assert_eq!(parse_nr("nr-00042-x").value, 42.0);
        assert_eq!(parse_nr("a1b222c33").value, 222.0);
    }

    #[test]
    fn unparseable_garbage_is_zero() {
        assert_eq!(parse_nr("abcdef").value, 0.0);
    }
}
