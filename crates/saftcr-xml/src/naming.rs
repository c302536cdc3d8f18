//! Naming Validator: the filename grammar (§4.3 of the component design).

use saftcr_common::BoolExt;
use saftcr_model::check::Check;
use saftcr_model::error_kind::ErrorKind;
use saftcr_model::finding::Finding;

const EXPECTED_NAME_ONE_FIELD: &str = "SAF-T Cash Register";
const EXPECTED_NAME_THREE_FIELDS: &str = "SAF-T_Cash_Register";

/// Validate a filename stem (no extension) against the audit-file naming
/// grammar. Returns `Ok(())` or a single `FILENAME` finding.
pub fn validate(stem: &str) -> Result<(), Finding> {
    let fields: Vec<&str> = stem.split('_').collect();
    let (name, expected, rest): (String, &str, &[&str]) = match fields.len() {
        7 => (fields[0..3].join("_"), EXPECTED_NAME_THREE_FIELDS, &fields[3..]),
        5 => (fields[0].to_string(), EXPECTED_NAME_ONE_FIELD, &fields[1..]),
        _ => return Err(filename_error()),
    };

    (name == expected).or_err(()).map_err(|_| filename_error())?;

    let cvr8 = rest[0];
    (cvr8.len() == 8 && cvr8.chars().all(|c| c.is_ascii_digit()))
        .or_err(())
        .map_err(|_| filename_error())?;
    let cvr_value: u64 = cvr8.parse().map_err(|_| filename_error())?;
    (cvr_value <= 99_999_999)
        .or_err(())
        .map_err(|_| filename_error())?;

    validate_timestamp(rest[1]).map_err(|_| filename_error())?;

    for part in &rest[2..4] {
        (part.len() == 1 && part.chars().next().map(|c| ('1'..='9').contains(&c)).unwrap_or(false))
            .or_err(())
            .map_err(|_| filename_error())?;
    }

    Ok(())
}

fn validate_timestamp(ts: &str) -> Result<(), ()> {
    (ts.len() == 14 && ts.chars().all(|c| c.is_ascii_digit())).or_err(())?;
    let year: u32 = ts[0..4].parse().map_err(|_| ())?;
    let month: u32 = ts[4..6].parse().map_err(|_| ())?;
    let day: u32 = ts[6..8].parse().map_err(|_| ())?;
    let hour: u32 = ts[8..10].parse().map_err(|_| ())?;
    let minute: u32 = ts[10..12].parse().map_err(|_| ())?;
    let second: u32 = ts[12..14].parse().map_err(|_| ())?;

    (1970..=2049).contains(&year).or_err(())?;
    (1..=12).contains(&month).or_err(())?;
    (1..=31).contains(&day).or_err(())?;
    (hour <= 23).or_err(())?;
    (minute <= 60).or_err(())?;
    (second <= 60).or_err(())?;
    Ok(())
}

fn filename_error() -> Finding {
    Finding::error(Check::Naming, ErrorKind::Filename)
}
