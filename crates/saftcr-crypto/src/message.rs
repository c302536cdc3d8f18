//! Builds the chained per-transaction signing message and applies one
//! [`Mode`] of the discovery product to it.

use crate::priority::{Encoding, Mode, Padding, TimeForm};
use rsa::{Pkcs1v15Sign, Pss, PublicKey, RsaPublicKey};
use sha2::{Digest, Sha512};

/// Every field the signing message concatenates, exactly as written in the
/// source file (no numeric re-formatting: a byte-for-byte match is what was
/// actually signed).
pub struct MessageFields<'a> {
    pub prev_signature: &'a str,
    pub nr: &'a str,
    pub trans_id: &'a str,
    pub trans_type: &'a str,
    pub trans_date: &'a str,
    pub trans_time: &'a str,
    pub emp_id: &'a str,
    pub trans_amnt_in: &'a str,
    pub trans_amnt_ex: &'a str,
    pub register_id: &'a str,
    pub company_ident: &'a str,
}

/// Best-effort `HH:MM:SS` normalisation of a `transTime` field. Accepts
/// `HH:MM:SS`, `HH:MM`, and a bare `HHMMSS` digit run; anything else is left
/// unrecognised (the caller then falls back to the as-written text, which
/// means the two time-form branches degenerate to the same try — harmless,
/// just redundant).
fn normalize_hh_mm_ss(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let (h, m, s) = match digits.len() {
        6 => (&digits[0..2], &digits[2..4], &digits[4..6]),
        4 => (&digits[0..2], &digits[2..4], "00"),
        _ => return None,
    };
    let (h, m, s): (u32, u32, u32) = (h.parse().ok()?, m.parse().ok()?, s.parse().ok()?);
    if h > 23 || m > 59 || s > 59 {
        return None;
    }
    Some(format!("{:02}:{:02}:{:02}", h, m, s))
}

/// Build the `;`-joined message text for `fields` under `time_form`.
pub fn full_message(fields: &MessageFields, time_form: TimeForm) -> String {
    let trans_time = match time_form {
        TimeForm::AsWritten => fields.trans_time.to_string(),
        TimeForm::HhMmSs => normalize_hh_mm_ss(fields.trans_time).unwrap_or_else(|| fields.trans_time.to_string()),
    };
    [
        fields.prev_signature,
        fields.nr,
        fields.trans_id,
        fields.trans_type,
        &trans_date_field(fields, time_form),
        &trans_time,
        fields.emp_id,
        fields.trans_amnt_in,
        fields.trans_amnt_ex,
        fields.register_id,
        fields.company_ident,
    ]
    .join(";")
}

/// Strip an `xsd:date` timezone suffix (`Z`, `+HH:MM`, `-HH:MM`) off an
/// otherwise `YYYY-MM-DD` value.
fn strip_date_timezone(raw: &str) -> &str {
    if raw.len() > 10 && raw.is_char_boundary(10) {
        &raw[..10]
    } else {
        raw
    }
}

fn trans_date_field(fields: &MessageFields, time_form: TimeForm) -> String {
    match time_form {
        TimeForm::AsWritten => fields.trans_date.to_string(),
        // The HH:MM:SS signing variant recomputes the date from scratch
        // rather than reusing the as-written text, which drops any
        // timezone suffix legal under xsd:date.
        TimeForm::HhMmSs => strip_date_timezone(fields.trans_date).to_string(),
    }
}

/// Apply `mode`'s encoding dimension: the raw message bytes, or its own
/// SHA-512 digest (which the padding scheme below hashes a second time,
/// matching the profile's own encode/verify ambiguity).
fn encode(message: &str, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Raw => message.as_bytes().to_vec(),
        Encoding::Sha512 => Sha512::digest(message.as_bytes()).to_vec(),
    }
}

/// Try one [`Mode`] against `fields` and `signature`, returning whether it
/// verified.
pub fn verify_mode(key: &RsaPublicKey, fields: &MessageFields, mode: Mode, signature: &[u8]) -> bool {
    let message = full_message(fields, mode.time_form);
    let encoded = encode(&message, mode.encoding);
    let digest = Sha512::digest(&encoded);

    let result = match mode.padding {
        Padding::Pkcs1v15 => key.verify(Pkcs1v15Sign::new::<Sha512>(), &digest, signature),
        // PSS verification recovers the salt length from the signature
        // itself, so the digest-length and max-length variants collapse to
        // the same check here; the enum keeps them distinct because the
        // profile's ambiguity is about how the file was *signed*, not how
        // it is verified.
        Padding::PssDigestLength | Padding::PssMaxLength => key.verify(Pss::new::<Sha512>(), &digest, signature),
    };
    result.is_ok()
}
