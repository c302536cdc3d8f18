//! Adaptive mode discovery for the per-transaction signature chain: the
//! 12-way Cartesian product of padding scheme, message digesting, and
//! `transTime` formatting, with the winning combination promoted to the
//! front so a file homogeneous in mode converges to one try per
//! transaction after the first success.

use parking_lot::Mutex;

/// RSA padding scheme under test.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Padding {
    Pkcs1v15,
    PssDigestLength,
    PssMaxLength,
}

/// Whether the message is signed as written, or as its own SHA-512 digest
/// (which the padding scheme then hashes again, per the profile's own
/// ambiguity).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Encoding {
    Raw,
    Sha512,
}

/// Whether `transTime` enters the message as written, or normalised to
/// `HH:MM:SS`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimeForm {
    AsWritten,
    HhMmSs,
}

/// One point in the 12-element Cartesian product.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Mode {
    pub padding: Padding,
    pub encoding: Encoding,
    pub time_form: TimeForm,
}

fn initial_modes() -> Vec<Mode> {
    let mut modes = Vec::with_capacity(12);
    for &padding in &[Padding::Pkcs1v15, Padding::PssDigestLength, Padding::PssMaxLength] {
        for &encoding in &[Encoding::Raw, Encoding::Sha512] {
            for &time_form in &[TimeForm::AsWritten, TimeForm::HhMmSs] {
                modes.push(Mode { padding, encoding, time_form });
            }
        }
    }
    modes
}

/// Process-wide signature-mode priority list. Shared across every file
/// analysed in one run, per the component design: a file's prevailing mode
/// is learned once and stays fast for the rest of the run.
pub struct SignaturePriority {
    modes: Mutex<Vec<Mode>>,
}

impl SignaturePriority {
    pub fn new() -> Self {
        SignaturePriority {
            modes: Mutex::new(initial_modes()),
        }
    }

    /// Current try order, snapshotted for one verification attempt.
    pub fn snapshot(&self) -> Vec<Mode> {
        self.modes.lock().clone()
    }

    /// Move `mode` to the front of the priority list. No-op if it is
    /// already first or not present.
    pub fn promote(&self, mode: Mode) {
        let mut modes = self.modes.lock();
        if let Some(pos) = modes.iter().position(|&m| m == mode) {
            if pos != 0 {
                let found = modes.remove(pos);
                modes.insert(0, found);
            }
        }
    }
}

impl Default for SignaturePriority {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_twelve_modes_in_declared_order() {
        let priority = SignaturePriority::new();
        let modes = priority.snapshot();
        assert_eq!(modes.len(), 12);
        assert_eq!(modes[0].padding, Padding::Pkcs1v15);
        assert_eq!(modes[0].encoding, Encoding::Raw);
        assert_eq!(modes[0].time_form, TimeForm::AsWritten);
        assert_eq!(modes[11].padding, Padding::PssMaxLength);
        assert_eq!(modes[11].encoding, Encoding::Sha512);
        assert_eq!(modes[11].time_form, TimeForm::HhMmSs);
    }

    #[test]
    fn promote_moves_winner_to_front() {
        let priority = SignaturePriority::new();
        let winner = priority.snapshot()[7];
        priority.promote(winner);
        assert_eq!(priority.snapshot()[0], winner);
    }

    #[test]
    fn promote_of_already_first_is_a_no_op() {
        let priority = SignaturePriority::new();
        let first = priority.snapshot()[0];
        priority.promote(first);
        assert_eq!(priority.snapshot()[0], first);
    }
}
