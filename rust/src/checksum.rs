//! Mod-37 check symbol over base-32 digits.
//!
//! The accumulator is `m = (m * 32 + v) mod 37` per digit, so the result
//! depends on digit order and every single-digit substitution moves it.

use crate::alphabet::{CheckSymbol, Symbol};
use crate::error::PmcError;

const MODULUS: u32 = 37;

/// Check symbol for a payload of already-decoded symbols.
pub fn checksum_symbols(payload: &[Symbol]) -> CheckSymbol {
    let m = payload
        .iter()
        .fold(0u32, |m, s| (m * 32 + u32::from(s.value())) % MODULUS);
    CheckSymbol::from_remainder(m)
}

/// Check symbol for a normalized payload string.
///
/// Fails with [`PmcError::BadAlphabetChar`] on any non-canonical character;
/// callers are expected to run [`crate::normalize`] first.
pub fn checksum(payload: &str) -> Result<CheckSymbol, PmcError> {
    let symbols = payload
        .chars()
        .map(|c| Symbol::from_char(c).ok_or(PmcError::BadAlphabetChar(c)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(checksum_symbols(&symbols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::ALPHABET;

    const SAMPLE: &str = "F50MHJ7Q9RT2K";

    fn chk(p: &str) -> char {
        checksum(p).unwrap().as_char()
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(chk(SAMPLE), 'F');
        assert_eq!(chk("0H1MHJ7Q9RT2K"), 'K');
        assert_eq!(chk("H1MHJ7Q9RT2K"), 'K');
        assert_eq!(chk(""), '0');
    }

    #[test]
    fn test_extended_symbols_are_produced() {
        assert_eq!(chk("F50MHJ7Q9RTYW"), 'I');
        assert_eq!(chk("F50MHJ7Q9RT20"), 'L');
        assert_eq!(chk("F50MHJ7Q9RT21"), 'O');
        assert_eq!(chk("F50MHJ7Q9RT22"), 'U');
        // remainder 36 folds onto '0'
        assert_eq!(chk("F50MHJ7Q9RT23"), '0');
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(checksum(SAMPLE), checksum(SAMPLE));
    }

    #[test]
    fn test_every_single_substitution_changes_check() {
        let expected = chk(SAMPLE);
        let bytes = SAMPLE.as_bytes();
        for pos in 0..bytes.len() {
            for sub in ALPHABET.iter().filter(|c| **c != bytes[pos]) {
                let mut corrupted = bytes.to_vec();
                corrupted[pos] = *sub;
                let corrupted = String::from_utf8(corrupted).unwrap();
                assert_ne!(chk(&corrupted), expected, "false accept for {corrupted}");
            }
        }
    }

    #[test]
    fn test_adjacent_transpositions_detected() {
        let expected = chk(SAMPLE);
        let bytes = SAMPLE.as_bytes();
        for pos in 0..bytes.len() - 1 {
            if bytes[pos] == bytes[pos + 1] {
                continue;
            }
            let mut swapped = bytes.to_vec();
            swapped.swap(pos, pos + 1);
            let swapped = String::from_utf8(swapped).unwrap();
            assert_ne!(chk(&swapped), expected, "transposition accepted: {swapped}");
        }
    }

    #[test]
    fn test_rejects_non_alphabet() {
        assert_eq!(checksum("F50U"), Err(PmcError::BadAlphabetChar('U')));
        assert_eq!(checksum("f50"), Err(PmcError::BadAlphabetChar('f')));
    }
}
