//! Fingerprint, signature and random fragment derivation.

use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::alphabet::{Symbol, normalize_char};
use crate::base32::{MAX20, encode20};
use crate::code::{Fingerprint, RandomFragment, Signature};

const FALLBACK_INITIAL: char = 'X';

/// First ASCII letter of a name after stripping diacritics, uppercased.
fn initial(name: &str) -> char {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .find(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or(FALLBACK_INITIAL)
}

// Initials are derived, not typed, so a `U` would otherwise make the
// member unissuable. It folds onto its nearest symbol instead.
fn initial_symbol(c: char) -> Symbol {
    let c = if c == 'U' { 'V' } else { c };
    normalize_char(c).unwrap_or(Symbol::from_value(29))
}

/// Two-symbol fingerprint from the first letters of first and last name.
///
/// Total: names with no usable letter contribute `X`. Initials that are
/// not alphabet symbols are folded (`I`/`L` to `1`, `O` to `0`, `U` to `V`).
pub fn derive_fingerprint(first_name: &str, last_name: &str) -> Fingerprint {
    Fingerprint([
        initial_symbol(initial(first_name)),
        initial_symbol(initial(last_name)),
    ])
}

/// Only the digits of the concatenated inputs are hashed.
fn signature_digits(date: &str, phone_suffix: &str) -> String {
    date.chars()
        .chain(phone_suffix.chars())
        .filter(char::is_ascii_digit)
        .collect()
}

/// SHA-256 of the digit string, hex encoded.
pub fn signature_digest_hex(date: &str, phone_suffix: &str) -> String {
    hex::encode(Sha256::digest(signature_digits(date, phone_suffix).as_bytes()))
}

/// Deterministic four-symbol signature: top 20 bits of SHA-256 over the
/// digits of `date ‖ phone_suffix`.
pub fn derive_signature(date: &str, phone_suffix: &str) -> Signature {
    let digest = Sha256::digest(signature_digits(date, phone_suffix).as_bytes());
    let n = (u32::from(digest[0]) << 12) | (u32::from(digest[1]) << 4) | (u32::from(digest[2]) >> 4);
    Signature(encode20(n & MAX20))
}

/// Fresh four-symbol disambiguator from the thread-local CSPRNG.
pub fn random_fragment() -> RandomFragment {
    let bytes: [u8; 3] = rand::random();
    random_fragment_from_bytes(bytes)
}

/// Keep the top 20 of 24 random bits.
pub(crate) fn random_fragment_from_bytes(bytes: [u8; 3]) -> RandomFragment {
    let n = ((u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2])) >> 4;
    RandomFragment(encode20(n))
}
