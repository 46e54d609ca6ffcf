//! Crockford symbol alphabet and input normalization.
//!
//! Payload symbols are drawn from `0-9A-Z` minus `I`, `L`, `O`, `U`.
//! Those four letters exist only as checksum output and are modelled by
//! [`CheckSymbol`], never by [`Symbol`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PmcError;

/// Canonical 32-symbol alphabet, index == digit value.
pub const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Reserved check symbols for remainders 32..=35, in this exact order.
pub const EXTENDED: [char; 4] = ['I', 'L', 'O', 'U'];

const INVALID: u8 = 0xFF;

const LOOKUP: [u8; 128] = {
    let mut lookup = [INVALID; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        lookup[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    lookup
};

/// One canonical payload digit (value 0..32).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u8);

impl Symbol {
    /// Symbol for a 5-bit digit value. Only the low five bits are used.
    pub const fn from_value(value: u8) -> Self {
        Self(value & 0x1F)
    }

    /// Exact lookup of a canonical character; no confusion mapping.
    pub fn from_char(c: char) -> Option<Self> {
        if !c.is_ascii() {
            return None;
        }
        match LOOKUP[c as usize] {
            INVALID => None,
            v => Some(Self(v)),
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub fn as_char(self) -> char {
        ALPHABET[self.0 as usize] as char
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Output of the mod-37 checksum: a canonical symbol or one of [`EXTENDED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CheckSymbol(u8);

impl CheckSymbol {
    /// Fold a mod-37 remainder onto the 36-symbol check alphabet.
    ///
    /// Remainder 36 wraps to `0`, which keeps codes issued by earlier
    /// releases valid.
    pub(crate) const fn from_remainder(m: u32) -> Self {
        Self((m % 36) as u8)
    }

    /// Exact lookup, accepting the extended letters. Used when the value is
    /// known to be a check symbol (stored records), never on typed input.
    pub fn from_char(c: char) -> Option<Self> {
        if let Some(pos) = EXTENDED.iter().position(|e| *e == c) {
            return Some(Self(32 + pos as u8));
        }
        Symbol::from_char(c).map(|s| Self(s.value()))
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// True for `I`, `L`, `O`, `U`.
    pub const fn is_extended(self) -> bool {
        self.0 >= 32
    }

    pub fn as_char(self) -> char {
        if self.is_extended() {
            EXTENDED[(self.0 - 32) as usize]
        } else {
            ALPHABET[self.0 as usize] as char
        }
    }

    /// Whether a typed character stands for this check symbol.
    ///
    /// Extended symbols must match literally. Canonical symbols also accept
    /// the usual look-alikes (`I`/`L` for `1`, `O` for `0`).
    pub fn accepts(self, typed: char) -> bool {
        let typed = typed.to_ascii_uppercase();
        if self.is_extended() {
            return typed == self.as_char();
        }
        normalize_char(typed).is_some_and(|s| s.value() == self.0)
    }
}

impl fmt::Display for CheckSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl From<CheckSymbol> for String {
    fn from(chk: CheckSymbol) -> Self {
        chk.as_char().to_string()
    }
}

impl TryFrom<String> for CheckSymbol {
    type Error = PmcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c).ok_or(PmcError::InvalidCharacter(c)),
            _ => Err(PmcError::InvalidField {
                field: "chk",
                expected: 1,
                actual: value.chars().count(),
            }),
        }
    }
}

fn is_visual_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '\u{2013}' | '\u{00B7}' | '.')
}

/// Map one character onto the canonical alphabet, folding `I`/`L` to `1`
/// and `O` to `0`. `U` and anything outside `[0-9A-Za-z]` yield `None`.
pub fn normalize_char(c: char) -> Option<Symbol> {
    match c.to_ascii_uppercase() {
        'I' | 'L' => Some(Symbol(1)),
        'O' => Some(Symbol(0)),
        other => Symbol::from_char(other),
    }
}

/// Canonicalize free text into a string of alphabet symbols.
///
/// Uppercases, drops whitespace, hyphens, en-dashes, middle dots and
/// periods, then applies the look-alike mapping.
pub fn normalize(input: &str) -> Result<String, PmcError> {
    let mut out = String::with_capacity(input.len());
    for c in input.chars().flat_map(char::to_uppercase) {
        if is_visual_separator(c) {
            continue;
        }
        let sym = normalize_char(c).ok_or(PmcError::InvalidCharacter(c))?;
        out.push(sym.as_char());
    }
    Ok(out)
}

/// Normalize into symbols rather than a string.
pub fn normalize_symbols(input: &str) -> Result<Vec<Symbol>, PmcError> {
    Ok(normalize(input)?
        .chars()
        .filter_map(Symbol::from_char)
        .collect())
}
