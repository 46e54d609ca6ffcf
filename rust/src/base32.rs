//! Fixed-width 20-bit integer codec over the Crockford alphabet.

use crate::alphabet::Symbol;

/// Largest value that fits in four symbols.
pub const MAX20: u32 = (1 << 20) - 1;

/// Encode the low 20 bits of `n` as four symbols, most significant first.
pub fn encode20(n: u32) -> [Symbol; 4] {
    let n = n & MAX20;
    let mut out = [Symbol::from_value(0); 4];
    for (i, slot) in out.iter_mut().enumerate() {
        let shift = 5 * (3 - i);
        *slot = Symbol::from_value(((n >> shift) & 0x1F) as u8);
    }
    out
}

/// Inverse of [`encode20`].
pub fn decode4(symbols: &[Symbol; 4]) -> u32 {
    symbols
        .iter()
        .fold(0u32, |acc, s| (acc << 5) | u32::from(s.value()))
}

pub(crate) fn render(symbols: &[Symbol]) -> String {
    symbols.iter().map(|s| s.as_char()).collect()
}
