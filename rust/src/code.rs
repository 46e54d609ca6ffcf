//! Code assembly: field types, the checksummed [`Core`], and its two
//! external renderings.
//!
//! ```text
//! Core     ::= TIER(3) NM2(2) SIG(4) RAND(4) CHK(1)
//! Display  ::= TIER NM2 SIG RAND "-" CHK "-" ROLE
//! UrlSafe  ::= Core ROLE
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::alphabet::{CheckSymbol, Symbol, normalize, normalize_symbols};
use crate::base32::render;
use crate::checksum::{checksum, checksum_symbols};
use crate::error::PmcError;

/// Separator written before the check symbol and before the role.
/// Parsers also accept an en-dash in either position.
pub const DISPLAY_SEPARATOR: char = '-';
/// Symbols in a freshly assembled core.
pub const CORE_LEN: usize = 14;
/// Characters in a URL-safe code.
pub const URL_SAFE_LEN: usize = CORE_LEN + 1;

// Payload length without the tier: NM2 + SIG + RAND.
const TAIL_LEN: usize = 2 + 4 + 4;

/// Membership tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tier {
    #[default]
    F50,
    H1,
    FF,
}

impl Tier {
    /// Name as issued to members.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::F50 => "F50",
            Self::H1 => "H1",
            Self::FF => "FF",
        }
    }

    /// Fixed three-symbol rendering used inside a core.
    pub fn code(self) -> &'static str {
        match self {
            Self::F50 => "F50",
            Self::H1 => "0H1",
            Self::FF => "0FF",
        }
    }

    /// Accepts the tier name or its core rendering, any case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "F50" => Some(Self::F50),
            "H1" | "0H1" => Some(Self::H1),
            "FF" | "0FF" => Some(Self::FF),
            _ => None,
        }
    }

    fn symbols(self) -> impl Iterator<Item = Symbol> {
        self.code().chars().filter_map(Symbol::from_char)
    }
}

impl FromStr for Tier {
    type Err = PmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| PmcError::InvalidTier(s.to_string()))
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account holder (`X`) or one of the authorized-user slots `A`..`G`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    X,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Self::X,
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::G,
    ];

    pub fn as_char(self) -> char {
        match self {
            Self::X => 'X',
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        let c = c.to_ascii_uppercase();
        Self::ALL.into_iter().find(|r| r.as_char() == c)
    }

    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    pub fn is_account_holder(self) -> bool {
        self == Self::X
    }
}

impl FromStr for Role {
    type Err = PmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| PmcError::InvalidRole(s.to_string()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

fn parse_fixed<const N: usize>(field: &'static str, s: &str) -> Result<[Symbol; N], PmcError> {
    let symbols = normalize_symbols(s)?;
    let actual = symbols.len();
    symbols.try_into().map_err(|_| PmcError::InvalidField {
        field,
        expected: N,
        actual,
    })
}

/// Two-symbol name fingerprint (NM2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(pub(crate) [Symbol; 2]);

/// Four-symbol signature fragment (SIG).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature(pub(crate) [Symbol; 4]);

/// Four-symbol random disambiguator (RAND).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RandomFragment(pub(crate) [Symbol; 4]);

impl Fingerprint {
    pub fn symbols(&self) -> &[Symbol; 2] {
        &self.0
    }
}

impl Signature {
    pub fn symbols(&self) -> &[Symbol; 4] {
        &self.0
    }
}

impl RandomFragment {
    pub fn symbols(&self) -> &[Symbol; 4] {
        &self.0
    }
}

impl FromStr for Fingerprint {
    type Err = PmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed("nm2", s).map(Self)
    }
}

impl FromStr for Signature {
    type Err = PmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed("sig", s).map(Self)
    }
}

impl FromStr for RandomFragment {
    type Err = PmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed("rand", s).map(Self)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.0))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.0))
    }
}

impl fmt::Display for RandomFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.0))
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = PmcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Signature {
    type Error = PmcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for RandomFragment {
    type Error = PmcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Fingerprint> for String {
    fn from(v: Fingerprint) -> Self {
        v.to_string()
    }
}

impl From<Signature> for String {
    fn from(v: Signature) -> Self {
        v.to_string()
    }
}

impl From<RandomFragment> for String {
    fn from(v: RandomFragment) -> Self {
        v.to_string()
    }
}

/// Checksummed storage identity of an issued code, independent of role.
///
/// Always canonical: payload symbols from the base alphabet followed by a
/// check symbol that matches them. Cores assembled here are 14 symbols;
/// cores recovered from legacy two-symbol tiers are 13.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Core {
    text: String,
    check: CheckSymbol,
}

impl Core {
    /// Verify a typed payload against a typed check character.
    ///
    /// The payload is normalized (look-alikes folded); the check character
    /// is matched with [`CheckSymbol::accepts`] so extended symbols are
    /// never reinterpreted as digits.
    pub fn verify(payload: &str, typed_check: char) -> Result<Self, PmcError> {
        let normalized = normalize(payload)?;
        let len = normalized.len();
        if len != TAIL_LEN + 2 && len != TAIL_LEN + 3 {
            return Err(PmcError::Format);
        }
        let check = checksum(&normalized)?;
        if !check.accepts(typed_check) {
            return Err(PmcError::Checksum);
        }
        Ok(Self::assemble(normalized, check))
    }

    fn assemble(mut payload: String, check: CheckSymbol) -> Self {
        payload.push(check.as_char());
        Self {
            text: payload,
            check,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Everything but the check symbol.
    pub fn payload(&self) -> &str {
        &self.text[..self.text.len() - 1]
    }

    pub fn check(&self) -> CheckSymbol {
        self.check
    }

    fn tail_start(&self) -> usize {
        self.payload().len() - TAIL_LEN
    }

    /// Tier field as written (`F50`, `0H1`, or a legacy `H1`).
    pub fn tier_str(&self) -> &str {
        &self.text[..self.tail_start()]
    }

    pub fn tier(&self) -> Option<Tier> {
        Tier::parse(self.tier_str())
    }

    pub fn nm2_str(&self) -> &str {
        let at = self.tail_start();
        &self.text[at..at + 2]
    }

    pub fn sig_str(&self) -> &str {
        let at = self.tail_start() + 2;
        &self.text[at..at + 4]
    }

    pub fn rand_str(&self) -> &str {
        let at = self.tail_start() + 6;
        &self.text[at..at + 4]
    }

    fn symbols_at<const N: usize>(&self, at: usize) -> [Symbol; N] {
        let mut out = [Symbol::from_value(0); N];
        for (slot, c) in out.iter_mut().zip(self.text[at..].chars()) {
            *slot = Symbol::from_char(c).unwrap_or(*slot);
        }
        out
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint(self.symbols_at(self.tail_start()))
    }

    pub fn signature(&self) -> Signature {
        Signature(self.symbols_at(self.tail_start() + 2))
    }

    pub fn random(&self) -> RandomFragment {
        RandomFragment(self.symbols_at(self.tail_start() + 6))
    }
}

impl FromStr for Core {
    type Err = PmcError;

    /// Strict parse of a stored core: no normalization, exact check symbol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let last = chars.next_back().ok_or(PmcError::Format)?;
        let payload = chars.as_str();
        let typed = CheckSymbol::from_char(last).ok_or(PmcError::BadAlphabetChar(last))?;
        let len = payload.len();
        if len != TAIL_LEN + 2 && len != TAIL_LEN + 3 {
            return Err(PmcError::Format);
        }
        let check = checksum(payload)?;
        if check != typed {
            return Err(PmcError::Checksum);
        }
        Ok(Self::assemble(payload.to_string(), check))
    }
}

impl TryFrom<String> for Core {
    type Error = PmcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Core> for String {
    fn from(core: Core) -> Self {
        core.text
    }
}

impl AsRef<str> for Core {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Concatenate the fields into a payload and append its check symbol.
pub fn build_core(
    tier: Tier,
    fingerprint: &Fingerprint,
    signature: &Signature,
    random: &RandomFragment,
) -> (Core, CheckSymbol) {
    let payload: Vec<Symbol> = tier
        .symbols()
        .chain(fingerprint.0)
        .chain(signature.0)
        .chain(random.0)
        .collect();
    let check = checksum_symbols(&payload);
    (Core::assemble(render(&payload), check), check)
}

/// Human-facing rendering: `TIERNM2SIGRAND-CHK-ROLE`.
pub fn format_display(core: &Core, role: Role) -> String {
    format!(
        "{}{}{}{}{}{}{}{}",
        core.tier_str(),
        core.nm2_str(),
        core.sig_str(),
        core.rand_str(),
        DISPLAY_SEPARATOR,
        core.check(),
        DISPLAY_SEPARATOR,
        role
    )
}

/// Machine-facing rendering: core followed by the role, no separators.
pub fn format_url_safe(core: &Core, role: Role) -> String {
    format!("{}{}", core, role)
}

pub(crate) fn split_url_safe(input: &str) -> Result<(Core, Role), PmcError> {
    if input.len() != URL_SAFE_LEN || !input.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PmcError::Format);
    }
    let upper = input.to_ascii_uppercase();
    let (payload, rest) = upper.split_at(CORE_LEN - 1);
    let mut rest = rest.chars();
    let (Some(typed_check), Some(role)) = (rest.next(), rest.next()) else {
        return Err(PmcError::Format);
    };
    let role = Role::from_char(role).ok_or(PmcError::Format)?;
    let core = Core::verify(payload, typed_check)?;
    Ok((core, role))
}

/// Split a URL-safe code into its core and role.
///
/// Input must be exactly [`URL_SAFE_LEN`] characters. The check symbol is
/// verified here as well, so a token that parses is always a valid core.
pub fn parse_url_safe(input: &str) -> Option<(Core, Role)> {
    split_url_safe(input).ok()
}
