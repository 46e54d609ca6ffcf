//! Validation of user-supplied codes.
//!
//! Every failure collapses into [`InvalidReason::Format`] or
//! [`InvalidReason::Checksum`]; callers never learn which field was wrong.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::code::{Core, Role, split_url_safe};
use crate::error::PmcError;

static DISPLAY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([A-Z0-9]{2,3})([A-Z0-9]{2})([A-Z0-9]{4})([A-Z0-9]{4})[-\x{2013}]([A-Z0-9])[-\x{2013}]([A-Z])$",
    )
    .unwrap()
});

// Displays stored by early issuance runs separated every field.
static DASHED_DISPLAY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([A-Z0-9]{2,3})[-\x{2013}]([A-Z0-9]{2})[-\x{2013}]([A-Z0-9]{4})[-\x{2013}]([A-Z0-9]{4})[-\x{2013}]([A-Z0-9])[-\x{2013}]([A-Z])$",
    )
    .unwrap()
});

static URL_SAFE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{15}$").unwrap());

/// Why a code was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    Format,
    Checksum,
}

impl InvalidReason {
    /// Message suitable for end users.
    pub fn message(self) -> &'static str {
        match self {
            Self::Format => "invalid code format",
            Self::Checksum => "invalid check character",
        }
    }
}

/// Outcome of [`validate`] and [`lookup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid { core: Core, role: Role },
    Invalid { reason: InvalidReason },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn into_result(self) -> Result<(Core, Role), InvalidReason> {
        match self {
            Self::Valid { core, role } => Ok((core, role)),
            Self::Invalid { reason } => Err(reason),
        }
    }

    fn from_codec(result: Result<(Core, Role), PmcError>) -> Self {
        match result {
            Ok((core, role)) => Self::Valid { core, role },
            Err(err) => Self::Invalid {
                reason: reason_for(&err),
            },
        }
    }
}

fn reason_for(err: &PmcError) -> InvalidReason {
    match err {
        PmcError::Checksum => InvalidReason::Checksum,
        PmcError::BadAlphabetChar(c) => {
            warn!(character = ?c, "non-canonical symbol reached checksum");
            InvalidReason::Format
        }
        _ => InvalidReason::Format,
    }
}

fn verify_captures(caps: &Captures<'_>) -> Result<(Core, Role), PmcError> {
    let payload = format!("{}{}{}{}", &caps[1], &caps[2], &caps[3], &caps[4]);
    let typed_check = caps[5].chars().next().ok_or(PmcError::Format)?;
    let role = caps[6]
        .chars()
        .next()
        .and_then(Role::from_char)
        .ok_or(PmcError::Format)?;
    let core = Core::verify(&payload, typed_check)?;
    Ok((core, role))
}

fn validate_with(pattern: &Regex, input: &str) -> ValidationResult {
    let text = input.trim().to_uppercase();
    let result = match pattern.captures(&text) {
        Some(caps) => verify_captures(&caps),
        None => Err(PmcError::Format),
    };
    let outcome = ValidationResult::from_codec(result);
    match &outcome {
        ValidationResult::Valid { core, role } => debug!(%core, %role, "pmc valid"),
        ValidationResult::Invalid { reason } => debug!(?reason, "pmc rejected"),
    }
    outcome
}

/// Validate a display-form code such as `F50MHJ7Q9RT2K-F-X`.
///
/// Case and surrounding whitespace are ignored, hyphen and en-dash are
/// interchangeable, and look-alike characters in the payload are folded
/// before the check symbol is recomputed.
pub fn validate(input: &str) -> ValidationResult {
    validate_with(&DISPLAY_PATTERN, input)
}

/// Resolve free text from any surface: URL-safe token, display form, or a
/// display with every field separated.
pub fn lookup(input: &str) -> ValidationResult {
    let text = input.trim().to_uppercase();
    if URL_SAFE_PATTERN.is_match(&text) {
        return ValidationResult::from_codec(split_url_safe(&text));
    }
    if DASHED_DISPLAY_PATTERN.is_match(&text) {
        return validate_with(&DASHED_DISPLAY_PATTERN, &text);
    }
    validate(&text)
}

/// Cheap shape check; no checksum.
pub fn is_pmc_format(input: &str) -> bool {
    let text = input.trim().to_uppercase();
    URL_SAFE_PATTERN.is_match(&text)
        || DISPLAY_PATTERN.is_match(&text)
        || DASHED_DISPLAY_PATTERN.is_match(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "F50MHJ7Q9RT2K-F-X";

    fn invalid(reason: InvalidReason) -> ValidationResult {
        ValidationResult::Invalid { reason }
    }

    fn core_of(s: &str) -> Core {
        s.parse().unwrap()
    }

    #[test]
    fn test_validate_happy_path() {
        assert_eq!(
            validate(CODE),
            ValidationResult::Valid {
                core: core_of("F50MHJ7Q9RT2KF"),
                role: Role::X
            }
        );
    }

    #[test]
    fn test_validate_tolerates_case_whitespace_and_dashes() {
        let expected = validate(CODE);
        assert_eq!(validate("  f50mhj7q9rt2k-f-x\n"), expected);
        assert_eq!(validate("F50MHJ7Q9RT2K–F-X"), expected);
        assert_eq!(validate("F50MHJ7Q9RT2K–F–X"), expected);
        assert_eq!(validate("F50MHJ7Q9RT2K-F–X"), expected);
    }

    #[test]
    fn test_validate_folds_lookalikes_in_payload() {
        // 'MH' and 'RT2K' untouched; the tier zero typed as letter O
        assert_eq!(validate("F5OMHJ7Q9RT2K-F-X"), validate(CODE));
    }

    #[test]
    fn test_validate_single_substitution_is_checksum_error() {
        assert_eq!(validate("F50MHJ7Q9RT2M-F-X"), invalid(InvalidReason::Checksum));
        assert_eq!(validate("F50NHJ7Q9RT2K-F-X"), invalid(InvalidReason::Checksum));
        assert_eq!(validate("F50MHJ7Q9RT2K-G-X"), invalid(InvalidReason::Checksum));
    }

    #[test]
    fn test_validate_format_errors() {
        assert_eq!(validate("F50MHJ7Q9RT2K-F"), invalid(InvalidReason::Format));
        assert_eq!(validate("F50MHJ7Q9RT2KFX"), invalid(InvalidReason::Format));
        assert_eq!(validate("F50MHJ7Q9RT2K-F-Z"), invalid(InvalidReason::Format));
        assert_eq!(validate("F50MHJ7Q9RT2K-F-1"), invalid(InvalidReason::Format));
        assert_eq!(validate("F50MHJ7Q9RU2K-F-X"), invalid(InvalidReason::Format));
        assert_eq!(validate(""), invalid(InvalidReason::Format));
    }

    #[test]
    fn test_validate_extended_check_symbols() {
        // payload RTYW checks to I, RT20 to L, RT21 to O, RT22 to U
        for (code, core) in [
            ("F50MHJ7Q9RTYW-I-X", "F50MHJ7Q9RTYWI"),
            ("F50MHJ7Q9RT20-L-X", "F50MHJ7Q9RT20L"),
            ("F50MHJ7Q9RT21-O-X", "F50MHJ7Q9RT21O"),
            ("F50MHJ7Q9RT22-U-X", "F50MHJ7Q9RT22U"),
        ] {
            assert_eq!(
                validate(code),
                ValidationResult::Valid {
                    core: core_of(core),
                    role: Role::X
                },
                "{code}"
            );
        }
        // an extended check is never read as the digit it resembles
        assert_eq!(validate("F50MHJ7Q9RTYW-1-X"), invalid(InvalidReason::Checksum));
        assert_eq!(validate("F50MHJ7Q9RT21-0-X"), invalid(InvalidReason::Checksum));
    }

    #[test]
    fn test_validate_accepts_legacy_two_symbol_tier() {
        let result = validate("H1MHJ7Q9RT2K-K-A");
        let (core, role) = result.into_result().unwrap();
        assert_eq!(core.as_str(), "H1MHJ7Q9RT2KK");
        assert_eq!(core.tier(), Some(crate::code::Tier::H1));
        assert_eq!(role, Role::A);
    }

    #[test]
    fn test_lookup_all_surfaces() {
        let expected = validate(CODE);
        assert!(expected.is_valid());
        assert_eq!(lookup("F50MHJ7Q9RT2KFX"), expected);
        assert_eq!(lookup("f50mhj7q9rt2kfx"), expected);
        assert_eq!(lookup(CODE), expected);
        assert_eq!(lookup("F50-MH-J7Q9-RT2K–F-X"), expected);
        assert_eq!(lookup("F50MHJ7Q9RT2KGX"), invalid(InvalidReason::Checksum));
        assert_eq!(lookup("not a code"), invalid(InvalidReason::Format));
    }

    #[test]
    fn test_is_pmc_format() {
        assert!(is_pmc_format(CODE));
        assert!(is_pmc_format("F50MHJ7Q9RT2KFX"));
        assert!(is_pmc_format("F50-MH-J7Q9-RT2K–F-X"));
        // shape only, checksum not consulted
        assert!(is_pmc_format("F50MHJ7Q9RT2K-G-X"));
        assert!(!is_pmc_format("F50MHJ7Q9RT2K"));
        assert!(!is_pmc_format("123e4567-e89b-12d3-a456-426614174000"));
    }

    #[test]
    fn test_reason_messages_and_serde() {
        assert_eq!(InvalidReason::Format.message(), "invalid code format");
        assert_eq!(InvalidReason::Checksum.message(), "invalid check character");
        let json = serde_json::to_value(validate(CODE)).unwrap();
        assert_eq!(json["status"], "valid");
        assert_eq!(json["core"], "F50MHJ7Q9RT2KF");
        assert_eq!(json["role"], "X");
        let json = serde_json::to_value(validate("bad")).unwrap();
        assert_eq!(json["reason"], "format");
    }
}
