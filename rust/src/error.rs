//! Error types for PMC encoding, decoding and issuance.

use thiserror::Error;

/// Errors raised by the codec primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PmcError {
    /// Normalization left a character with no canonical mapping (notably `U`).
    #[error("Invalid character: {0:?}")]
    InvalidCharacter(char),
    #[error("Invalid code format")]
    Format,
    #[error("Invalid check character")]
    Checksum,
    /// A character outside the canonical alphabet reached the checksum.
    /// Normalized input never triggers this.
    #[error("Bad base32 character: {0:?}")]
    BadAlphabetChar(char),
    #[error("Unknown tier: {0}")]
    InvalidTier(String),
    #[error("Unknown role: {0}")]
    InvalidRole(String),
    #[error("Field {field} must be {expected} symbols, got {actual}")]
    InvalidField {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Precondition failures of the issuance workflow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error("Date of birth and phone suffix are required to derive a new signature")]
    MissingSignatureInputs,
    #[error("Date of birth must have 8 digits and phone suffix 6 digits")]
    MalformedSignatureInputs,
    #[error("Account holder has no active code to inherit from")]
    HolderCodeMissing,
    #[error(transparent)]
    Codec(#[from] PmcError),
}
