//! pmc: Public Member Code encoding, issuance and validation.
//!
//! A PMC is a short, checksummed, human-typable member identifier built from
//! Crockford base-32 symbols.
//!
//! # Format
//!
//! ```text
//! CORE    ::= TIER(3) NM2(2) SIG(4) RAND(4) CHK(1)
//! DISPLAY ::= TIER NM2 SIG RAND "-" CHK "-" ROLE
//! URLSAFE ::= CORE ROLE
//! ```
//!
//! `CHK` is a mod-37 check symbol; besides the 32 payload symbols it may be
//! one of `I`, `L`, `O`, `U`. `ROLE` is `X` for the account holder and
//! `A`..`G` for authorized users.
//!
//! # Example
//!
//! ```
//! use pmc::{IssueRequest, Role, Tier, ValidationResult, issue, validate};
//!
//! let req = IssueRequest::new(Tier::F50, Role::X)
//!     .names("Matt", "Hardage")
//!     .signature_inputs("19881203", "123456");
//! let code = issue(&req).expect("signature inputs supplied");
//! println!("{}", code.display); // e.g., "F50MHCGDJ7K1Q-4-X"
//!
//! assert!(matches!(validate(&code.display), ValidationResult::Valid { .. }));
//! ```

mod alphabet;
mod async_api;
mod base32;
mod checksum;
mod code;
mod derive;
mod error;
mod issue;
mod validate;

pub use alphabet::{ALPHABET, CheckSymbol, EXTENDED, Symbol, normalize, normalize_char};
pub use async_api::{async_issue, async_issue_batch, async_lookup, async_validate};
pub use base32::{MAX20, decode4, encode20};
pub use checksum::{checksum, checksum_symbols};
pub use code::{
    CORE_LEN, Core, DISPLAY_SEPARATOR, Fingerprint, RandomFragment, Role, Signature, Tier,
    URL_SAFE_LEN, build_core, format_display, format_url_safe, parse_url_safe,
};
pub use derive::{derive_fingerprint, derive_signature, random_fragment, signature_digest_hex};
pub use error::{IssueError, PmcError};
pub use issue::{CodeStatus, Identity, IssueRequest, IssuedCode, issue, issue_with, resolve_identity};
pub use validate::{InvalidReason, ValidationResult, is_pmc_format, lookup, validate};
