//! Issuance: choosing the identity fragments and producing the record the
//! surrounding application persists.
//!
//! The codec does not own the member-code store. Callers pass in what the
//! store already knows (the member's active code, the account holder's
//! active code) and persist the returned [`IssuedCode`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alphabet::CheckSymbol;
use crate::code::{
    Core, Fingerprint, RandomFragment, Role, Signature, Tier, build_core, format_display,
    format_url_safe,
};
use crate::derive::{derive_fingerprint, derive_signature, random_fragment};
use crate::error::IssueError;

const DOB_DIGITS: usize = 8;
const PHONE_SUFFIX_DIGITS: usize = 6;

/// The stable part of a member's code: carried across reissues and shared
/// with authorized users on the same account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub nm2: Fingerprint,
    pub sig: Signature,
}

impl Identity {
    pub fn new(nm2: Fingerprint, sig: Signature) -> Self {
        Self { nm2, sig }
    }

    /// Derive a fresh identity for a primary account holder.
    pub fn derive(
        first_name: &str,
        last_name: &str,
        date_of_birth: &str,
        phone_last6: &str,
    ) -> Result<Self, IssueError> {
        if digit_count(date_of_birth) != DOB_DIGITS || digit_count(phone_last6) != PHONE_SUFFIX_DIGITS
        {
            return Err(IssueError::MalformedSignatureInputs);
        }
        Ok(Self {
            nm2: derive_fingerprint(first_name, last_name),
            sig: derive_signature(date_of_birth, phone_last6),
        })
    }
}

fn digit_count(s: &str) -> usize {
    s.chars().filter(char::is_ascii_digit).count()
}

/// Everything the issuance workflow needs to know about one member.
#[derive(Debug, Clone, Default)]
pub struct IssueRequest {
    pub tier: Tier,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<String>,
    pub phone_last6: Option<String>,
    /// Identity of the member's current active code, if any.
    pub existing: Option<Identity>,
    /// Identity of the account holder's active code, for authorized users.
    pub holder: Option<Identity>,
}

impl IssueRequest {
    pub fn new(tier: Tier, role: Role) -> Self {
        Self {
            tier,
            role,
            ..Self::default()
        }
    }

    pub fn names(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn signature_inputs(
        mut self,
        date_of_birth: impl Into<String>,
        phone_last6: impl Into<String>,
    ) -> Self {
        self.date_of_birth = Some(date_of_birth.into());
        self.phone_last6 = Some(phone_last6.into());
        self
    }

    pub fn existing(mut self, identity: Identity) -> Self {
        self.existing = Some(identity);
        self
    }

    pub fn holder(mut self, identity: Identity) -> Self {
        self.holder = Some(identity);
        self
    }
}

/// Pick the identity fragments for a request.
///
/// 1. A member with an active code keeps its NM2/SIG.
/// 2. A new account holder derives them; date of birth and phone suffix
///    are then mandatory.
/// 3. A new authorized user inherits the holder's.
pub fn resolve_identity(req: &IssueRequest) -> Result<Identity, IssueError> {
    if let Some(existing) = req.existing {
        debug!(role = %req.role, "reusing identity of active code");
        return Ok(existing);
    }
    if req.role.is_account_holder() {
        let (Some(dob), Some(phone)) = (req.date_of_birth.as_deref(), req.phone_last6.as_deref())
        else {
            return Err(IssueError::MissingSignatureInputs);
        };
        debug!("deriving identity for new account holder");
        return Identity::derive(&req.first_name, &req.last_name, dob, phone);
    }
    debug!(role = %req.role, "inheriting identity from account holder");
    req.holder.ok_or(IssueError::HolderCodeMissing)
}

/// Lifecycle state of an issued code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    #[default]
    Active,
    Revoked,
}

/// Record of one issuance, in the shape the member-code store keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCode {
    pub core: Core,
    pub display: String,
    pub url_safe: String,
    pub tier: Tier,
    pub nm2: Fingerprint,
    pub sig: Signature,
    pub rand: RandomFragment,
    pub chk: CheckSymbol,
    pub role: Role,
    pub status: CodeStatus,
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl IssuedCode {
    /// Assemble a record from already chosen fragments.
    pub fn assemble(
        tier: Tier,
        identity: Identity,
        rand: RandomFragment,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let (core, chk) = build_core(tier, &identity.nm2, &identity.sig, &rand);
        Self {
            display: format_display(&core, role),
            url_safe: format_url_safe(&core, role),
            core,
            tier,
            nm2: identity.nm2,
            sig: identity.sig,
            rand,
            chk,
            role,
            status: CodeStatus::Active,
            issued_at,
            revoked_at: None,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.nm2, self.sig)
    }

    pub fn is_active(&self) -> bool {
        self.status == CodeStatus::Active
    }

    /// Mark revoked. Revoking twice keeps the first timestamp.
    pub fn revoke(&mut self, at: DateTime<Utc>) {
        if self.is_active() {
            self.status = CodeStatus::Revoked;
            self.revoked_at = Some(at);
        }
    }
}

/// Issue a code with a fresh random fragment.
pub fn issue(req: &IssueRequest) -> Result<IssuedCode, IssueError> {
    issue_with(req, random_fragment(), Utc::now())
}

/// [`issue`] with the random fragment and clock supplied by the caller.
pub fn issue_with(
    req: &IssueRequest,
    rand: RandomFragment,
    issued_at: DateTime<Utc>,
) -> Result<IssuedCode, IssueError> {
    let identity = resolve_identity(req)?;
    let code = IssuedCode::assemble(req.tier, identity, rand, req.role, issued_at);
    debug!(core = %code.core, role = %code.role, tier = %code.tier, "pmc issued");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{ValidationResult, validate};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 12, 9, 15, 30).unwrap()
    }

    fn holder_request() -> IssueRequest {
        IssueRequest::new(Tier::F50, Role::X)
            .names("Matt", "Hardage")
            .signature_inputs("19881203", "123456")
    }

    #[test]
    fn test_new_holder_derives_identity() {
        let code = issue_with(&holder_request(), "RT2K".parse().unwrap(), at()).unwrap();
        assert_eq!(code.nm2.to_string(), "MH");
        assert_eq!(code.sig.to_string(), "CGDJ");
        assert_eq!(code.core.as_str(), "F50MHCGDJRT2KQ");
        assert_eq!(code.display, "F50MHCGDJRT2K-Q-X");
        assert_eq!(code.url_safe, "F50MHCGDJRT2KQX");
        assert_eq!(code.status, CodeStatus::Active);
        assert_eq!(code.revoked_at, None);
    }

    #[test]
    fn test_issued_display_validates() {
        let code = issue(&holder_request()).unwrap();
        assert_eq!(
            validate(&code.display),
            ValidationResult::Valid {
                core: code.core.clone(),
                role: Role::X
            }
        );
    }

    #[test]
    fn test_new_holder_requires_signature_inputs() {
        let req = IssueRequest::new(Tier::F50, Role::X).names("Matt", "Hardage");
        assert_eq!(issue(&req), Err(IssueError::MissingSignatureInputs));

        let mut partial = req.clone();
        partial.date_of_birth = Some("19881203".into());
        assert_eq!(issue(&partial), Err(IssueError::MissingSignatureInputs));
    }

    #[test]
    fn test_new_holder_rejects_malformed_signature_inputs() {
        let req = IssueRequest::new(Tier::F50, Role::X)
            .names("Matt", "Hardage")
            .signature_inputs("1988123", "123456");
        assert_eq!(issue(&req), Err(IssueError::MalformedSignatureInputs));

        let dashed = IssueRequest::new(Tier::F50, Role::X)
            .names("Matt", "Hardage")
            .signature_inputs("1988-12-03", "123456");
        assert!(issue(&dashed).is_ok());
    }

    #[test]
    fn test_reissue_keeps_identity_and_draws_new_rand() {
        let first = issue_with(&holder_request(), "RT2K".parse().unwrap(), at()).unwrap();
        let req = IssueRequest::new(Tier::F50, Role::X).existing(first.identity());
        let second = issue_with(&req, "0000".parse().unwrap(), at()).unwrap();
        assert_eq!(second.identity(), first.identity());
        assert_ne!(second.core, first.core);
        assert_eq!(second.rand.to_string(), "0000");
    }

    #[test]
    fn test_existing_identity_wins_over_derivation() {
        let identity = Identity::new("A1".parse().unwrap(), "J7Q9".parse().unwrap());
        let req = holder_request().existing(identity);
        assert_eq!(resolve_identity(&req), Ok(identity));
    }

    #[test]
    fn test_authorized_user_inherits_holder_identity() {
        let holder = issue_with(&holder_request(), "RT2K".parse().unwrap(), at()).unwrap();
        let req = IssueRequest::new(Tier::F50, Role::B)
            .names("Someone", "Else")
            .holder(holder.identity());
        let code = issue(&req).unwrap();
        assert_eq!(code.identity(), holder.identity());
        assert_eq!(code.role, Role::B);
        assert!(code.display.ends_with("-B"));
    }

    #[test]
    fn test_authorized_user_without_holder_code() {
        let req = IssueRequest::new(Tier::F50, Role::A)
            .names("Someone", "Else")
            .signature_inputs("19881203", "123456");
        assert_eq!(issue(&req), Err(IssueError::HolderCodeMissing));
    }

    #[test]
    fn test_revoke() {
        let mut code = issue_with(&holder_request(), "RT2K".parse().unwrap(), at()).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        code.revoke(later);
        assert!(!code.is_active());
        assert_eq!(code.revoked_at, Some(later));
        code.revoke(at());
        assert_eq!(code.revoked_at, Some(later));
    }

    #[test]
    fn test_record_json_roundtrip() {
        let code = issue_with(&holder_request(), "RT2K".parse().unwrap(), at()).unwrap();
        let json = serde_json::to_value(&code).unwrap();
        assert_eq!(json["core"], "F50MHCGDJRT2KQ");
        assert_eq!(json["nm2"], "MH");
        assert_eq!(json["chk"], "Q");
        assert_eq!(json["status"], "active");
        assert!(json.get("revoked_at").is_none());
        let back: IssuedCode = serde_json::from_value(json).unwrap();
        assert_eq!(back, code);
    }
}
