//! # Credential Envelope
//!
//! The signed, typed, expiring envelope around [`CredentialClaims`].
//!
//! ## Security Invariants
//!
//! - The signing input is the canonical bytes of the credential body with
//!   the `signature` field removed, via [`CanonicalBytes`] — never raw
//!   `serde_json::to_vec()`.
//! - The integrity hash covers the canonical claims and is stored in the
//!   envelope, letting verification distinguish "corrupted in transit"
//!   (hash mismatch) from "never validly signed".

use chrono::{DateTime, Utc};
use civiq_core::{sha256_digest, CanonicalBytes, ContentDigest, CredentialId, SubjectId};
use serde::{Deserialize, Serialize};

use crate::claims::{CredentialClaims, CredentialKind};
use crate::error::CredentialError;

/// A signed, typed, expiring claim about a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Credential identifier.
    pub id: CredentialId,

    /// Identifier of the issuing authority.
    pub issuer: String,

    /// The subject the claims are about.
    pub subject: SubjectId,

    /// When the credential was issued (UTC).
    pub issued_at: DateTime<Utc>,

    /// When the base validity window ends (UTC).
    pub expires_at: DateTime<Utc>,

    /// The typed claims.
    pub claims: CredentialClaims,

    /// SHA-256 digest of the canonical claims.
    pub integrity_hash: ContentDigest,

    /// Hex-encoded Ed25519 signature over the canonical body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Credential {
    /// The kind tag of the enclosed claims.
    pub fn kind(&self) -> CredentialKind {
        self.claims.kind()
    }

    /// Whether the base validity window has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Compute the canonical signing input: the credential body with the
    /// `signature` field removed.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CredentialError> {
        let mut val = serde_json::to_value(self)?;
        if let Some(obj) = val.as_object_mut() {
            obj.remove("signature");
        }
        Ok(CanonicalBytes::from_value(val)?)
    }

    /// Compute the integrity hash over the canonical claims.
    pub fn compute_integrity_hash(claims: &CredentialClaims) -> Result<ContentDigest, CredentialError> {
        let canonical = CanonicalBytes::new(claims)?;
        Ok(sha256_digest(&canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::DocumentType;
    use civiq_core::{DistrictCode, IdentityCommitment};

    fn make_credential() -> Credential {
        let claims = CredentialClaims::Identity {
            identity_commitment: IdentityCommitment::new("b".repeat(64)).unwrap(),
            document_type: DocumentType::StateId,
        };
        Credential {
            id: CredentialId::new(),
            issuer: "civiq.issuer.test".to_string(),
            subject: SubjectId::new(),
            issued_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::days(90),
            integrity_hash: Credential::compute_integrity_hash(&claims).unwrap(),
            claims,
            signature: None,
        }
    }

    #[test]
    fn signing_input_excludes_signature() {
        let mut cred = make_credential();
        let before = cred.signing_input().unwrap();
        cred.signature = Some("00".repeat(64));
        let after = cred.signing_input().unwrap();
        assert_eq!(before.as_bytes(), after.as_bytes());
    }

    #[test]
    fn signing_input_is_deterministic() {
        let cred = make_credential();
        assert_eq!(
            cred.signing_input().unwrap().as_bytes(),
            cred.signing_input().unwrap().as_bytes()
        );
    }

    #[test]
    fn integrity_hash_changes_with_claims() {
        let h1 = Credential::compute_integrity_hash(&CredentialClaims::DistrictResidency {
            congressional_district: DistrictCode::new("CA-12").unwrap(),
            local_districts: vec![],
        })
        .unwrap();
        let h2 = Credential::compute_integrity_hash(&CredentialClaims::DistrictResidency {
            congressional_district: DistrictCode::new("CA-13").unwrap(),
            local_districts: vec![],
        })
        .unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn expiry_check() {
        let cred = make_credential();
        assert!(!cred.is_expired_at(Utc::now()));
        assert!(cred.is_expired_at(Utc::now() + chrono::Duration::days(91)));
    }

    #[test]
    fn serde_roundtrip() {
        let cred = make_credential();
        let json = serde_json::to_string(&cred).unwrap();
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(cred, back);
    }
}
