//! # Credential Issuer
//!
//! Issues, verifies, and revokes credentials. Stateless apart from the
//! signing key and the revocation ledger.
//!
//! ## Layered TTL
//!
//! Every credential has a base validity window set at issuance. Specific
//! downstream actions impose a *tighter* freshness requirement through
//! [`ActionClass`]: [`CredentialIssuer::is_valid_for_action`] checks both
//! the base window and `now - issued_at <= freshness_window`, and must be
//! re-evaluated at point of use — never cached past the freshness window.
//!
//! ## Address non-retention
//!
//! [`CredentialIssuer::issue_residency_from_address`] consumes the raw
//! address **by value** as a [`RawAddress`] whose backing string is
//! zeroized on drop. The address exists only for the duration of the
//! resolver call; on every path — success or error — it is gone before
//! the function returns, so there is no partial-failure state in which a
//! credential persists alongside a retained address.

use chrono::{DateTime, Duration, Utc};
use civiq_core::{CredentialId, LocalDistrictCode, SubjectId};
use civiq_crypto::{Ed25519Signature, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

use crate::claims::{CredentialClaims, DocumentType};
use crate::credential::Credential;
use crate::error::CredentialError;
use crate::ledger::RevocationLedger;
use crate::provider::DocumentVerifier;
use crate::resolver::DistrictResolver;

/// A raw postal address on its way to district resolution.
///
/// The backing string is zeroized when this value drops. It cannot be
/// cloned, and the only consumer takes it by value.
pub struct RawAddress(Zeroizing<String>);

impl RawAddress {
    /// Wrap an address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(Zeroizing::new(address.into()))
    }

    fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for RawAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The address never appears in debug output or logs.
        f.write_str("RawAddress(..)")
    }
}

/// A downstream action's freshness requirement, layered on top of the
/// credential's base validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionClass {
    /// Action class name, for logs and policy tables.
    pub name: String,
    /// Maximum age of the credential (`now - issued_at`) for this action.
    pub freshness_window: Duration,
}

impl ActionClass {
    /// An action class with an explicit freshness window.
    pub fn new(name: impl Into<String>, freshness_window: Duration) -> Self {
        Self {
            name: name.into(),
            freshness_window,
        }
    }

    /// Standard actions accept any credential inside its base window.
    pub fn standard() -> Self {
        Self::new("standard", Duration::days(90))
    }

    /// High-stakes actions require issuance within the last 30 days.
    pub fn high_stakes() -> Self {
        Self::new("high_stakes", Duration::days(30))
    }
}

/// The outcome of verifying a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Signature, integrity hash, expiry, and revocation all pass.
    Verified,
    /// The base validity window has passed.
    Expired,
    /// The integrity hash or signature does not match the body. The
    /// reason distinguishes "corrupted in transit" from "never validly
    /// signed".
    Tampered {
        /// Which check failed.
        reason: &'static str,
    },
    /// The credential appears in the revocation ledger.
    Revoked,
}

impl VerificationStatus {
    /// Whether the credential is currently usable.
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationStatus::Verified)
    }
}

/// Issues and verifies credentials.
pub struct CredentialIssuer {
    issuer_id: String,
    signing_key: SigningKey,
    ledger: RevocationLedger,
}

impl CredentialIssuer {
    /// Create an issuer with the given identity and signing key.
    pub fn new(issuer_id: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            issuer_id: issuer_id.into(),
            signing_key,
            ledger: RevocationLedger::new(),
        }
    }

    /// The issuer's verifying key, for out-of-process verification.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// The revocation ledger.
    pub fn ledger(&self) -> &RevocationLedger {
        &self.ledger
    }

    /// Issue a credential over validated claims.
    ///
    /// Rejects claims that fail type-specific structural checks, sets
    /// `expires_at = now + ttl`, computes the integrity hash, and signs
    /// the canonical body.
    pub fn issue(
        &self,
        subject: SubjectId,
        claims: CredentialClaims,
        ttl: Duration,
    ) -> Result<Credential, CredentialError> {
        claims.validate()?;
        if ttl <= Duration::zero() {
            return Err(CredentialError::Validation(format!(
                "ttl must be positive, got {ttl}"
            )));
        }

        let now = Utc::now();
        let mut credential = Credential {
            id: CredentialId::new(),
            issuer: self.issuer_id.clone(),
            subject,
            issued_at: now,
            expires_at: now + ttl,
            integrity_hash: Credential::compute_integrity_hash(&claims)?,
            claims,
            signature: None,
        };

        let canonical = credential.signing_input()?;
        credential.signature = Some(self.signing_key.sign(&canonical).to_hex());

        tracing::debug!(
            credential_id = %credential.id,
            kind = %credential.kind(),
            subject = %credential.subject,
            "credential issued"
        );
        Ok(credential)
    }

    /// Issue a district-residency credential from a raw address.
    ///
    /// The address is consumed by value and zeroized on every path; only
    /// the derived district code and the credential hash persist beyond
    /// this call.
    pub fn issue_residency_from_address(
        &self,
        subject: SubjectId,
        address: RawAddress,
        local_districts: Vec<LocalDistrictCode>,
        resolver: &dyn DistrictResolver,
        ttl: Duration,
    ) -> Result<Credential, CredentialError> {
        let congressional_district = resolver.resolve_district(address.as_str())?;
        // The address has served its purpose; zeroize before issuance.
        drop(address);

        self.issue(
            subject,
            CredentialClaims::DistrictResidency {
                congressional_district,
                local_districts,
            },
            ttl,
        )
    }

    /// Issue an identity credential from a verified document.
    ///
    /// The provider is an opaque oracle; only the commitment it answers
    /// with enters the credential. The document bytes are borrowed for
    /// the verification call and never stored.
    pub fn issue_identity_from_document(
        &self,
        subject: SubjectId,
        document_type: DocumentType,
        document: &[u8],
        verifier: &dyn DocumentVerifier,
        ttl: Duration,
    ) -> Result<Credential, CredentialError> {
        let identity_commitment = verifier.verify_document(document_type, document)?;

        self.issue(
            subject,
            CredentialClaims::Identity {
                identity_commitment,
                document_type,
            },
            ttl,
        )
    }

    /// Verify a credential: integrity hash, signature, revocation ledger,
    /// and expiry, in that order.
    pub fn verify(&self, credential: &Credential) -> VerificationStatus {
        self.verify_at(credential, Utc::now())
    }

    /// Verify against an explicit clock (testing and replay).
    pub fn verify_at(&self, credential: &Credential, now: DateTime<Utc>) -> VerificationStatus {
        // Integrity hash first: a mismatch means the body was corrupted
        // after issuance, which is a different statement than "the
        // signature never matched".
        match Credential::compute_integrity_hash(&credential.claims) {
            Ok(hash) if hash == credential.integrity_hash => {}
            _ => {
                return VerificationStatus::Tampered {
                    reason: "integrity hash mismatch",
                }
            }
        }

        let Some(signature_hex) = &credential.signature else {
            return VerificationStatus::Tampered {
                reason: "signature missing",
            };
        };
        let verified = Ed25519Signature::from_hex(signature_hex)
            .ok()
            .and_then(|sig| {
                let canonical = credential.signing_input().ok()?;
                self.verifying_key().verify(&canonical, &sig).ok()
            });
        if verified.is_none() {
            return VerificationStatus::Tampered {
                reason: "signature invalid",
            };
        }

        if self.ledger.is_revoked(&credential.id) {
            return VerificationStatus::Revoked;
        }

        if credential.is_expired_at(now) {
            return VerificationStatus::Expired;
        }

        VerificationStatus::Verified
    }

    /// Revoke a credential. Idempotent; permanent; no key rotation.
    pub fn revoke(&self, credential_id: CredentialId) {
        self.ledger.revoke(credential_id);
    }

    /// Layered TTL check: base validity AND the action class's tighter
    /// freshness window. Re-evaluate at point of use; never cache the
    /// result past the freshness window.
    pub fn is_valid_for_action(&self, credential: &Credential, action: &ActionClass) -> bool {
        self.is_valid_for_action_at(credential, action, Utc::now())
    }

    /// Layered TTL check against an explicit clock.
    pub fn is_valid_for_action_at(
        &self,
        credential: &Credential,
        action: &ActionClass,
        now: DateTime<Utc>,
    ) -> bool {
        self.verify_at(credential, now).is_verified()
            && now - credential.issued_at <= action.freshness_window
    }
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("issuer_id", &self.issuer_id)
            .field("revoked", &self.ledger.len())
            .finish_non_exhaustive()
    }
}
