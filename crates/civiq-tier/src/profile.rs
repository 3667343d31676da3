//! Per-user identity profile.

use chrono::{DateTime, Utc};
use civiq_core::{IdentityCommitment, SubjectId};
use serde::{Deserialize, Serialize};

use crate::tier::TrustTier;

/// How the holder's district claim was verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistrictVerificationMethod {
    /// No district verification yet.
    #[default]
    None,
    /// Address resolved through a civic information API.
    CivicApi,
    /// Postal confirmation loop.
    Postal,
    /// Backed by a government-issued credential.
    GovernmentCredential,
}

/// One profile per user. `trust_tier` mirrors the last derivation and
/// is refreshed at each session establishment; the commitment and
/// passkey fields appear once the corresponding credential exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: SubjectId,
    pub trust_tier: TrustTier,
    /// Present only once a document-backed credential exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_commitment: Option<IdentityCommitment>,
    /// Hex-encoded device passkey public key, if registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passkey_public_key: Option<String>,
    pub district_verification_method: DistrictVerificationMethod,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// A fresh anonymous profile.
    pub fn new(subject: SubjectId) -> Self {
        Self {
            subject,
            trust_tier: TrustTier::Anonymous,
            identity_commitment: None,
            passkey_public_key: None,
            district_verification_method: DistrictVerificationMethod::None,
            updated_at: Utc::now(),
        }
    }

    /// Record a freshly derived tier.
    pub fn refresh_tier(&mut self, tier: TrustTier) {
        if tier != self.trust_tier {
            tracing::info!(
                subject = %self.subject,
                from = %self.trust_tier,
                to = %tier,
                "trust tier changed"
            );
        }
        self.trust_tier = tier;
        self.updated_at = Utc::now();
    }
}
