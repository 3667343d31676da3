//! Trust tier levels and the derivation function.

use chrono::{DateTime, Utc};
use civiq_credential::{Credential, CredentialKind};
use serde::{Deserialize, Serialize};

/// The five trust tiers, ordered by the strength of verification backing
/// them. Tiers are additive: holding tier `n` means the requirements of
/// every tier below `n` are also currently satisfied, and no credential
/// is "spent" to climb.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TrustTier {
    /// No credential at all.
    #[default]
    Anonymous = 0,
    /// A device-bound passkey exists.
    DeviceBound = 1,
    /// A valid district-residency credential.
    DistrictVerified = 2,
    /// A valid identity credential plus confirmed membership-tree
    /// inclusion.
    MemberVerified = 3,
    /// A valid government-backed credential.
    GovernmentVerified = 4,
}

impl TrustTier {
    /// Numeric level, 0 through 4.
    pub fn as_level(self) -> u8 {
        self as u8
    }

    /// Parse a numeric level.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Anonymous),
            1 => Some(Self::DeviceBound),
            2 => Some(Self::DistrictVerified),
            3 => Some(Self::MemberVerified),
            4 => Some(Self::GovernmentVerified),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrustTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Anonymous => "anonymous",
            Self::DeviceBound => "device_bound",
            Self::DistrictVerified => "district_verified",
            Self::MemberVerified => "member_verified",
            Self::GovernmentVerified => "government_verified",
        };
        f.write_str(name)
    }
}

/// Everything tier derivation looks at. Assembled by the caller at
/// session establishment; the credentials here should already have
/// passed signature and revocation checks upstream, while expiry is
/// re-checked against the derivation clock.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet<'a> {
    /// A device-bound passkey is registered.
    pub has_device_key: bool,
    /// Credentials the holder presents. Expired ones are ignored.
    pub credentials: &'a [Credential],
    /// Membership-tree inclusion has been confirmed for the holder's
    /// identity commitment.
    pub membership_confirmed: bool,
}

impl<'a> CredentialSet<'a> {
    fn holds(&self, kind: CredentialKind, now: DateTime<Utc>) -> bool {
        self.credentials
            .iter()
            .any(|c| c.kind() == kind && !c.is_expired_at(now))
    }
}

/// Derive the live trust tier from the credential set.
///
/// Pure: same inputs, same tier. The result is the highest tier whose
/// requirement and every lower tier's requirement hold right now, so a
/// revoked or expired credential drops the holder to the next tier the
/// remaining credentials satisfy, not to zero. This reports the *live*
/// tier only; any "peak tier achieved" stickiness is product policy
/// recorded elsewhere, never conflated with this value.
pub fn derive_tier(set: &CredentialSet<'_>) -> TrustTier {
    derive_tier_at(set, Utc::now())
}

/// Tier derivation against an explicit clock.
pub fn derive_tier_at(set: &CredentialSet<'_>, now: DateTime<Utc>) -> TrustTier {
    let satisfied = [
        set.has_device_key,
        set.holds(CredentialKind::DistrictResidency, now),
        set.holds(CredentialKind::Identity, now) && set.membership_confirmed,
        set.holds(CredentialKind::Government, now),
    ];

    let mut tier = TrustTier::Anonymous;
    for (i, ok) in satisfied.iter().enumerate() {
        if !ok {
            break;
        }
        // i + 1 is in range by construction.
        tier = TrustTier::from_level(i as u8 + 1).unwrap_or(tier);
    }
    tier
}
