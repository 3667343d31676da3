//! # Nullifier Derivation
//!
//! A nullifier is a deterministic, one-way value derived from
//! `(identity_commitment, action_domain)`. Once identity is hidden behind
//! a membership proof, the nullifier is the only Sybil-resistance
//! mechanism: two submissions for the same identity and action produce the
//! same nullifier and the second is rejected.
//!
//! Derivation is BLAKE2b-512 with a fixed domain-separation tag, truncated
//! to 32 bytes. A length-prefixed separator byte sits between the
//! commitment and the action domain so no two input pairs can produce the
//! same hash input.

use blake2::{Blake2b512, Digest};
use civiq_core::{ActionDomain, IdentityCommitment};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Domain-separation tag for nullifier derivation. Changing this value
/// invalidates every recorded nullifier; it is part of the wire protocol.
const NULLIFIER_DOMAIN_TAG: &[u8] = b"civiq.nullifier.v1";

/// A 32-byte nullifier, hex-encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nullifier([u8; 32]);

impl Nullifier {
    /// Wrap raw nullifier bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let raw = hex::decode(s)?;
        let arr: [u8; 32] = raw
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }

    /// Hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Constant-time equality, for comparisons on untrusted input
    /// (proof cross-validation).
    pub fn ct_eq(&self, other: &Nullifier) -> bool {
        bool::from(self.0.ct_eq(&other.0))
    }
}

impl std::fmt::Display for Nullifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Nullifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Nullifier {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Derive the nullifier for an `(identity_commitment, action_domain)` pair.
///
/// Deterministic and one-way. The inputs are length-prefixed so that
/// distinct pairs can never collide on the same hash input.
pub fn derive_nullifier(commitment: &IdentityCommitment, domain: &ActionDomain) -> Nullifier {
    let mut hasher = Blake2b512::new();
    hasher.update(NULLIFIER_DOMAIN_TAG);
    let commitment_bytes = commitment.to_bytes();
    hasher.update((commitment_bytes.len() as u64).to_be_bytes());
    hasher.update(commitment_bytes);
    hasher.update((domain.as_str().len() as u64).to_be_bytes());
    hasher.update(domain.as_str().as_bytes());

    let wide = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&wide[..32]);
    Nullifier(out)
}
