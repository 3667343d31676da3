//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the pipeline.
//! Each identifier is a distinct type — you cannot pass a [`SubjectId`]
//! where a [`SubmissionId`] is expected.
//!
//! ## Validation
//!
//! String-based identifiers ([`IdentityCommitment`], [`ActionDomain`],
//! [`RecipientId`]) validate format at construction time. UUID-based
//! identifiers ([`SubjectId`], [`CredentialId`], [`SubmissionId`]) are
//! always valid by construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time — not silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Helper macro for UUID-backed identifier newtypes.
macro_rules! uuid_id {
    ($(#[$doc:meta])* $ty:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $ty(Uuid);

        impl $ty {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $ty {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::from_str(s).map(Self)
            }
        }
    };
}

uuid_id! {
    /// A unique identifier for a user of the pipeline (the credential subject).
    SubjectId
}

uuid_id! {
    /// A unique identifier for an issued credential.
    CredentialId
}

uuid_id! {
    /// A unique identifier for a proof-backed message submission.
    SubmissionId
}

// ---------------------------------------------------------------------------
// String-based identifiers (validated at construction)
// ---------------------------------------------------------------------------

/// An opaque, one-way-hashed representation of a verified identity.
///
/// Used as the leaf value in the membership tree and as one input to
/// nullifier derivation. Always 64 lowercase hex characters (32 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IdentityCommitment(String);

impl_validating_deserialize!(IdentityCommitment);

impl IdentityCommitment {
    /// Create an identity commitment from a hex string, validating format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.len() != 64
            || !s
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(ValidationError::InvalidIdentityCommitment(s));
        }
        Ok(Self(s))
    }

    /// Wrap raw commitment bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Access the hex string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode to raw bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        let raw = hex::decode(&self.0).expect("validated at construction");
        raw.try_into().expect("validated at construction")
    }
}

impl std::fmt::Display for IdentityCommitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The domain an action is proven against — encodes the specific
/// recipient/campaign/action so nullifiers from different actions never
/// collide.
///
/// Format: dotted lowercase tokens, e.g. `congress.hr1234.support`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ActionDomain(String);

impl_validating_deserialize!(ActionDomain);

impl ActionDomain {
    /// Create an action domain, validating format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let valid = !s.is_empty()
            && !s.starts_with('.')
            && !s.ends_with('.')
            && s.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-');
        if !valid {
            return Err(ValidationError::InvalidActionDomain(s));
        }
        Ok(Self(s))
    }

    /// Access the string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActionDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stable identifier for a delivery recipient (a congressional office
/// or other configured decision-maker endpoint).
///
/// Format: non-empty, `[a-z0-9._-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecipientId(String);

impl_validating_deserialize!(RecipientId);

impl RecipientId {
    /// Create a recipient identifier, validating format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let valid = !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-".contains(c));
        if !valid {
            return Err(ValidationError::InvalidRecipientId(s));
        }
        Ok(Self(s))
    }

    /// Access the string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecipientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_distinct() {
        assert_ne!(SubjectId::new(), SubjectId::new());
        assert_ne!(SubmissionId::new(), SubmissionId::new());
    }

    #[test]
    fn uuid_id_display_and_parse() {
        let id = CredentialId::new();
        let parsed: CredentialId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn identity_commitment_accepts_64_hex() {
        let c = IdentityCommitment::new("a".repeat(64)).unwrap();
        assert_eq!(c.as_str().len(), 64);
    }

    #[test]
    fn identity_commitment_rejects_uppercase() {
        assert!(IdentityCommitment::new("A".repeat(64)).is_err());
    }

    #[test]
    fn identity_commitment_rejects_wrong_length() {
        assert!(IdentityCommitment::new("ab".repeat(16)).is_err());
        assert!(IdentityCommitment::new("").is_err());
    }

    #[test]
    fn identity_commitment_bytes_roundtrip() {
        let bytes = [7u8; 32];
        let c = IdentityCommitment::from_bytes(&bytes);
        assert_eq!(c.to_bytes(), bytes);
    }

    #[test]
    fn action_domain_accepts_dotted_tokens() {
        let d = ActionDomain::new("congress.hr1234.support").unwrap();
        assert_eq!(d.as_str(), "congress.hr1234.support");
    }

    #[test]
    fn action_domain_rejects_empty_and_edges() {
        assert!(ActionDomain::new("").is_err());
        assert!(ActionDomain::new(".leading").is_err());
        assert!(ActionDomain::new("trailing.").is_err());
        assert!(ActionDomain::new("Upper.Case").is_err());
    }

    #[test]
    fn recipient_id_validation() {
        assert!(RecipientId::new("house.ca-12.office").is_ok());
        assert!(RecipientId::new("").is_err());
        assert!(RecipientId::new("has space").is_err());
    }

    #[test]
    fn validating_deserialize_rejects_invalid() {
        let result: Result<IdentityCommitment, _> = serde_json::from_str("\"tooshort\"");
        assert!(result.is_err());

        let result: Result<ActionDomain, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn validating_deserialize_accepts_valid() {
        let json = format!("\"{}\"", "f".repeat(64));
        let c: IdentityCommitment = serde_json::from_str(&json).unwrap();
        assert_eq!(c.as_str(), "f".repeat(64));
    }
}
