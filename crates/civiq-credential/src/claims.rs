//! # Typed Credential Claims
//!
//! Claims are a tagged sum type with exhaustive matching at verification
//! time — there is no runtime type inspection anywhere in the pipeline.

use civiq_core::{DistrictCode, IdentityCommitment, LocalDistrictCode};
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;

/// The kind of a credential, used as the client-side store key and for
/// tier derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// District residency derived from a (discarded) address.
    DistrictResidency,
    /// Document-backed identity commitment.
    Identity,
    /// Government-backed credential.
    Government,
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CredentialKind::DistrictResidency => "district_residency",
            CredentialKind::Identity => "identity",
            CredentialKind::Government => "government",
        };
        write!(f, "{s}")
    }
}

/// The document class an identity credential was verified against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// State-issued driver license.
    DriverLicense,
    /// Passport.
    Passport,
    /// State identity card.
    StateId,
}

/// Typed, validated credential claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialClaims {
    /// Residency in a congressional district plus any state/local codes.
    ///
    /// Only derived codes appear here; the raw address they came from is
    /// cleared during issuance and never reaches this type.
    DistrictResidency {
        /// Congressional district code, e.g. `CA-12`.
        congressional_district: DistrictCode,
        /// State and local district codes.
        local_districts: Vec<LocalDistrictCode>,
    },

    /// A verified identity, represented only by its one-way commitment.
    Identity {
        /// Opaque hash of the verified identity.
        identity_commitment: IdentityCommitment,
        /// Which document class was verified.
        document_type: DocumentType,
    },

    /// A government-backed claim with its issuer chain reference.
    Government {
        /// District the government credential covers.
        district: DistrictCode,
        /// Reference into the issuing authority's certificate chain.
        issuer_chain: String,
    },
}

impl CredentialClaims {
    /// The kind tag for these claims.
    pub fn kind(&self) -> CredentialKind {
        match self {
            CredentialClaims::DistrictResidency { .. } => CredentialKind::DistrictResidency,
            CredentialClaims::Identity { .. } => CredentialKind::Identity,
            CredentialClaims::Government { .. } => CredentialKind::Government,
        }
    }

    /// Type-specific structural checks beyond what the newtypes enforce.
    pub fn validate(&self) -> Result<(), CredentialError> {
        match self {
            CredentialClaims::DistrictResidency {
                local_districts, ..
            } => {
                if local_districts.len() > 16 {
                    return Err(CredentialError::Validation(format!(
                        "too many local district codes: {}",
                        local_districts.len()
                    )));
                }
            }
            CredentialClaims::Identity { .. } => {}
            CredentialClaims::Government { issuer_chain, .. } => {
                if issuer_chain.is_empty() {
                    return Err(CredentialError::Validation(
                        "government credential requires an issuer chain reference".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// The district claim carried by these claims, if any.
    pub fn district(&self) -> Option<&DistrictCode> {
        match self {
            CredentialClaims::DistrictResidency {
                congressional_district,
                ..
            } => Some(congressional_district),
            CredentialClaims::Government { district, .. } => Some(district),
            CredentialClaims::Identity { .. } => None,
        }
    }

    /// The identity commitment carried by these claims, if any.
    pub fn identity_commitment(&self) -> Option<&IdentityCommitment> {
        match self {
            CredentialClaims::Identity {
                identity_commitment,
                ..
            } => Some(identity_commitment),
            _ => None,
        }
    }
}
