//! # civiq-core — Foundational Types for the Civiq Pipeline
//!
//! This crate provides the shared building blocks used throughout the
//! workspace:
//!
//! - **Domain-primitive newtypes** for identifiers ([`SubjectId`],
//!   [`CredentialId`], [`SubmissionId`], [`RecipientId`],
//!   [`IdentityCommitment`], [`ActionDomain`]) — each identifier is a
//!   distinct type and string-based variants validate at construction.
//! - **District codes** ([`DistrictCode`], [`LocalDistrictCode`]) for
//!   congressional and state/local jurisdictions.
//! - **Canonical serialization** ([`CanonicalBytes`]) — deterministic
//!   JSON bytes with sorted keys and floats rejected. Everything that is
//!   signed or digested in this workspace goes through this type.
//! - **Content digests** ([`ContentDigest`], [`sha256_digest`],
//!   [`Sha256Accumulator`]).
//! - **Validation errors** ([`ValidationError`]).

pub mod canonical;
pub mod digest;
pub mod district;
pub mod error;
pub mod identity;

// Re-export primary types.
pub use canonical::{CanonicalBytes, CanonicalizationError};
pub use digest::{sha256_digest, ContentDigest, Sha256Accumulator};
pub use district::{DistrictCode, LocalDistrictCode};
pub use error::ValidationError;
pub use identity::{
    ActionDomain, CredentialId, IdentityCommitment, RecipientId, SubjectId, SubmissionId,
};
