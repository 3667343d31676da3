//! # civiq-tier
//!
//! Graduated trust tiers derived from the set of currently valid
//! credentials a user holds. Derivation is a pure function over that
//! set: it is recomputed at every session establishment and never
//! cached indefinitely, so expiry and revocation are reflected promptly.

pub mod profile;
pub mod tier;

pub use profile::{DistrictVerificationMethod, Identity};
pub use tier::{derive_tier, derive_tier_at, CredentialSet, TrustTier};
