//! # API Route Modules
//!
//! Route modules for the pipeline's API surface:
//!
//! - `credentials` — Issuance (including address-derived residency),
//!   verification, and revocation of signed claims.
//! - `tier` — Stateless trust-tier derivation from a presented
//!   credential set.
//! - `memberships` — Commitment registration into per-cell Merkle trees
//!   and inclusion-path retrieval.
//! - `submissions` — Sealed-envelope intake, processing, retry, and the
//!   witness public key clients seal to.

pub mod credentials;
pub mod memberships;
pub mod submissions;
pub mod tier;
