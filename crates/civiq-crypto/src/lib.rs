//! # civiq-crypto — Cryptographic Primitives for the Civiq Pipeline
//!
//! This crate provides the cryptographic building blocks used throughout
//! the workspace:
//!
//! - **Ed25519** signing and verification for verifiable credentials.
//!   Signing accepts only [`CanonicalBytes`](civiq_core::CanonicalBytes),
//!   enforcing canonicalization at the type level.
//! - **Nullifier derivation** — the deterministic, one-way value computed
//!   from an identity commitment and an action domain that makes duplicate
//!   proof submissions detectable without revealing identity.
//! - **Sealed-box witness cipher** — X25519 ephemeral Diffie–Hellman,
//!   BLAKE2b key derivation, and XChaCha20-Poly1305 authenticated
//!   encryption. Proof payloads are confidential end to end; transport
//!   security is never relied on.
//! - **Key-holder abstraction** — the decrypting party sits behind
//!   [`WitnessKeyHolder`], so a plain software service and a
//!   hardware-isolated holder are interchangeable without touching the
//!   wire format.

pub mod ed25519;
pub mod error;
pub mod holder;
pub mod nullifier;
pub mod sealed;

// Re-export primary types.
pub use ed25519::{Ed25519Signature, SigningKey, VerifyingKey};
pub use error::CryptoError;
pub use holder::{SoftwareKeyHolder, WitnessKeyHolder};
pub use nullifier::{derive_nullifier, Nullifier};
pub use sealed::{open, seal, RecipientKeyPair, RecipientPublicKey, RecipientSecretKey, SealedEnvelope};
