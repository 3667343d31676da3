//! # Cryptographic Error Types
//!
//! Structured errors for all cryptographic operations in `civiq-crypto`.
//! Uses `thiserror` for ergonomic error definitions with diagnostic context.

use thiserror::Error;

/// Errors from cryptographic operations in the Civiq pipeline.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),

    /// Invalid Ed25519 signature length.
    #[error("invalid Ed25519 signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// Invalid public key bytes.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(String),

    /// Sealed-box encryption failed.
    #[error("seal failed: {0}")]
    SealFailed(String),

    /// Authenticated decryption failed.
    ///
    /// Deliberately generic: tag mismatch, truncated ciphertext, and a
    /// wrong key all produce this same error, and no partial plaintext
    /// is ever returned.
    #[error("authentication failure: payload could not be opened")]
    AuthenticationFailure,
}
