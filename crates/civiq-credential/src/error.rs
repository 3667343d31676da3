//! Credential error types.

use thiserror::Error;

/// Errors from credential issuance and policy evaluation.
///
/// Verification outcomes are not errors — they are reported through
/// [`VerificationStatus`](crate::issuer::VerificationStatus), because an
/// expired or revoked credential is an expected state, not a fault.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Claims failed type-specific structural checks. Surfaced
    /// immediately, never retried automatically.
    #[error("validation error: {0}")]
    Validation(String),

    /// Canonicalization of the credential body failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] civiq_core::CanonicalizationError),

    /// A cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] civiq_crypto::CryptoError),

    /// The district resolver could not produce a district for an address.
    #[error("district resolution failed: {0}")]
    Resolver(#[from] crate::resolver::ResolverError),

    /// The document verification provider declined or was unreachable.
    #[error("document verification failed: {0}")]
    Provider(#[from] crate::provider::ProviderError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<civiq_core::ValidationError> for CredentialError {
    fn from(err: civiq_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
