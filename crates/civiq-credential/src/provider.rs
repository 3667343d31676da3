//! # Document Identity Verification
//!
//! The document verification provider behind a trait: an opaque oracle
//! that inspects an identity document and answers with a one-way
//! commitment. The document bytes are borrowed for the call only and
//! never retained; only the commitment enters a credential.

use civiq_core::IdentityCommitment;
use thiserror::Error;

use crate::claims::DocumentType;

/// Errors from document verification.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider could not be reached.
    #[error("verification provider unavailable: {0}")]
    Unavailable(String),

    /// The provider examined the document and declined it.
    #[error("document rejected: {0}")]
    Rejected(String),
}

/// Verifies an identity document and derives its commitment.
///
/// Implementations must not retain the document; the commitment is the
/// only output that persists.
pub trait DocumentVerifier: Send + Sync {
    /// Verify a document and return the identity commitment.
    fn verify_document(
        &self,
        document_type: DocumentType,
        document: &[u8],
    ) -> Result<IdentityCommitment, ProviderError>;
}

/// Deterministic commitment provider for tests and development: hashes
/// the document bytes. Performs no actual document inspection.
#[derive(Debug, Clone, Default)]
pub struct MockDocumentVerifier;

impl DocumentVerifier for MockDocumentVerifier {
    fn verify_document(
        &self,
        _document_type: DocumentType,
        document: &[u8],
    ) -> Result<IdentityCommitment, ProviderError> {
        if document.is_empty() {
            return Err(ProviderError::Rejected("empty document".to_string()));
        }
        let mut acc = civiq_core::Sha256Accumulator::new();
        acc.update(document);
        IdentityCommitment::new(acc.finalize_hex())
            .map_err(|e| ProviderError::Rejected(e.to_string()))
    }
}
