//! Membership and proving errors.

use civiq_crypto::Nullifier;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MembershipError {
    /// The registration has no confirmed tree inclusion yet.
    #[error("registration has no confirmed tree inclusion")]
    IncompleteRegistration,

    /// A structural check on prover input failed.
    #[error("invalid prover input: {0}")]
    Validation(String),

    /// The external proving engine failed.
    #[error("proof generation failed: {0}")]
    ProofGeneration(String),

    /// The nullifier in the returned proof does not match the value
    /// derived before the engine call. The proof is discarded; nothing
    /// downstream ever sees it.
    #[error("proof nullifier does not match independently derived nullifier")]
    NullifierMismatch,

    /// The `(identity, action)` pair has already been used. Terminal;
    /// never retried.
    #[error("nullifier already recorded: {nullifier}")]
    NullifierCollision { nullifier: Nullifier },
}
