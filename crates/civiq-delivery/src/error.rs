//! Delivery errors.

use civiq_core::SubmissionId;
use thiserror::Error;

use crate::submission::DeliveryStatus;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("submission not found: {0}")]
    NotFound(SubmissionId),

    /// The requested action is not legal from the submission's current
    /// status.
    #[error("cannot {action} submission in state {from}")]
    InvalidState {
        from: DeliveryStatus,
        action: &'static str,
    },

    /// The sealed envelope failed to authenticate. Terminal; the
    /// payload is discarded.
    #[error("envelope authentication failed")]
    Authentication,

    /// The submission's nullifier was already recorded. Terminal and
    /// never retried.
    #[error("nullifier already recorded for this identity and action")]
    NullifierCollision,

    /// The decrypted payload is not a valid delivery payload.
    #[error("invalid delivery payload: {0}")]
    Payload(String),
}
