//! Submission and attempt records.

use chrono::{DateTime, Utc};
use civiq_core::{RecipientId, SubmissionId};
use civiq_crypto::SealedEnvelope;
use serde::{Deserialize, Serialize};

/// Submission lifecycle. `Processing` is entered exactly once;
/// `Delivered` and `Partial` are final; `Failed` may return to `Pending`
/// through an explicit conditional retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Processing,
    Delivered,
    Partial,
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Delivered => "delivered",
            Self::Partial => "partial",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of one recipient's delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Pending,
    Succeeded,
    Failed,
}

/// Why a submission was terminally rejected before fan-out. A marked
/// submission never re-enters the retry path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityRejection {
    /// The envelope failed authentication.
    Authentication,
    /// The nullifier was already recorded.
    NullifierCollision,
}

/// Classification of a failed delivery attempt. `Unreachable` failures
/// are retryable; `Rejected` ones are only recoverable via a new
/// submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryErrorClass {
    Unreachable,
    Rejected,
}

/// One per (submission, recipient). Updated independently of siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub recipient: RecipientId,
    pub attempt_count: u32,
    /// Error class of the most recent failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<DeliveryErrorClass>,
    pub outcome: AttemptOutcome,
}

impl DeliveryAttempt {
    pub fn new(recipient: RecipientId) -> Self {
        Self {
            recipient,
            attempt_count: 0,
            last_error: None,
            outcome: AttemptOutcome::Pending,
        }
    }
}

/// A user's proof-backed message instance. Mutated only by the
/// coordinator; never deleted, only marked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub envelope: SealedEnvelope,
    pub attempts: Vec<DeliveryAttempt>,
    pub status: DeliveryStatus,
    pub idempotency_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_rejection: Option<SecurityRejection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(
        envelope: SealedEnvelope,
        recipients: Vec<RecipientId>,
        idempotency_key: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SubmissionId::new(),
            envelope,
            attempts: recipients.into_iter().map(DeliveryAttempt::new).collect(),
            status: DeliveryStatus::Pending,
            idempotency_key,
            security_rejection: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn recipients(&self) -> impl Iterator<Item = &RecipientId> {
        self.attempts.iter().map(|a| &a.recipient)
    }

    /// Aggregate status from attempt outcomes; all-succeed gives
    /// `Delivered`, a mix gives `Partial`, none gives `Failed`.
    pub fn aggregate_outcome(&self) -> DeliveryStatus {
        let succeeded = self
            .attempts
            .iter()
            .filter(|a| a.outcome == AttemptOutcome::Succeeded)
            .count();
        if succeeded == self.attempts.len() {
            DeliveryStatus::Delivered
        } else if succeeded > 0 {
            DeliveryStatus::Partial
        } else {
            DeliveryStatus::Failed
        }
    }
}
