//! Delivery coordination.
//!
//! The coordinator owns submission records and drives them through the
//! lifecycle. `submit` only writes the record; `process` is the worker
//! entry point that opens the envelope, records the nullifier, and fans
//! out per-recipient deliveries on independent tasks. No map lock is
//! ever held across a suspension point: state is read and written in
//! short critical sections before and after the fan-out.

use std::sync::Arc;

use civiq_core::{DistrictCode, RecipientId, SubmissionId};
use civiq_crypto::{Nullifier, SealedEnvelope, WitnessKeyHolder};
use civiq_membership::{MembershipError, NullifierRegistry};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::error::DeliveryError;
use crate::submission::{
    AttemptOutcome, DeliveryStatus, SecurityRejection, Submission,
};
use crate::transport::DeliveryTransport;

/// The decrypted witness payload: everything a recipient's intake needs.
/// This plaintext exists only inside `process`, between envelope opening
/// and delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    #[serde(with = "proof_hex")]
    pub proof_bytes: Vec<u8>,
    pub nullifier: Nullifier,
    pub district: DistrictCode,
    pub subject: String,
    pub body: String,
}

impl DeliveryPayload {
    /// Serialize for sealing into an envelope.
    pub fn encode(&self) -> Result<Vec<u8>, DeliveryError> {
        serde_json::to_vec(self).map_err(|e| DeliveryError::Payload(e.to_string()))
    }

    /// Parse an opened envelope's plaintext.
    pub fn decode(bytes: &[u8]) -> Result<Self, DeliveryError> {
        serde_json::from_slice(bytes).map_err(|e| DeliveryError::Payload(e.to_string()))
    }
}

mod proof_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Drives submissions from `Pending` to a terminal status.
pub struct DeliveryCoordinator {
    submissions: DashMap<SubmissionId, Submission>,
    idempotency: DashMap<String, SubmissionId>,
    key_holder: Arc<dyn WitnessKeyHolder>,
    transport: Arc<dyn DeliveryTransport>,
    nullifiers: Arc<NullifierRegistry>,
}

impl DeliveryCoordinator {
    pub fn new(
        key_holder: Arc<dyn WitnessKeyHolder>,
        transport: Arc<dyn DeliveryTransport>,
        nullifiers: Arc<NullifierRegistry>,
    ) -> Self {
        Self {
            submissions: DashMap::new(),
            idempotency: DashMap::new(),
            key_holder,
            transport,
            nullifiers,
        }
    }

    /// Create a submission with per-recipient pending attempts and
    /// return immediately; processing happens asynchronously. A repeated
    /// idempotency key returns the existing submission unchanged.
    pub fn submit(
        &self,
        envelope: SealedEnvelope,
        recipients: Vec<RecipientId>,
        idempotency_key: String,
    ) -> Result<Submission, DeliveryError> {
        if recipients.is_empty() {
            return Err(DeliveryError::Payload(
                "submission requires at least one recipient".to_string(),
            ));
        }

        match self.idempotency.entry(idempotency_key.clone()) {
            Entry::Occupied(existing) => {
                let id = *existing.get();
                tracing::debug!(submission = %id, "idempotent resubmission, returning existing");
                self.submissions
                    .get(&id)
                    .map(|s| s.clone())
                    .ok_or(DeliveryError::NotFound(id))
            }
            Entry::Vacant(slot) => {
                let submission = Submission::new(envelope, recipients, idempotency_key);
                slot.insert(submission.id);
                self.submissions.insert(submission.id, submission.clone());
                tracing::info!(
                    submission = %submission.id,
                    recipients = submission.attempts.len(),
                    "submission created"
                );
                Ok(submission)
            }
        }
    }

    /// Insert a submission record directly (hydration from storage).
    pub fn insert(&self, submission: Submission) {
        self.idempotency
            .insert(submission.idempotency_key.clone(), submission.id);
        self.submissions.insert(submission.id, submission);
    }

    pub fn get(&self, id: &SubmissionId) -> Option<Submission> {
        self.submissions.get(id).map(|s| s.clone())
    }

    pub fn list(&self) -> Vec<Submission> {
        self.submissions.iter().map(|s| s.clone()).collect()
    }

    /// Process a pending submission to a terminal status.
    ///
    /// Enters `Processing` through a conditional transition that only
    /// one caller can win. Envelope authentication failure and nullifier
    /// collision are terminal and marked so retry can refuse them.
    pub async fn process(&self, id: SubmissionId) -> Result<Submission, DeliveryError> {
        // CAS Pending -> Processing, cloning what the fan-out needs so
        // the map guard drops before any await.
        let (envelope, pending_recipients) = {
            let mut entry = self
                .submissions
                .get_mut(&id)
                .ok_or(DeliveryError::NotFound(id))?;
            let submission = entry.value_mut();
            if submission.status != DeliveryStatus::Pending {
                return Err(DeliveryError::InvalidState {
                    from: submission.status,
                    action: "process",
                });
            }
            submission.status = DeliveryStatus::Processing;
            submission.updated_at = chrono::Utc::now();

            let pending: Vec<RecipientId> = submission
                .attempts
                .iter()
                .filter(|a| a.outcome != AttemptOutcome::Succeeded)
                .map(|a| a.recipient.clone())
                .collect();
            (submission.envelope.clone(), pending)
        };

        let payload = match self.open_payload(&envelope) {
            Ok(payload) => payload,
            Err(DeliveryError::Authentication) => {
                return Err(self.mark_rejected(id, SecurityRejection::Authentication));
            }
            Err(other) => {
                // A malformed payload is a plain failure, retryable in
                // principle, not a security rejection.
                if let Some(mut entry) = self.submissions.get_mut(&id) {
                    let submission = entry.value_mut();
                    submission.status = DeliveryStatus::Failed;
                    submission.updated_at = chrono::Utc::now();
                }
                return Err(other);
            }
        };

        if let Err(error) = self.record_nullifier(id, payload.nullifier) {
            return Err(error);
        }

        let results = self.fan_out(Arc::new(payload), pending_recipients).await;

        // Short write section: fold the per-recipient results back in
        // and aggregate.
        let mut entry = self
            .submissions
            .get_mut(&id)
            .ok_or(DeliveryError::NotFound(id))?;
        let submission = entry.value_mut();
        for (recipient, result) in results {
            if let Some(attempt) = submission
                .attempts
                .iter_mut()
                .find(|a| a.recipient == recipient)
            {
                attempt.attempt_count += 1;
                match result {
                    Ok(()) => {
                        attempt.outcome = AttemptOutcome::Succeeded;
                        attempt.last_error = None;
                    }
                    Err(class) => {
                        attempt.outcome = AttemptOutcome::Failed;
                        attempt.last_error = Some(class);
                    }
                }
            }
        }
        submission.status = submission.aggregate_outcome();
        submission.updated_at = chrono::Utc::now();
        tracing::info!(
            submission = %id,
            status = %submission.status,
            "submission processed"
        );
        Ok(submission.clone())
    }

    /// Retry a failed submission: conditionally transition `Failed` back
    /// to `Pending` and reset only the failed attempts. Succeeded
    /// attempts keep their outcome and are skipped by the next
    /// `process`. Submissions rejected for security reasons never
    /// re-enter this path.
    pub fn retry(&self, id: SubmissionId) -> Result<Submission, DeliveryError> {
        let mut entry = self
            .submissions
            .get_mut(&id)
            .ok_or(DeliveryError::NotFound(id))?;
        let submission = entry.value_mut();

        match submission.security_rejection {
            Some(SecurityRejection::Authentication) => return Err(DeliveryError::Authentication),
            Some(SecurityRejection::NullifierCollision) => {
                return Err(DeliveryError::NullifierCollision)
            }
            None => {}
        }
        if submission.status != DeliveryStatus::Failed
            && submission.status != DeliveryStatus::Partial
        {
            return Err(DeliveryError::InvalidState {
                from: submission.status,
                action: "retry",
            });
        }
        if submission.status == DeliveryStatus::Partial {
            // Partial is final; only fully failed submissions retry.
            return Err(DeliveryError::InvalidState {
                from: submission.status,
                action: "retry",
            });
        }

        for attempt in &mut submission.attempts {
            if attempt.outcome == AttemptOutcome::Failed {
                attempt.outcome = AttemptOutcome::Pending;
            }
        }
        submission.status = DeliveryStatus::Pending;
        submission.updated_at = chrono::Utc::now();
        tracing::info!(submission = %id, "submission reset for retry");
        Ok(submission.clone())
    }

    fn open_payload(&self, envelope: &SealedEnvelope) -> Result<DeliveryPayload, DeliveryError> {
        let plaintext = self
            .key_holder
            .open_envelope(envelope)
            .map_err(|_| DeliveryError::Authentication)?;
        DeliveryPayload::decode(&plaintext)
    }

    /// Record the nullifier atomically. A collision from a different
    /// submission is terminal; re-processing the same submission after
    /// retry sees its own earlier record and proceeds.
    fn record_nullifier(
        &self,
        id: SubmissionId,
        nullifier: Nullifier,
    ) -> Result<(), DeliveryError> {
        match self.nullifiers.record(nullifier, id) {
            Ok(()) => Ok(()),
            Err(MembershipError::NullifierCollision { .. })
                if self.nullifiers.lookup(&nullifier) == Some(id) =>
            {
                Ok(())
            }
            Err(_) => Err(self.mark_rejected(id, SecurityRejection::NullifierCollision)),
        }
    }

    /// Mark a submission terminally failed for a security reason and
    /// map the reason to its error.
    fn mark_rejected(&self, id: SubmissionId, rejection: SecurityRejection) -> DeliveryError {
        if let Some(mut entry) = self.submissions.get_mut(&id) {
            let submission = entry.value_mut();
            submission.status = DeliveryStatus::Failed;
            submission.security_rejection = Some(rejection);
            submission.updated_at = chrono::Utc::now();
        }
        tracing::warn!(
            submission = %id,
            rejection = ?rejection,
            security = true,
            "submission rejected before fan-out"
        );
        match rejection {
            SecurityRejection::Authentication => DeliveryError::Authentication,
            SecurityRejection::NullifierCollision => DeliveryError::NullifierCollision,
        }
    }

    /// One task per recipient; a failure in one domain never cancels the
    /// others.
    async fn fan_out(
        &self,
        payload: Arc<DeliveryPayload>,
        recipients: Vec<RecipientId>,
    ) -> Vec<(RecipientId, Result<(), crate::submission::DeliveryErrorClass>)> {
        let mut tasks = JoinSet::new();
        for recipient in recipients {
            let transport = Arc::clone(&self.transport);
            let payload = Arc::clone(&payload);
            tasks.spawn(async move {
                let result = transport.deliver(&recipient, &payload).await;
                match result {
                    Ok(receipt) => {
                        tracing::debug!(recipient = %receipt.recipient, "delivery accepted");
                        (recipient, Ok(()))
                    }
                    Err(error) => {
                        tracing::warn!(recipient = %recipient, %error, "delivery failed");
                        (recipient, Err(error.class()))
                    }
                }
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => results.push(outcome),
                // A panicked delivery task counts as no result; the
                // attempt keeps its previous outcome.
                Err(join_error) => {
                    tracing::error!(%join_error, "delivery task panicked");
                }
            }
        }
        results
    }
}

impl std::fmt::Debug for DeliveryCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryCoordinator")
            .field("submissions", &self.submissions.len())
            .finish_non_exhaustive()
    }
}
