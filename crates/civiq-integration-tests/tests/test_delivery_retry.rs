//! Delivery fan-out outcomes: partial delivery is final, full failure
//! retries cleanly, and a retried run reuses its own nullifier.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use civiq_core::{ActionDomain, DistrictCode, IdentityCommitment, RecipientId};
use civiq_crypto::{seal, SoftwareKeyHolder, WitnessKeyHolder};
use civiq_delivery::{
    AttemptOutcome, DeliveryCoordinator, DeliveryError, DeliveryPayload, DeliveryReceipt,
    DeliveryStatus, DeliveryTransport, TransportError,
};
use civiq_membership::NullifierRegistry;

/// Transport that rejects a fixed set of recipients and fails everyone
/// while unhealthy.
struct FaultyTransport {
    healthy: AtomicBool,
    rejects: HashSet<String>,
}

impl FaultyTransport {
    fn new(rejects: &[&str]) -> Self {
        Self {
            healthy: AtomicBool::new(true),
            rejects: rejects.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl DeliveryTransport for FaultyTransport {
    async fn deliver(
        &self,
        recipient: &RecipientId,
        _payload: &DeliveryPayload,
    ) -> Result<DeliveryReceipt, TransportError> {
        if !self.healthy.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable("connection refused".to_string()));
        }
        if self.rejects.contains(recipient.as_str()) {
            return Err(TransportError::Rejected("intake closed".to_string()));
        }
        Ok(DeliveryReceipt {
            recipient: recipient.clone(),
            reference: None,
            delivered_at: Utc::now(),
        })
    }
}

fn coordinator_with(
    transport: Arc<FaultyTransport>,
) -> (DeliveryCoordinator, Arc<SoftwareKeyHolder>) {
    let holder = Arc::new(SoftwareKeyHolder::generate());
    let coordinator = DeliveryCoordinator::new(
        Arc::clone(&holder) as Arc<dyn WitnessKeyHolder>,
        transport,
        Arc::new(NullifierRegistry::new()),
    );
    (coordinator, holder)
}

fn sealed_payload(holder: &SoftwareKeyHolder, action: &str) -> civiq_crypto::SealedEnvelope {
    let payload = DeliveryPayload {
        proof_bytes: vec![9u8; 32],
        nullifier: civiq_crypto::derive_nullifier(
            &IdentityCommitment::new("e".repeat(64)).unwrap(),
            &ActionDomain::new(action).unwrap(),
        ),
        district: DistrictCode::new("TX-7").unwrap(),
        subject: "measure".to_string(),
        body: "For the record.".to_string(),
    };
    seal(&payload.encode().unwrap(), &holder.public_key()).unwrap()
}

fn recipients(names: &[&str]) -> Vec<RecipientId> {
    names
        .iter()
        .map(|n| RecipientId::new(*n).unwrap())
        .collect()
}

#[tokio::test]
async fn partial_delivery_is_final() {
    let transport = Arc::new(FaultyTransport::new(&["rep-b"]));
    let (coordinator, holder) = coordinator_with(transport);

    let submission = coordinator
        .submit(
            sealed_payload(&holder, "vote.m1.yes"),
            recipients(&["rep-a", "rep-b"]),
            "partial".to_string(),
        )
        .unwrap();
    let processed = coordinator.process(submission.id).await.unwrap();
    assert_eq!(processed.status, DeliveryStatus::Partial);

    let outcomes: Vec<AttemptOutcome> =
        processed.attempts.iter().map(|a| a.outcome).collect();
    assert!(outcomes.contains(&AttemptOutcome::Succeeded));
    assert!(outcomes.contains(&AttemptOutcome::Failed));

    let err = coordinator.retry(submission.id).unwrap_err();
    assert!(matches!(
        err,
        DeliveryError::InvalidState {
            from: DeliveryStatus::Partial,
            ..
        }
    ));
}

#[tokio::test]
async fn failed_submission_retries_to_delivered() {
    let transport = Arc::new(FaultyTransport::new(&[]));
    transport.healthy.store(false, Ordering::SeqCst);
    let (coordinator, holder) = coordinator_with(Arc::clone(&transport));

    let submission = coordinator
        .submit(
            sealed_payload(&holder, "vote.m2.yes"),
            recipients(&["rep-a", "rep-b"]),
            "retry-me".to_string(),
        )
        .unwrap();
    let failed = coordinator.process(submission.id).await.unwrap();
    assert_eq!(failed.status, DeliveryStatus::Failed);
    assert!(failed.security_rejection.is_none());

    // Intake recovers; the retry re-arms every attempt and the second
    // run records no nullifier collision against itself.
    transport.healthy.store(true, Ordering::SeqCst);
    let retried = coordinator.retry(submission.id).unwrap();
    assert_eq!(retried.status, DeliveryStatus::Pending);
    assert!(retried
        .attempts
        .iter()
        .all(|a| a.outcome == AttemptOutcome::Pending));

    let processed = coordinator.process(submission.id).await.unwrap();
    assert_eq!(processed.status, DeliveryStatus::Delivered);
    // Attempt counts carry across the retry.
    assert!(processed.attempts.iter().all(|a| a.attempt_count == 2));
}

#[tokio::test]
async fn processing_twice_without_retry_is_rejected() {
    let transport = Arc::new(FaultyTransport::new(&[]));
    let (coordinator, holder) = coordinator_with(transport);

    let submission = coordinator
        .submit(
            sealed_payload(&holder, "vote.m3.yes"),
            recipients(&["rep-a"]),
            "once".to_string(),
        )
        .unwrap();
    coordinator.process(submission.id).await.unwrap();

    let err = coordinator.process(submission.id).await.unwrap_err();
    assert!(matches!(
        err,
        DeliveryError::InvalidState {
            from: DeliveryStatus::Delivered,
            ..
        }
    ));
}
