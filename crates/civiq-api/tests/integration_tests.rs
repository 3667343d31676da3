//! # Integration Tests for civiq-api
//!
//! Tests health probes, credential issuance and verification, tier
//! derivation, membership registration, and the submission lifecycle
//! end to end through the router.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use civiq_api::state::{ApiConfig, AppState};
use civiq_core::{DistrictCode, RecipientId};
use civiq_crypto::{seal, RecipientPublicKey, SigningKey, SoftwareKeyHolder, WitnessKeyHolder};
use civiq_credential::DirectoryResolver;
use civiq_delivery::{
    DeliveryPayload, DeliveryReceipt, DeliveryTransport, TransportError,
};
use http_body_util::BodyExt;
use rand_core::OsRng;
use tower::ServiceExt;

/// Transport that acknowledges every delivery.
struct AlwaysDelivers;

#[async_trait]
impl DeliveryTransport for AlwaysDelivers {
    async fn deliver(
        &self,
        recipient: &RecipientId,
        _payload: &DeliveryPayload,
    ) -> Result<DeliveryReceipt, TransportError> {
        Ok(DeliveryReceipt {
            recipient: recipient.clone(),
            reference: Some("ack".to_string()),
            delivered_at: Utc::now(),
        })
    }
}

/// Helper: build the test app plus the key clients seal envelopes to.
fn test_app() -> (axum::Router, RecipientPublicKey) {
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        issuer_id: "civiq.issuer.test".to_string(),
    };
    let holder = SoftwareKeyHolder::generate();
    let witness_key = holder.public_key();

    let mut table = HashMap::new();
    table.insert("94110".to_string(), DistrictCode::new("CA-12").unwrap());

    let state = AppState::new(
        config,
        SigningKey::generate(&mut OsRng),
        Arc::new(DirectoryResolver::new(table)),
        Arc::new(holder),
        Arc::new(AlwaysDelivers),
        None,
    );
    (civiq_api::app(state), witness_key)
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_probe() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Credentials --------------------------------------------------------------

#[tokio::test]
async fn test_issue_residency_from_address() {
    let (app, _) = test_app();
    let response = app
        .oneshot(post_json(
            "/v1/credentials/residency",
            serde_json::json!({
                "address": "123 Mission St, San Francisco, CA 94110",
                "local_districts": ["sf-school-7"]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["claims"]["type"], "district_residency");
    assert_eq!(body["claims"]["congressional_district"], "CA-12");
    // The raw address never appears in the credential.
    assert!(!body.to_string().contains("Mission"));
}

#[tokio::test]
async fn test_issue_residency_unknown_address_rejected() {
    let (app, _) = test_app();
    let response = app
        .oneshot(post_json(
            "/v1/credentials/residency",
            serde_json::json!({ "address": "1 Nowhere Ln, Elsewhere, ZZ 00000" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_verify_and_revoke_roundtrip() {
    let (app, _) = test_app();

    let issued = app
        .clone()
        .oneshot(post_json(
            "/v1/credentials/residency",
            serde_json::json!({ "address": "94110" }),
        ))
        .await
        .unwrap();
    assert_eq!(issued.status(), StatusCode::CREATED);
    let credential = body_json(issued).await;
    let credential_id = credential["id"].as_str().unwrap().to_string();

    let verified = app
        .clone()
        .oneshot(post_json(
            "/v1/credentials/verify",
            serde_json::json!({ "credential": credential }),
        ))
        .await
        .unwrap();
    assert_eq!(verified.status(), StatusCode::OK);
    assert_eq!(body_json(verified).await["status"], "verified");

    let revoked = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/credentials/{credential_id}/revoke"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(revoked.status(), StatusCode::NO_CONTENT);

    let after = app
        .oneshot(post_json(
            "/v1/credentials/verify",
            serde_json::json!({ "credential": credential }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(after).await["status"], "revoked");
}

#[tokio::test]
async fn test_tampered_credential_detected() {
    let (app, _) = test_app();

    let issued = app
        .clone()
        .oneshot(post_json(
            "/v1/credentials/residency",
            serde_json::json!({ "address": "94110" }),
        ))
        .await
        .unwrap();
    let mut credential = body_json(issued).await;
    credential["claims"]["congressional_district"] = serde_json::json!("NY-1");

    let verified = app
        .oneshot(post_json(
            "/v1/credentials/verify",
            serde_json::json!({ "credential": credential }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(verified).await["status"], "tampered");
}

// -- Tier derivation ----------------------------------------------------------

#[tokio::test]
async fn test_tier_from_district_credential() {
    let (app, _) = test_app();

    let issued = app
        .clone()
        .oneshot(post_json(
            "/v1/credentials/residency",
            serde_json::json!({ "address": "94110" }),
        ))
        .await
        .unwrap();
    let credential = body_json(issued).await;

    let response = app
        .oneshot(post_json(
            "/v1/tier",
            serde_json::json!({
                "credentials": [credential],
                "has_device_key": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["tier"], "district_verified");
    assert_eq!(body["level"], 2);
}

#[tokio::test]
async fn test_tier_anonymous_without_device_key() {
    let (app, _) = test_app();
    let response = app
        .oneshot(post_json("/v1/tier", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["tier"], "anonymous");
}

// -- Memberships --------------------------------------------------------------

#[tokio::test]
async fn test_membership_registration_and_path() {
    let (app, _) = test_app();
    let commitment = "a".repeat(64);

    let registered = app
        .clone()
        .oneshot(post_json(
            "/v1/memberships",
            serde_json::json!({
                "identity_commitment": commitment,
                "cell": "ca-12.precinct-3"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(registered.status(), StatusCode::CREATED);
    let registration = body_json(registered).await;
    assert_eq!(registration["leaf_index"], 0);

    let path = app
        .clone()
        .oneshot(post_json(
            "/v1/memberships/path",
            serde_json::json!({ "registration": registration }),
        ))
        .await
        .unwrap();
    assert_eq!(path.status(), StatusCode::OK);

    let root = app.oneshot(get("/v1/memberships/root")).await.unwrap();
    assert!(body_json(root).await["global_root"].is_string());
}

#[tokio::test]
async fn test_membership_invalid_cell_rejected() {
    let (app, _) = test_app();
    let response = app
        .oneshot(post_json(
            "/v1/memberships",
            serde_json::json!({
                "identity_commitment": "b".repeat(64),
                "cell": "NOT VALID"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Submissions --------------------------------------------------------------

fn sealed_submission_body(
    witness_key: &RecipientPublicKey,
    subject: &str,
    idempotency_key: &str,
) -> serde_json::Value {
    let payload = DeliveryPayload {
        proof_bytes: vec![7u8; 32],
        nullifier: civiq_crypto::derive_nullifier(
            &civiq_core::IdentityCommitment::new("c".repeat(64)).unwrap(),
            &civiq_core::ActionDomain::new(format!("petition.{subject}.2026")).unwrap(),
        ),
        district: DistrictCode::new("CA-12").unwrap(),
        subject: subject.to_string(),
        body: "I support the measure.".to_string(),
    };
    let envelope = seal(&payload.encode().unwrap(), witness_key).unwrap();
    serde_json::json!({
        "envelope": envelope,
        "recipients": ["rep-ca-12"],
        "idempotency_key": idempotency_key
    })
}

#[tokio::test]
async fn test_submission_lifecycle_delivers() {
    let (app, witness_key) = test_app();
    let body = sealed_submission_body(&witness_key, "measure-a", "key-1");

    let created = app
        .clone()
        .oneshot(post_json("/v1/submissions", body))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let submission = body_json(created).await;
    assert_eq!(submission["status"], "pending");
    let id = submission["id"].as_str().unwrap().to_string();

    let processed = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/submissions/{id}/process"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(processed.status(), StatusCode::OK);
    assert_eq!(body_json(processed).await["status"], "delivered");

    let fetched = app
        .oneshot(get(&format!("/v1/submissions/{id}")))
        .await
        .unwrap();
    assert_eq!(body_json(fetched).await["status"], "delivered");
}

#[tokio::test]
async fn test_idempotent_resubmission_returns_original() {
    let (app, witness_key) = test_app();
    let body = sealed_submission_body(&witness_key, "measure-b", "key-dup");

    let first = app
        .clone()
        .oneshot(post_json("/v1/submissions", body.clone()))
        .await
        .unwrap();
    let first_id = body_json(first).await["id"].as_str().unwrap().to_string();

    let second = app
        .oneshot(post_json("/v1/submissions", body))
        .await
        .unwrap();
    assert_eq!(body_json(second).await["id"].as_str().unwrap(), first_id);
}

#[tokio::test]
async fn test_duplicate_nullifier_rejected_on_process() {
    let (app, witness_key) = test_app();

    // Same payload under two idempotency keys: two submissions, one
    // nullifier.
    let first = sealed_submission_body(&witness_key, "measure-c", "key-a");
    let second = sealed_submission_body(&witness_key, "measure-c", "key-b");

    let id_a = body_json(
        app.clone()
            .oneshot(post_json("/v1/submissions", first))
            .await
            .unwrap(),
    )
    .await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let id_b = body_json(
        app.clone()
            .oneshot(post_json("/v1/submissions", second))
            .await
            .unwrap(),
    )
    .await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let processed_a = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/submissions/{id_a}/process"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(processed_a.status(), StatusCode::OK);

    let processed_b = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/submissions/{id_b}/process"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(processed_b.status(), StatusCode::CONFLICT);

    // The rejected submission stays rejected: retry is refused.
    let retried = app
        .oneshot(post_json(
            &format!("/v1/submissions/{id_b}/retry"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(retried.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_submission_is_404() {
    let (app, _) = test_app();
    let response = app
        .oneshot(get(&format!("/v1/submissions/{}", uuid::Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_witness_key_endpoint_matches_holder() {
    let (app, witness_key) = test_app();
    let response = app.oneshot(get("/v1/keys/witness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["public_key"],
        witness_key.to_hex()
    );
}
