//! # Credential API Endpoints
//!
//! Issuance, verification, and revocation of signed claims.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/v1/credentials` | `issue_credential` |
//! | `POST` | `/v1/credentials/residency` | `issue_residency` |
//! | `POST` | `/v1/credentials/verify` | `verify_credential` |
//! | `POST` | `/v1/credentials/:credential_id/revoke` | `revoke_credential` |

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Duration;
use civiq_core::{CredentialId, LocalDistrictCode, SubjectId};
use civiq_credential::{Credential, CredentialClaims, RawAddress, VerificationStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request to issue a credential over pre-validated claims.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueCredentialRequest {
    /// Existing subject id; a fresh one is minted when omitted.
    #[serde(default)]
    pub subject: Option<Uuid>,
    pub claims: CredentialClaims,
    /// Base validity window in days. Defaults to 365.
    #[serde(default)]
    pub ttl_days: Option<i64>,
}

/// Request to issue a district-residency credential from a raw address.
///
/// The address is consumed during resolution and never stored.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueResidencyRequest {
    #[serde(default)]
    pub subject: Option<Uuid>,
    pub address: String,
    #[serde(default)]
    pub local_districts: Vec<String>,
    #[serde(default)]
    pub ttl_days: Option<i64>,
}

/// Request to verify a presented credential.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyCredentialRequest {
    pub credential: Credential,
}

/// Verification verdict.
#[derive(Debug, Serialize)]
pub struct VerifyCredentialResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl From<VerificationStatus> for VerifyCredentialResponse {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Verified => Self { status: "verified", reason: None },
            VerificationStatus::Expired => Self { status: "expired", reason: None },
            VerificationStatus::Revoked => Self { status: "revoked", reason: None },
            VerificationStatus::Tampered { reason } => Self {
                status: "tampered",
                reason: Some(reason),
            },
        }
    }
}

const DEFAULT_TTL_DAYS: i64 = 365;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the credential router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/credentials", post(issue_credential))
        .route("/v1/credentials/residency", post(issue_residency))
        .route("/v1/credentials/verify", post(verify_credential))
        .route(
            "/v1/credentials/:credential_id/revoke",
            post(revoke_credential),
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/credentials — Issue a credential over validated claims.
async fn issue_credential(
    State(state): State<AppState>,
    Json(req): Json<IssueCredentialRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject = req.subject.map(SubjectId::from_uuid).unwrap_or_default();
    let ttl = Duration::days(req.ttl_days.unwrap_or(DEFAULT_TTL_DAYS));

    let credential = state.issuer.issue(subject, req.claims, ttl)?;
    Ok((StatusCode::CREATED, Json(credential)))
}

/// POST /v1/credentials/residency — Derive a district from a raw
/// address and issue a residency credential. The address does not
/// outlive the handler.
async fn issue_residency(
    State(state): State<AppState>,
    Json(req): Json<IssueResidencyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject = req.subject.map(SubjectId::from_uuid).unwrap_or_default();
    let ttl = Duration::days(req.ttl_days.unwrap_or(DEFAULT_TTL_DAYS));
    let local_districts = req
        .local_districts
        .into_iter()
        .map(LocalDistrictCode::new)
        .collect::<Result<Vec<_>, _>>()?;

    let credential = state.issuer.issue_residency_from_address(
        subject,
        RawAddress::new(req.address),
        local_districts,
        state.resolver.as_ref(),
        ttl,
    )?;
    Ok((StatusCode::CREATED, Json(credential)))
}

/// POST /v1/credentials/verify — Check integrity, signature,
/// revocation, and expiry.
async fn verify_credential(
    State(state): State<AppState>,
    Json(req): Json<VerifyCredentialRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = state.issuer.verify(&req.credential);
    Ok(Json(VerifyCredentialResponse::from(status)))
}

/// POST /v1/credentials/:credential_id/revoke — Add the credential to
/// the revocation ledger. Idempotent.
async fn revoke_credential(
    State(state): State<AppState>,
    Path(credential_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.issuer.revoke(CredentialId::from_uuid(credential_id));
    Ok(StatusCode::NO_CONTENT)
}
