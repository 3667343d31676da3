//! # Submission API Endpoints
//!
//! The delivery pipeline's write surface: accept a sealed envelope,
//! drive it to a terminal status, and retry failed runs.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/v1/submissions` | `create_submission` |
//! | `GET` | `/v1/submissions` | `list_submissions` |
//! | `GET` | `/v1/submissions/:submission_id` | `get_submission` |
//! | `POST` | `/v1/submissions/:submission_id/process` | `process_submission` |
//! | `POST` | `/v1/submissions/:submission_id/retry` | `retry_submission` |
//! | `GET` | `/v1/keys/witness` | `witness_key` |

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use civiq_core::{RecipientId, SubmissionId};
use civiq_crypto::SealedEnvelope;
use civiq_delivery::Submission;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request to create a submission.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSubmissionRequest {
    /// Sealed delivery payload, encrypted to the pipeline's witness key.
    pub envelope: SealedEnvelope,
    pub recipients: Vec<String>,
    /// Client-chosen key; resubmitting with the same key returns the
    /// original record.
    pub idempotency_key: String,
}

/// The pipeline's envelope-opening public key.
#[derive(Debug, Serialize)]
pub struct WitnessKeyResponse {
    pub public_key: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the submission router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/submissions",
            post(create_submission).get(list_submissions),
        )
        .route("/v1/submissions/:submission_id", get(get_submission))
        .route(
            "/v1/submissions/:submission_id/process",
            post(process_submission),
        )
        .route(
            "/v1/submissions/:submission_id/retry",
            post(retry_submission),
        )
        .route("/v1/keys/witness", get(witness_key))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/submissions — Accept a sealed envelope for delivery.
async fn create_submission(
    State(state): State<AppState>,
    Json(req): Json<CreateSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let recipients = req
        .recipients
        .into_iter()
        .map(RecipientId::new)
        .collect::<Result<Vec<_>, _>>()?;

    let submission = state
        .coordinator
        .submit(req.envelope, recipients, req.idempotency_key)?;
    persist(&state, submission.id).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// GET /v1/submissions — All submissions, newest state included.
async fn list_submissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Submission>>, AppError> {
    Ok(Json(state.coordinator.list()))
}

/// GET /v1/submissions/:submission_id — A single submission.
async fn get_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
) -> Result<Json<Submission>, AppError> {
    let id = SubmissionId::from_uuid(submission_id);
    state
        .coordinator
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("submission {id}")))
}

/// POST /v1/submissions/:submission_id/process — Open the envelope,
/// record the nullifier, and fan out to every pending recipient.
///
/// The terminal status is persisted even when processing fails, so a
/// restart never resurrects a rejected run.
async fn process_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
) -> Result<Json<Submission>, AppError> {
    let id = SubmissionId::from_uuid(submission_id);
    let result = state.coordinator.process(id).await;
    persist(&state, id).await?;
    Ok(Json(result?))
}

/// POST /v1/submissions/:submission_id/retry — Re-arm a fully failed
/// submission. Partial and security-rejected runs are final.
async fn retry_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
) -> Result<Json<Submission>, AppError> {
    let id = SubmissionId::from_uuid(submission_id);
    let submission = state.coordinator.retry(id)?;
    persist(&state, id).await?;
    Ok(Json(submission))
}

/// GET /v1/keys/witness — The public key clients seal envelopes to.
async fn witness_key(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(WitnessKeyResponse {
        public_key: state.key_holder.public_key().to_hex(),
    }))
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Write the submission's current state and any newly recorded
/// nullifiers. Nullifier writes are `ON CONFLICT DO NOTHING`, so
/// re-syncing the whole registry is idempotent.
async fn persist(state: &AppState, id: SubmissionId) -> Result<(), AppError> {
    let Some(ref pool) = state.db_pool else {
        return Ok(());
    };

    if let Some(submission) = state.coordinator.get(&id) {
        if let Err(e) = db::submissions::save_submission(pool, &submission).await {
            tracing::error!(error = %e, submission = %id, "failed to persist submission");
            return Err(AppError::from(e));
        }
    }
    for (nullifier, submission_id) in state.nullifiers.snapshot() {
        db::nullifiers::save_nullifier(pool, &nullifier, *submission_id.as_uuid()).await?;
    }
    Ok(())
}
