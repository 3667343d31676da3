//! # civiq-api — Axum API Service for the Delivery Pipeline
//!
//! HTTP surface over the credential issuer, trust-tier engine,
//! membership trees, and the proof-verified delivery coordinator.
//!
//! ## API Surface
//!
//! | Prefix | Module | Domain |
//! |--------|--------|--------|
//! | `/v1/credentials/*` | [`routes::credentials`] | Issuance, verification, revocation |
//! | `/v1/tier` | [`routes::tier`] | Trust-tier derivation |
//! | `/v1/memberships/*` | [`routes::memberships`] | Merkle registration, inclusion paths |
//! | `/v1/submissions/*` | [`routes::submissions`] | Sealed-envelope delivery lifecycle |
//! | `/v1/keys/witness` | [`routes::submissions`] | Envelope-sealing public key |
//!
//! State is in-memory-authoritative; Postgres, when configured, is a
//! write-behind journal replayed by [`hydrate`] at startup.

pub mod db;
pub mod error;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use civiq_core::SubmissionId;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
///
/// Health probes (`/health/*`) are mounted alongside the API routes;
/// readiness checks actual service health.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::credentials::router())
        .merge(routes::tier::router())
        .merge(routes::memberships::router())
        .merge(routes::submissions::router())
        // Body size limit: 2 MiB. Sealed envelopes are small; anything
        // larger is malformed.
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(TraceLayer::new_for_http());

    Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .merge(api)
        .with_state(state)
}

/// Replay persisted state into the in-memory stores. Called once at
/// startup, before the server binds.
///
/// Submissions trapped mid-processing by a crash were stored as failed,
/// so replay alone restores a retryable picture.
pub async fn hydrate(state: &AppState) -> Result<(), sqlx::Error> {
    let Some(ref pool) = state.db_pool else {
        return Ok(());
    };

    let submissions = db::submissions::load_all_submissions(pool).await?;
    let submission_count = submissions.len();
    for submission in submissions {
        state.coordinator.insert(submission);
    }

    let nullifiers = db::nullifiers::load_all_nullifiers(pool).await?;
    let nullifier_count = nullifiers.len();
    for (nullifier, submission_id) in nullifiers {
        // The table's primary key already enforced uniqueness; a
        // collision here means the same row replayed twice.
        if let Err(e) = state
            .nullifiers
            .record(nullifier, SubmissionId::from_uuid(submission_id))
        {
            tracing::warn!(error = %e, "skipped duplicate nullifier during hydration");
        }
    }

    tracing::info!(
        submissions = submission_count,
        nullifiers = nullifier_count,
        "hydrated state from database"
    );
    Ok(())
}

/// Liveness probe — always responds if the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the application is ready to serve traffic.
///
/// Checks:
/// - Issuer signing key is loaded (can derive verifying key).
/// - Witness key holder can produce its public key.
/// - Database connection is healthy (when configured).
///
/// Returns 200 "ready" or 503 with a diagnostic message.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if state.issuer.verifying_key().to_hex().len() != 64 {
        return (StatusCode::SERVICE_UNAVAILABLE, "issuer key degraded").into_response();
    }
    if state.key_holder.public_key().as_bytes().len() != 32 {
        return (StatusCode::SERVICE_UNAVAILABLE, "witness key degraded").into_response();
    }

    if let Some(ref pool) = state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "readiness: database check failed");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unavailable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
