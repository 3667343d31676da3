//! # Membership Tree Endpoints
//!
//! Commitment registration and inclusion-path retrieval against the
//! two-level cell/global Merkle structure.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/v1/memberships` | `register_membership` |
//! | `POST` | `/v1/memberships/path` | `inclusion_path` |
//! | `GET` | `/v1/memberships/root` | `global_root` |

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use civiq_core::IdentityCommitment;
use civiq_membership::{CellId, InclusionPath, MembershipRegistration};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// Request to append an identity commitment to a cell tree.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterMembershipRequest {
    pub identity_commitment: String,
    pub cell: String,
}

/// Request for the current inclusion path of a registration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InclusionPathRequest {
    pub registration: MembershipRegistration,
}

/// Current global root, if any cell holds a leaf.
#[derive(Debug, Serialize)]
pub struct GlobalRootResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_root: Option<String>,
}

/// Build the membership router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/memberships", post(register_membership))
        .route("/v1/memberships/path", post(inclusion_path))
        .route("/v1/memberships/root", get(global_root))
}

/// POST /v1/memberships — Append a commitment to its cell tree. The
/// caller must keep the returned registration; it is the handle for
/// every later path request.
async fn register_membership(
    State(state): State<AppState>,
    Json(req): Json<RegisterMembershipRequest>,
) -> Result<impl IntoResponse, AppError> {
    let commitment = IdentityCommitment::new(req.identity_commitment)?;
    let cell = CellId::new(req.cell)?;

    let registration = state.memberships.register(commitment, cell);
    Ok((StatusCode::CREATED, Json(registration)))
}

/// POST /v1/memberships/path — Recompute the inclusion path against
/// the current roots. Paths go stale whenever any registration lands,
/// so this is fetched fresh before each proof.
async fn inclusion_path(
    State(state): State<AppState>,
    Json(req): Json<InclusionPathRequest>,
) -> Result<Json<InclusionPath>, AppError> {
    let path = state
        .memberships
        .inclusion_path(&req.registration)
        .ok_or_else(|| AppError::NotFound("no inclusion path for registration".to_string()))?;
    Ok(Json(path))
}

/// GET /v1/memberships/root — The root over all cell roots.
async fn global_root(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(GlobalRootResponse {
        global_root: state.memberships.global_root().map(hex::encode),
    }))
}
