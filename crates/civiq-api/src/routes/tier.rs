//! # Trust Tier Endpoint
//!
//! Stateless tier derivation from a presented credential set.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use civiq_credential::Credential;
use civiq_tier::{derive_tier, CredentialSet, TrustTier};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// Request to derive a trust tier from the caller's credential set.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeriveTierRequest {
    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub has_device_key: bool,
    #[serde(default)]
    pub membership_confirmed: bool,
}

/// Derived tier plus its numeric level.
#[derive(Debug, Serialize)]
pub struct DeriveTierResponse {
    pub tier: TrustTier,
    pub level: u8,
}

/// Build the tier router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/tier", post(derive_tier_handler))
}

/// POST /v1/tier — Re-verify every presented credential and report the
/// highest tier whose full requirement chain holds.
async fn derive_tier_handler(
    State(state): State<AppState>,
    Json(req): Json<DeriveTierRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Only credentials this issuer still vouches for count.
    let verified: Vec<Credential> = req
        .credentials
        .into_iter()
        .filter(|c| state.issuer.verify(c).is_verified())
        .collect();

    let set = CredentialSet {
        has_device_key: req.has_device_key,
        credentials: &verified,
        membership_confirmed: req.membership_confirmed,
    };
    let tier = derive_tier(&set);
    Ok(Json(DeriveTierResponse {
        tier,
        level: tier.as_level(),
    }))
}
