//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from civiq-credential, civiq-membership, and
//! civiq-delivery to HTTP status codes with JSON bodies. Internal error
//! details are never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422). Both JSON-shape problems and
    /// business-rule violations land here; only malformed HTTP framing
    /// is 400.
    #[error("validation error: {0}")]
    Validation(String),

    /// Credential or envelope authentication failure (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict with current resource state (409). Covers illegal
    /// lifecycle transitions and nullifier collisions.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Logged but not returned to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if let Self::Internal(_) = &self {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<civiq_core::ValidationError> for AppError {
    fn from(err: civiq_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<civiq_credential::CredentialError> for AppError {
    fn from(err: civiq_credential::CredentialError) -> Self {
        use civiq_credential::CredentialError;
        match &err {
            CredentialError::Validation(_)
            | CredentialError::Resolver(_)
            | CredentialError::Provider(_) => Self::Validation(err.to_string()),
            CredentialError::Crypto(_) => Self::Unauthorized(err.to_string()),
            CredentialError::Canonicalization(_) | CredentialError::Json(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<civiq_membership::MembershipError> for AppError {
    fn from(err: civiq_membership::MembershipError) -> Self {
        use civiq_membership::MembershipError;
        match &err {
            MembershipError::NullifierCollision { .. } => Self::Conflict(err.to_string()),
            MembershipError::IncompleteRegistration | MembershipError::Validation(_) => {
                Self::Validation(err.to_string())
            }
            MembershipError::NullifierMismatch | MembershipError::ProofGeneration(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<civiq_delivery::DeliveryError> for AppError {
    fn from(err: civiq_delivery::DeliveryError) -> Self {
        use civiq_delivery::DeliveryError;
        match &err {
            DeliveryError::NotFound(id) => Self::NotFound(format!("submission {id}")),
            DeliveryError::InvalidState { .. } | DeliveryError::NullifierCollision => {
                Self::Conflict(err.to_string())
            }
            DeliveryError::Authentication => Self::Unauthorized(err.to_string()),
            DeliveryError::Payload(_) => Self::Validation(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
