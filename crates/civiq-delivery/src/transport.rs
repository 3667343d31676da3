//! Recipient delivery transport.
//!
//! The actual wire to a recipient's intake system (congressional intake
//! API, mail bridge, webhook) lives behind [`DeliveryTransport`]. The
//! coordinator only sees the two error classes it needs for retry
//! policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use civiq_core::RecipientId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coordinator::DeliveryPayload;
use crate::submission::DeliveryErrorClass;

/// Transport-level delivery failure.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The recipient endpoint could not be reached. Retryable.
    #[error("recipient unreachable: {0}")]
    Unreachable(String),

    /// The recipient's intake actively refused the payload. Not
    /// retryable; a new submission is required.
    #[error("recipient rejected delivery: {0}")]
    Rejected(String),
}

impl TransportError {
    pub fn class(&self) -> DeliveryErrorClass {
        match self {
            Self::Unreachable(_) => DeliveryErrorClass::Unreachable,
            Self::Rejected(_) => DeliveryErrorClass::Rejected,
        }
    }
}

/// Proof of one accepted delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub recipient: RecipientId,
    /// Recipient-assigned tracking reference, if the intake issues one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub delivered_at: DateTime<Utc>,
}

/// One delivery call per recipient. Implementations must be safe to
/// invoke concurrently for different recipients of the same submission.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn deliver(
        &self,
        recipient: &RecipientId,
        payload: &DeliveryPayload,
    ) -> Result<DeliveryReceipt, TransportError>;
}

/// HTTP intake transport: `POST {base_url}/recipients/{id}/deliveries`
/// with the payload as JSON. Connection problems and 5xx responses are
/// `Unreachable`; 4xx responses are `Rejected`.
#[derive(Debug, Clone)]
pub struct HttpIntakeTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIntakeTransport {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Unreachable(format!("failed to build client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DeliveryTransport for HttpIntakeTransport {
    async fn deliver(
        &self,
        recipient: &RecipientId,
        payload: &DeliveryPayload,
    ) -> Result<DeliveryReceipt, TransportError> {
        let url = format!("{}/recipients/{}/deliveries", self.base_url, recipient);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(TransportError::Unreachable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected(format!("HTTP {status}: {body}")));
        }

        #[derive(serde::Deserialize, Default)]
        struct IntakeAck {
            reference: Option<String>,
        }
        let ack: IntakeAck = response.json().await.unwrap_or_default();
        Ok(DeliveryReceipt {
            recipient: recipient.clone(),
            reference: ack.reference,
            delivered_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes() {
        assert_eq!(
            TransportError::Unreachable("timeout".into()).class(),
            DeliveryErrorClass::Unreachable
        );
        assert_eq!(
            TransportError::Rejected("malformed".into()).class(),
            DeliveryErrorClass::Rejected
        );
    }
}
