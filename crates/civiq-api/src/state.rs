//! Shared application state.

use std::sync::Arc;

use civiq_credential::{CredentialIssuer, DistrictResolver};
use civiq_crypto::{SigningKey, WitnessKeyHolder};
use civiq_delivery::{DeliveryCoordinator, DeliveryTransport};
use civiq_membership::{MembershipRegistry, NullifierRegistry};
use sqlx::PgPool;

/// Environment-driven configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Socket address the server binds to.
    pub bind_addr: String,
    /// Issuer identifier embedded in every credential.
    pub issuer_id: String,
}

impl ApiConfig {
    /// Read configuration from the environment, with development
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("CIVIQ_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            issuer_id: std::env::var("CIVIQ_ISSUER_ID")
                .unwrap_or_else(|_| "civiq.issuer.dev".to_string()),
        }
    }
}

/// Shared state behind every handler. Cheap to clone; all stores are
/// `Arc`-shared.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub issuer: Arc<CredentialIssuer>,
    pub resolver: Arc<dyn DistrictResolver>,
    pub memberships: Arc<MembershipRegistry>,
    pub nullifiers: Arc<NullifierRegistry>,
    pub key_holder: Arc<dyn WitnessKeyHolder>,
    pub coordinator: Arc<DeliveryCoordinator>,
    /// `None` means in-memory-only mode.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        signing_key: SigningKey,
        resolver: Arc<dyn DistrictResolver>,
        key_holder: Arc<dyn WitnessKeyHolder>,
        transport: Arc<dyn DeliveryTransport>,
        db_pool: Option<PgPool>,
    ) -> Self {
        let issuer = Arc::new(CredentialIssuer::new(config.issuer_id.clone(), signing_key));
        let nullifiers = Arc::new(NullifierRegistry::new());
        let coordinator = Arc::new(DeliveryCoordinator::new(
            Arc::clone(&key_holder),
            transport,
            Arc::clone(&nullifiers),
        ));
        Self {
            config,
            issuer,
            resolver,
            memberships: Arc::new(MembershipRegistry::new()),
            nullifiers,
            key_holder,
            coordinator,
            db_pool,
        }
    }
}
