//! civiq-api server entrypoint.
//!
//! Configuration is environment-driven:
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | `CIVIQ_BIND_ADDR` | `0.0.0.0:8080` | Listen address |
//! | `CIVIQ_ISSUER_ID` | `civiq.issuer.dev` | Issuer identifier |
//! | `CIVIQ_ISSUER_KEY_HEX` | generated | Ed25519 issuer seed (64 hex chars) |
//! | `CIVIQ_WITNESS_KEY_HEX` | generated | X25519 witness secret (64 hex chars) |
//! | `CIVIQ_DISTRICT_TABLE` | none | Path to a ZIP-to-district JSON table |
//! | `CIVIQ_INTAKE_URL` | `http://127.0.0.1:8091` | Recipient intake base URL |
//! | `DATABASE_URL` | none | Postgres; absent means in-memory only |

use std::sync::Arc;
use std::time::Duration;

use civiq_api::state::{ApiConfig, AppState};
use civiq_api::{app, db, hydrate};
use civiq_credential::{DirectoryResolver, DistrictResolver};
use civiq_crypto::{RecipientSecretKey, SigningKey, SoftwareKeyHolder};
use civiq_delivery::HttpIntakeTransport;
use rand_core::OsRng;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env();

    let signing_key = match load_key_hex("CIVIQ_ISSUER_KEY_HEX") {
        Some(bytes) => SigningKey::from_bytes(&bytes),
        None => {
            tracing::warn!("CIVIQ_ISSUER_KEY_HEX not set, generating ephemeral issuer key");
            SigningKey::generate(&mut OsRng)
        }
    };

    let key_holder = match load_key_hex("CIVIQ_WITNESS_KEY_HEX") {
        Some(bytes) => SoftwareKeyHolder::from_secret(RecipientSecretKey::from_bytes(bytes)),
        None => {
            tracing::warn!("CIVIQ_WITNESS_KEY_HEX not set, generating ephemeral witness key");
            SoftwareKeyHolder::generate()
        }
    };

    let resolver: Arc<dyn DistrictResolver> = match std::env::var("CIVIQ_DISTRICT_TABLE") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("failed to read district table {path}: {e}"));
            let resolver = DirectoryResolver::from_json(&json)
                .unwrap_or_else(|e| panic!("invalid district table {path}: {e}"));
            tracing::info!(path, "loaded district table");
            Arc::new(resolver)
        }
        Err(_) => {
            tracing::warn!(
                "CIVIQ_DISTRICT_TABLE not set, residency issuance will reject every address"
            );
            Arc::new(DirectoryResolver::new(Default::default()))
        }
    };

    let intake_url = std::env::var("CIVIQ_INTAKE_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8091".to_string());
    let transport = HttpIntakeTransport::new(intake_url, Duration::from_secs(10))
        .expect("failed to build intake transport");

    let db_pool = db::init_pool().await.expect("database initialization failed");

    let state = AppState::new(
        config.clone(),
        signing_key,
        resolver,
        Arc::new(key_holder),
        Arc::new(transport),
        db_pool,
    );

    hydrate(&state).await.expect("state hydration failed");

    let app = app(state);
    tracing::info!(addr = %config.bind_addr, "civiq-api listening");

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}

/// Read a 32-byte key from a hex env var; `None` when unset. Panics on
/// malformed values so a typo never silently downgrades to an ephemeral
/// key.
fn load_key_hex(var: &str) -> Option<[u8; 32]> {
    let hex_str = std::env::var(var).ok()?;
    let bytes = hex::decode(hex_str.trim()).unwrap_or_else(|e| panic!("{var} is not hex: {e}"));
    let arr: [u8; 32] = bytes
        .try_into()
        .unwrap_or_else(|_| panic!("{var} must be exactly 32 bytes"));
    Some(arr)
}
