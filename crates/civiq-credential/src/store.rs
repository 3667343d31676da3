//! Client-side credential store, keyed by credential kind. A holder keeps
//! at most one live credential of each kind; storing a newer one replaces
//! the old.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::claims::CredentialKind;
use crate::credential::Credential;

/// Per-holder credential store.
#[derive(Debug, Default)]
pub struct CredentialStore {
    credentials: DashMap<CredentialKind, Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a credential under its kind, replacing any previous one.
    /// Returns the credential it replaced, if any.
    pub fn store(&self, credential: Credential) -> Option<Credential> {
        self.credentials.insert(credential.kind(), credential)
    }

    /// The stored credential of the given kind, if any.
    pub fn get(&self, kind: CredentialKind) -> Option<Credential> {
        self.credentials.get(&kind).map(|c| c.clone())
    }

    /// All stored credentials, in no particular order.
    pub fn list(&self) -> Vec<Credential> {
        self.credentials.iter().map(|c| c.clone()).collect()
    }

    /// Drop every credential whose base validity window has passed.
    /// Returns the number removed.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.credentials.len();
        self.credentials.retain(|_, c| !c.is_expired_at(now));
        before - self.credentials.len()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
