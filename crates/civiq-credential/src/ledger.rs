//! # Revocation Ledger
//!
//! Permanent record of revoked credential identifiers. Together with the
//! nullifier registry this is the only shared state in the pipeline that
//! requires true mutual exclusion; everything else is naturally
//! partitioned.

use std::collections::HashSet;

use civiq_core::CredentialId;
use parking_lot::RwLock;

/// Thread-safe set of revoked credential identifiers.
///
/// Revocation is idempotent and permanent — there is no un-revoke
/// operation, and no key rotation is required.
#[derive(Debug, Default)]
pub struct RevocationLedger {
    revoked: RwLock<HashSet<CredentialId>>,
}

impl RevocationLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a credential as permanently revoked. Idempotent.
    pub fn revoke(&self, id: CredentialId) {
        let inserted = self.revoked.write().insert(id);
        if inserted {
            tracing::info!(credential_id = %id, "credential revoked");
        }
    }

    /// Whether a credential has been revoked.
    pub fn is_revoked(&self, id: &CredentialId) -> bool {
        self.revoked.read().contains(id)
    }

    /// Number of revoked credentials.
    pub fn len(&self) -> usize {
        self.revoked.read().len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.revoked.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revoke_is_idempotent() {
        let ledger = RevocationLedger::new();
        let id = CredentialId::new();
        ledger.revoke(id);
        ledger.revoke(id);
        assert!(ledger.is_revoked(&id));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn unrevoked_credentials_pass() {
        let ledger = RevocationLedger::new();
        assert!(!ledger.is_revoked(&CredentialId::new()));
        assert!(ledger.is_empty());
    }
}
