//! Nullifier uniqueness registry.
//!
//! One nullifier per `(identity, action)` pair, ever. Recording is a
//! single atomic insert-or-reject through the map's entry API; there is
//! no separate read check that a concurrent writer could race past.

use civiq_core::SubmissionId;
use civiq_crypto::Nullifier;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::MembershipError;

/// In-memory nullifier registry. A database-backed deployment enforces
/// the same contract with a unique-key insert.
#[derive(Debug, Default)]
pub struct NullifierRegistry {
    entries: DashMap<Nullifier, SubmissionId>,
}

impl NullifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a nullifier for a submission. Rejects atomically when the
    /// nullifier already exists; a collision means a second submission
    /// for the same identity and action, and is never retried.
    pub fn record(
        &self,
        nullifier: Nullifier,
        submission: SubmissionId,
    ) -> Result<(), MembershipError> {
        match self.entries.entry(nullifier) {
            Entry::Occupied(existing) => {
                tracing::warn!(
                    nullifier = %nullifier,
                    submission = %submission,
                    prior_submission = %existing.get(),
                    security = true,
                    "duplicate nullifier rejected"
                );
                Err(MembershipError::NullifierCollision { nullifier })
            }
            Entry::Vacant(slot) => {
                slot.insert(submission);
                Ok(())
            }
        }
    }

    /// All recorded pairs, for persistence sync.
    pub fn snapshot(&self) -> Vec<(Nullifier, SubmissionId)> {
        self.entries
            .iter()
            .map(|e| (*e.key(), *e.value()))
            .collect()
    }

    /// The submission that recorded this nullifier, if any.
    pub fn lookup(&self, nullifier: &Nullifier) -> Option<SubmissionId> {
        self.entries.get(nullifier).map(|e| *e.value())
    }

    pub fn contains(&self, nullifier: &Nullifier) -> bool {
        self.entries.contains_key(nullifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
