//! Proof generation and cross-validation.
//!
//! The proving engine is an external black box behind [`ProvingEngine`].
//! [`MembershipProver`] derives the expected nullifier *before* calling
//! the engine, holds it in its own immutable binding, and compares the
//! engine's answer against that saved value. The expected value is never
//! the variable the engine result lands in; overwriting it would turn
//! cross-validation into a tautological self-comparison.
//!
//! Any failure here aborts the submission before encryption. No partial
//! proof is ever handed downstream.

use async_trait::async_trait;
use civiq_core::{CanonicalBytes, Sha256Accumulator};
use civiq_crypto::{derive_nullifier, Nullifier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::MembershipError;
use crate::witness::Witness;

/// What a proving engine returns: opaque proof bytes plus the nullifier
/// the proof commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundle {
    #[serde(with = "proof_hex")]
    pub proof_bytes: Vec<u8>,
    pub nullifier: Nullifier,
}

/// External proving engine. Implementations perform potentially slow,
/// potentially remote work; nothing here holds a lock across the call.
#[async_trait]
pub trait ProvingEngine: Send + Sync {
    async fn prove(&self, witness: &Witness) -> Result<ProofBundle, MembershipError>;
}

/// Deterministic, transparent engine for development and testing.
///
/// **NOT PRIVATE.** The "proof" is `SHA256(canonical(witness))`, which
/// anyone can recompute, and the nullifier uses the same public
/// derivation as the prover. It exists so the pipeline can run end to
/// end without a real zero-knowledge backend.
#[derive(Debug, Clone, Default)]
pub struct MockProvingEngine;

#[async_trait]
impl ProvingEngine for MockProvingEngine {
    async fn prove(&self, witness: &Witness) -> Result<ProofBundle, MembershipError> {
        let value = serde_json::to_value(witness)
            .map_err(|e| MembershipError::ProofGeneration(e.to_string()))?;
        let canonical = CanonicalBytes::from_value(value).map_err(|e| {
            MembershipError::ProofGeneration(format!("failed to canonicalize witness: {e}"))
        })?;

        let mut acc = Sha256Accumulator::new();
        acc.update(canonical.as_bytes());
        let proof_bytes = acc.finalize().as_bytes().to_vec();

        Ok(ProofBundle {
            proof_bytes,
            nullifier: derive_nullifier(&witness.identity_commitment, &witness.action_domain),
        })
    }
}

/// Drives proof generation and guards the nullifier cross-check.
pub struct MembershipProver {
    engine: Arc<dyn ProvingEngine>,
}

impl MembershipProver {
    pub fn new(engine: Arc<dyn ProvingEngine>) -> Self {
        Self { engine }
    }

    /// Generate and cross-validate a membership proof.
    ///
    /// The expected nullifier is computed into a distinct immutable
    /// binding before the engine is invoked, then compared against the
    /// nullifier inside the returned bundle.
    pub async fn prove_membership(&self, witness: &Witness) -> Result<ProofBundle, MembershipError> {
        let expected_nullifier =
            derive_nullifier(&witness.identity_commitment, &witness.action_domain);

        let bundle = self.engine.prove(witness).await?;
        cross_validate(&bundle, &expected_nullifier)?;
        Ok(bundle)
    }
}

impl std::fmt::Debug for MembershipProver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipProver").finish_non_exhaustive()
    }
}

/// Compare the bundle's nullifier against the independently derived
/// expectation, in constant time. A mismatch discards the proof.
pub fn cross_validate(
    bundle: &ProofBundle,
    expected_nullifier: &Nullifier,
) -> Result<(), MembershipError> {
    if !bundle.nullifier.ct_eq(expected_nullifier) {
        tracing::warn!(
            expected = %expected_nullifier,
            got = %bundle.nullifier,
            "proof nullifier mismatch, discarding proof"
        );
        return Err(MembershipError::NullifierMismatch);
    }
    Ok(())
}

mod proof_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{CellId, MembershipRegistry};
    use crate::witness::build_witness;
    use chrono::Duration;
    use civiq_core::{ActionDomain, DistrictCode, IdentityCommitment, SubjectId};
    use civiq_credential::{CredentialClaims, CredentialIssuer};
    use civiq_crypto::SigningKey;
    use rand_core::OsRng;

    fn witness() -> Witness {
        let registry = MembershipRegistry::new();
        let commitment = IdentityCommitment::new("a".repeat(64)).unwrap();
        let reg = registry.register(commitment, CellId::new("ca-12").unwrap());
        let issuer = CredentialIssuer::new("civiq.issuer.test", SigningKey::generate(&mut OsRng));
        let credential = issuer
            .issue(
                SubjectId::new(),
                CredentialClaims::DistrictResidency {
                    congressional_district: DistrictCode::new("CA-12").unwrap(),
                    local_districts: vec![],
                },
                Duration::days(90),
            )
            .unwrap();
        build_witness(
            &credential,
            &reg,
            &registry,
            ActionDomain::new("congress.hr1.support").unwrap(),
        )
        .unwrap()
    }

    /// Engine that returns a proof committing to the wrong nullifier.
    struct LyingEngine;

    #[async_trait]
    impl ProvingEngine for LyingEngine {
        async fn prove(&self, _witness: &Witness) -> Result<ProofBundle, MembershipError> {
            Ok(ProofBundle {
                proof_bytes: vec![0u8; 32],
                nullifier: Nullifier::from_bytes([0xee; 32]),
            })
        }
    }

    #[tokio::test]
    async fn mock_engine_proof_cross_validates() {
        let prover = MembershipProver::new(Arc::new(MockProvingEngine));
        let w = witness();
        let bundle = prover.prove_membership(&w).await.unwrap();
        assert_eq!(bundle.proof_bytes.len(), 32);
        assert_eq!(
            bundle.nullifier,
            derive_nullifier(&w.identity_commitment, &w.action_domain)
        );
    }

    #[tokio::test]
    async fn mock_engine_is_deterministic() {
        let engine = MockProvingEngine;
        let w = witness();
        let b1 = engine.prove(&w).await.unwrap();
        let b2 = engine.prove(&w).await.unwrap();
        assert_eq!(b1, b2);
    }

    #[tokio::test]
    async fn wrong_nullifier_is_rejected() {
        let prover = MembershipProver::new(Arc::new(LyingEngine));
        let result = prover.prove_membership(&witness()).await;
        assert!(matches!(result, Err(MembershipError::NullifierMismatch)));
    }

    #[tokio::test]
    async fn engine_failure_propagates() {
        struct FailingEngine;

        #[async_trait]
        impl ProvingEngine for FailingEngine {
            async fn prove(&self, _witness: &Witness) -> Result<ProofBundle, MembershipError> {
                Err(MembershipError::ProofGeneration("circuit offline".into()))
            }
        }

        let prover = MembershipProver::new(Arc::new(FailingEngine));
        let result = prover.prove_membership(&witness()).await;
        assert!(matches!(result, Err(MembershipError::ProofGeneration(_))));
    }

    #[test]
    fn bundle_serde_roundtrip() {
        let bundle = ProofBundle {
            proof_bytes: vec![1, 2, 3],
            nullifier: Nullifier::from_bytes([7; 32]),
        };
        let json = serde_json::to_string(&bundle).unwrap();
        assert!(json.contains("010203"));
        let decoded: ProofBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(bundle, decoded);
    }
}
