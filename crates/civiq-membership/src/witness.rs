//! Witness assembly.
//!
//! A witness is the full input the proving engine needs: the leaf and
//! both tree paths from a confirmed registration, the district claimed
//! by the credential, and the action domain the proof will be bound to.

use civiq_core::{ActionDomain, DistrictCode};
use civiq_credential::Credential;
use serde::{Deserialize, Serialize};

use crate::error::MembershipError;
use crate::tree::{InclusionPath, MembershipRegistration, MembershipRegistry};

/// Prover input for one membership proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub identity_commitment: civiq_core::IdentityCommitment,
    pub inclusion: InclusionPath,
    pub district: DistrictCode,
    pub action_domain: ActionDomain,
}

/// Assemble a witness from a credential and a registration.
///
/// Fails with [`MembershipError::IncompleteRegistration`] when the
/// registration has no confirmed tree inclusion, and with
/// [`MembershipError::Validation`] when the credential carries no
/// district claim or its commitment does not match the registration.
pub fn build_witness(
    credential: &Credential,
    registration: &MembershipRegistration,
    registry: &MembershipRegistry,
    action_domain: ActionDomain,
) -> Result<Witness, MembershipError> {
    let district = credential.claims.district().cloned().ok_or_else(|| {
        MembershipError::Validation(format!(
            "credential kind {} carries no district claim",
            credential.kind()
        ))
    })?;

    if let Some(commitment) = credential.claims.identity_commitment() {
        if *commitment != registration.identity_commitment {
            return Err(MembershipError::Validation(
                "credential commitment does not match registration".to_string(),
            ));
        }
    }

    let inclusion = registry
        .inclusion_path(registration)
        .ok_or(MembershipError::IncompleteRegistration)?;

    Ok(Witness {
        identity_commitment: registration.identity_commitment.clone(),
        inclusion,
        district,
        action_domain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::CellId;
    use chrono::{Duration, Utc};
    use civiq_core::{IdentityCommitment, SubjectId};
    use civiq_credential::{CredentialClaims, CredentialIssuer, DocumentType};
    use civiq_crypto::SigningKey;
    use rand_core::OsRng;

    fn commitment() -> IdentityCommitment {
        IdentityCommitment::new("a".repeat(64)).unwrap()
    }

    fn issuer() -> CredentialIssuer {
        CredentialIssuer::new("civiq.issuer.test", SigningKey::generate(&mut OsRng))
    }

    fn residency_credential() -> Credential {
        issuer()
            .issue(
                SubjectId::new(),
                CredentialClaims::DistrictResidency {
                    congressional_district: DistrictCode::new("CA-12").unwrap(),
                    local_districts: vec![],
                },
                Duration::days(90),
            )
            .unwrap()
    }

    fn domain() -> ActionDomain {
        ActionDomain::new("congress.hr1.support").unwrap()
    }

    #[test]
    fn builds_witness_for_confirmed_registration() {
        let registry = MembershipRegistry::new();
        let reg = registry.register(commitment(), CellId::new("ca-12").unwrap());

        let witness =
            build_witness(&residency_credential(), &reg, &registry, domain()).unwrap();
        assert!(witness.inclusion.verify());
        assert_eq!(witness.district.as_str(), "CA-12");
        assert_eq!(witness.identity_commitment, commitment());
    }

    #[test]
    fn unconfirmed_registration_is_incomplete() {
        let registry = MembershipRegistry::new();
        let phantom = MembershipRegistration {
            identity_commitment: commitment(),
            cell_id: CellId::new("ca-12").unwrap(),
            leaf_index: 0,
            registered_at: Utc::now(),
        };
        let result = build_witness(&residency_credential(), &phantom, &registry, domain());
        assert!(matches!(
            result,
            Err(MembershipError::IncompleteRegistration)
        ));
    }

    #[test]
    fn identity_credential_without_district_rejected() {
        let registry = MembershipRegistry::new();
        let reg = registry.register(commitment(), CellId::new("ca-12").unwrap());
        let credential = issuer()
            .issue(
                SubjectId::new(),
                CredentialClaims::Identity {
                    identity_commitment: commitment(),
                    document_type: DocumentType::Passport,
                },
                Duration::days(365),
            )
            .unwrap();
        let result = build_witness(&credential, &reg, &registry, domain());
        assert!(matches!(result, Err(MembershipError::Validation(_))));
    }

    #[test]
    fn government_credential_builds_witness() {
        let registry = MembershipRegistry::new();
        let other = IdentityCommitment::new("b".repeat(64)).unwrap();
        let reg = registry.register(other.clone(), CellId::new("ca-12").unwrap());
        let credential = issuer()
            .issue(
                SubjectId::new(),
                CredentialClaims::Government {
                    district: DistrictCode::new("CA-12").unwrap(),
                    issuer_chain: "gov.root/ca".to_string(),
                },
                Duration::days(365),
            )
            .unwrap();
        let witness = build_witness(&credential, &reg, &registry, domain()).unwrap();
        assert_eq!(witness.identity_commitment, other);
    }
}
