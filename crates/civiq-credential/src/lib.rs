//! # civiq-credential — Verifiable Credentials
//!
//! Issues, verifies, and revokes the signed, typed, expiring claims that
//! back each trust tier:
//!
//! - **District residency** — derived from an address that is never
//!   retained; only the district code and the credential hash persist.
//! - **Identity** — carries the one-way identity commitment produced by a
//!   document verification provider.
//! - **Government** — a government-backed credential with an issuer chain
//!   reference.
//!
//! The issuer enforces a layered TTL policy: every credential has a base
//! validity window, and individual action classes impose tighter freshness
//! requirements re-evaluated at point of use.

pub mod claims;
pub mod credential;
pub mod error;
pub mod issuer;
pub mod ledger;
pub mod provider;
pub mod resolver;
pub mod store;

// Re-export primary types.
pub use claims::{CredentialClaims, CredentialKind, DocumentType};
pub use credential::Credential;
pub use error::CredentialError;
pub use issuer::{ActionClass, CredentialIssuer, RawAddress, VerificationStatus};
pub use ledger::RevocationLedger;
pub use provider::{DocumentVerifier, MockDocumentVerifier, ProviderError};
pub use resolver::{DirectoryResolver, DistrictResolver, ResolverError, StaticResolver};
pub use store::CredentialStore;
