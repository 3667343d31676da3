//! # civiq-membership
//!
//! Anonymous membership proving. A registered identity commitment sits as
//! a leaf in a per-region cell tree; cell roots roll up into one global
//! root. Proving membership for an action assembles a witness (tree path
//! plus district and action domain), derives the per-action nullifier,
//! delegates proof generation to an external proving engine, and
//! cross-validates the engine's nullifier against the independently
//! derived one before anything leaves this crate.
//!
//! Nullifier uniqueness is the sole Sybil-resistance mechanism once the
//! identity is hidden behind a proof, so recording a nullifier is a
//! single atomic insert-or-reject, never a read-then-write pair.

pub mod error;
pub mod nullifier_registry;
pub mod prover;
pub mod tree;
pub mod witness;

pub use error::MembershipError;
pub use nullifier_registry::NullifierRegistry;
pub use prover::{MembershipProver, MockProvingEngine, ProofBundle, ProvingEngine};
pub use tree::{CellId, CellTree, InclusionPath, MembershipRegistration, MembershipRegistry};
pub use witness::{build_witness, Witness};
