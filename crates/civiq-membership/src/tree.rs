//! Two-level Merkle membership structure.
//!
//! Identity commitments live as leaves in per-region cell trees; each
//! cell's root becomes a leaf of the global tree. Registering a new
//! commitment appends a leaf and recomputes the affected roots, but never
//! mutates an existing leaf, so an issued registration stays valid as the
//! trees around it grow.
//!
//! Node hashing is SHA-256 over the sorted concatenation of the two
//! child hashes, which makes path verification order-independent. Odd
//! levels promote the unpaired node unchanged.

use chrono::{DateTime, Utc};
use civiq_core::{IdentityCommitment, Sha256Accumulator};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::MembershipError;

/// A regional cell identifier, lowercase `[a-z0-9.-]`, at most 64 chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct CellId(String);

impl CellId {
    pub fn new(value: impl Into<String>) -> Result<Self, MembershipError> {
        let s = value.into();
        let valid = !s.is_empty()
            && s.len() <= 64
            && s.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-');
        if !valid {
            return Err(MembershipError::Validation(format!(
                "invalid cell id: {s:?}"
            )));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CellId {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).map_err(|e| e.to_string())
    }
}

impl From<CellId> for String {
    fn from(id: CellId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn hash_leaf(commitment: &IdentityCommitment) -> [u8; 32] {
    let mut acc = Sha256Accumulator::new();
    acc.update(&commitment.to_bytes());
    *acc.finalize().as_bytes()
}

fn hash_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut acc = Sha256Accumulator::new();
    acc.update(lo);
    acc.update(hi);
    *acc.finalize().as_bytes()
}

/// Merkle root and sibling path over a list of leaf hashes. The unpaired
/// node of an odd level is promoted unchanged.
fn merkle_root(leaves: &[[u8; 32]]) -> Option<[u8; 32]> {
    if leaves.is_empty() {
        return None;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => hash_pair(a, b),
                [a] => *a,
                _ => unreachable!("chunks(2) yields 1 or 2 elements"),
            })
            .collect();
    }
    Some(level[0])
}

/// Sibling hashes from `index` up to the root, skipping levels where the
/// node is promoted unpaired.
fn merkle_path(leaves: &[[u8; 32]], mut index: usize) -> Option<Vec<[u8; 32]>> {
    if index >= leaves.len() {
        return None;
    }
    let mut path = Vec::new();
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        let sibling = if index % 2 == 0 { index + 1 } else { index - 1 };
        if sibling < level.len() {
            path.push(level[sibling]);
        }
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => hash_pair(a, b),
                [a] => *a,
                _ => unreachable!("chunks(2) yields 1 or 2 elements"),
            })
            .collect();
        index /= 2;
    }
    Some(path)
}

/// Fold a leaf hash through a sibling path.
fn apply_path(leaf: [u8; 32], path: &[[u8; 32]]) -> [u8; 32] {
    path.iter().fold(leaf, |acc, sibling| hash_pair(&acc, sibling))
}

/// One per-region Merkle tree of identity commitments.
#[derive(Debug, Clone, Default)]
pub struct CellTree {
    leaves: Vec<[u8; 32]>,
}

impl CellTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commitment leaf; returns its index. Existing leaves are
    /// untouched.
    pub fn append(&mut self, commitment: &IdentityCommitment) -> usize {
        self.leaves.push(hash_leaf(commitment));
        self.leaves.len() - 1
    }

    pub fn root(&self) -> Option<[u8; 32]> {
        merkle_root(&self.leaves)
    }

    pub fn path(&self, leaf_index: usize) -> Option<Vec<[u8; 32]>> {
        merkle_path(&self.leaves, leaf_index)
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

/// A leaf entry linking an identity commitment to its tree position.
/// Immutable once created; later registrations elsewhere change roots,
/// never this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRegistration {
    pub identity_commitment: IdentityCommitment,
    pub cell_id: CellId,
    pub leaf_index: usize,
    pub registered_at: DateTime<Utc>,
}

/// The full inclusion evidence for one registration: leaf hash, path to
/// the cell root, the cell root's path to the global root, and both
/// roots as of path construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionPath {
    pub leaf: [u8; 32],
    pub cell_path: Vec<[u8; 32]>,
    pub cell_root: [u8; 32],
    pub cell_index: usize,
    pub global_path: Vec<[u8; 32]>,
    pub global_root: [u8; 32],
}

impl InclusionPath {
    /// Recompute both tree levels from the leaf and compare against the
    /// recorded roots.
    pub fn verify(&self) -> bool {
        apply_path(self.leaf, &self.cell_path) == self.cell_root
            && apply_path(self.cell_root, &self.global_path) == self.global_root
    }
}

/// All cells, keyed by [`CellId`]. Registration appends to one cell;
/// roots are recomputed from current leaves whenever a path or root is
/// requested, so they always reflect the latest registrations.
#[derive(Debug, Default)]
pub struct MembershipRegistry {
    cells: DashMap<CellId, CellTree>,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a commitment in a cell, creating the cell on first use.
    pub fn register(
        &self,
        commitment: IdentityCommitment,
        cell_id: CellId,
    ) -> MembershipRegistration {
        let mut cell = self.cells.entry(cell_id.clone()).or_default();
        let leaf_index = cell.append(&commitment);
        drop(cell);

        tracing::debug!(cell = %cell_id, leaf_index, "membership registered");
        MembershipRegistration {
            identity_commitment: commitment,
            cell_id,
            leaf_index,
            registered_at: Utc::now(),
        }
    }

    /// Cell roots in cell-id order; these are the global tree's leaves.
    fn cell_roots(&self) -> Vec<(CellId, [u8; 32])> {
        let mut roots: Vec<(CellId, [u8; 32])> = self
            .cells
            .iter()
            .filter_map(|e| e.value().root().map(|r| (e.key().clone(), r)))
            .collect();
        roots.sort_by(|a, b| a.0.cmp(&b.0));
        roots
    }

    /// Current global root, if any cell has a leaf.
    pub fn global_root(&self) -> Option<[u8; 32]> {
        let roots: Vec<[u8; 32]> = self.cell_roots().into_iter().map(|(_, r)| r).collect();
        merkle_root(&roots)
    }

    /// Inclusion evidence for a registration, or `None` when the
    /// registration's cell or leaf is not (yet) present.
    pub fn inclusion_path(&self, registration: &MembershipRegistration) -> Option<InclusionPath> {
        let cell = self.cells.get(&registration.cell_id)?;
        let cell_path = cell.path(registration.leaf_index)?;
        let cell_root = cell.root()?;
        let leaf = hash_leaf(&registration.identity_commitment);
        drop(cell);

        let roots = self.cell_roots();
        let cell_index = roots
            .iter()
            .position(|(id, _)| *id == registration.cell_id)?;
        let root_hashes: Vec<[u8; 32]> = roots.into_iter().map(|(_, r)| r).collect();
        let global_path = merkle_path(&root_hashes, cell_index)?;
        let global_root = merkle_root(&root_hashes)?;

        Some(InclusionPath {
            leaf,
            cell_path,
            cell_root,
            cell_index,
            global_path,
            global_root,
        })
    }

    /// Whether a registration currently has confirmed tree inclusion.
    pub fn is_included(&self, registration: &MembershipRegistration) -> bool {
        self.inclusion_path(registration).is_some()
    }
}
