//! # SHA-256 Digest Computation
//!
//! Produces [`ContentDigest`] values from [`CanonicalBytes`]. The function
//! signature requires `CanonicalBytes` — not raw `&[u8]` — so every digest
//! in the workspace was computed from properly canonicalized data.
//!
//! [`Sha256Accumulator`] exists for the few places that hash composites of
//! canonical bytes and raw binary material (proof transcripts, Merkle
//! nodes); each call site documents why the accumulator is needed.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A 32-byte SHA-256 content digest, hex-encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let raw = hex::decode(s)?;
        let arr: [u8; 32] = raw
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }

    /// Hex encoding of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Access the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
///
/// This is the standard digest computation path. The input must be
/// [`CanonicalBytes`] — raw byte slices are not accepted.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    ContentDigest(hasher.finalize().into())
}

/// Incremental SHA-256 accumulator for composite inputs.
///
/// Used where canonical JSON bytes are concatenated with raw binary
/// material before hashing. Prefer [`sha256_digest`] everywhere else.
pub struct Sha256Accumulator {
    hasher: Sha256,
}

impl Sha256Accumulator {
    /// Start a fresh accumulator.
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Feed bytes into the accumulator.
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Finalize into a [`ContentDigest`].
    pub fn finalize(self) -> ContentDigest {
        ContentDigest(self.hasher.finalize().into())
    }

    /// Finalize and hex-encode.
    pub fn finalize_hex(self) -> String {
        self.finalize().to_hex()
    }
}

impl Default for Sha256Accumulator {
    fn default() -> Self {
        Self::new()
    }
}
