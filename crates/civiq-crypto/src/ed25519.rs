//! # Ed25519 Signing and Verification
//!
//! Thin wrappers over `ed25519-dalek` whose signing and verification
//! methods accept only [`CanonicalBytes`]. A signature in this workspace
//! can therefore only ever cover properly canonicalized data — there is
//! no API surface that signs raw bytes.

use civiq_core::CanonicalBytes;
use ed25519_dalek::{Signer, Verifier};
use rand_core::CryptoRngCore;

use crate::error::CryptoError;

/// An Ed25519 signing (private) key.
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl SigningKey {
    /// Generate a fresh signing key from a cryptographically secure RNG.
    pub fn generate<R: CryptoRngCore>(csprng: &mut R) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::generate(csprng),
        }
    }

    /// Reconstruct a signing key from its 32 secret bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(bytes),
        }
    }

    /// The corresponding verifying (public) key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Sign canonical bytes.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        Ed25519Signature {
            inner: self.inner.sign(data.as_bytes()),
        }
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secret bytes never appear in debug output.
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

/// An Ed25519 verifying (public) key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

impl VerifyingKey {
    /// Verify a signature over canonical bytes.
    pub fn verify(
        &self,
        data: &CanonicalBytes,
        signature: &Ed25519Signature,
    ) -> Result<(), CryptoError> {
        self.inner
            .verify(data.as_bytes(), &signature.inner)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
    }

    /// Hex encoding of the 32 public key bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.inner.as_bytes())
    }

    /// Parse a verifying key from 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(s).map_err(|e| CryptoError::HexDecode(e.to_string()))?;
        let arr: [u8; 32] = raw
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::InvalidPublicKey(format!("{} bytes", v.len())))?;
        let inner = ed25519_dalek::VerifyingKey::from_bytes(&arr)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { inner })
    }
}

/// An Ed25519 signature (64 bytes), hex-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519Signature {
    inner: ed25519_dalek::Signature,
}

impl Ed25519Signature {
    /// Hex encoding of the 64 signature bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.inner.to_bytes())
    }

    /// Parse a signature from 128 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(s).map_err(|e| CryptoError::HexDecode(e.to_string()))?;
        let arr: [u8; 64] = raw
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::InvalidSignatureLength(v.len()))?;
        Ok(Self {
            inner: ed25519_dalek::Signature::from_bytes(&arr),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;
    use serde_json::json;

    fn canonical() -> CanonicalBytes {
        CanonicalBytes::from_value(json!({"claim": "district", "value": "CA-12"})).unwrap()
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let sk = SigningKey::generate(&mut OsRng);
        let sig = sk.sign(&canonical());
        sk.verifying_key().verify(&canonical(), &sig).unwrap();
    }

    #[test]
    fn verification_fails_with_wrong_key() {
        let sk1 = SigningKey::generate(&mut OsRng);
        let sk2 = SigningKey::generate(&mut OsRng);
        let sig = sk1.sign(&canonical());
        assert!(sk2.verifying_key().verify(&canonical(), &sig).is_err());
    }

    #[test]
    fn verification_fails_with_different_data() {
        let sk = SigningKey::generate(&mut OsRng);
        let sig = sk.sign(&canonical());
        let other = CanonicalBytes::from_value(json!({"claim": "other"})).unwrap();
        assert!(sk.verifying_key().verify(&other, &sig).is_err());
    }

    #[test]
    fn signature_hex_roundtrip() {
        let sk = SigningKey::generate(&mut OsRng);
        let sig = sk.sign(&canonical());
        let parsed = Ed25519Signature::from_hex(&sig.to_hex()).unwrap();
        assert_eq!(sig, parsed);
    }

    #[test]
    fn signature_from_hex_rejects_wrong_length() {
        let result = Ed25519Signature::from_hex(&"ab".repeat(10));
        assert!(matches!(
            result,
            Err(CryptoError::InvalidSignatureLength(10))
        ));
    }

    #[test]
    fn verifying_key_hex_roundtrip() {
        let vk = SigningKey::generate(&mut OsRng).verifying_key();
        let parsed = VerifyingKey::from_hex(&vk.to_hex()).unwrap();
        assert_eq!(vk, parsed);
    }

    #[test]
    fn signing_key_debug_hides_secret() {
        let sk = SigningKey::from_bytes(&[42u8; 32]);
        let debug = format!("{sk:?}");
        assert!(!debug.contains("42"));
        assert!(!debug.contains("2a"));
    }
}
