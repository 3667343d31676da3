//! # Sealed-Box Witness Cipher
//!
//! Authenticated encryption of proof payloads to a recipient public key.
//! This is the one point in the system where plaintext personal data
//! (delivery address, message body) exists outside the sender's device,
//! so confidentiality never depends on the transport.
//!
//! ## Construction
//!
//! - Fresh ephemeral X25519 key pair per seal; the ephemeral secret is
//!   consumed by the Diffie–Hellman exchange and zeroized immediately.
//! - Symmetric key = BLAKE2b-512(tag ‖ shared ‖ ephemeral_pub ‖
//!   recipient_pub), truncated to 32 bytes. Binding both public keys into
//!   the derivation prevents key-substitution across envelopes.
//! - XChaCha20-Poly1305 with a random 24-byte nonce seals the plaintext.
//!   The full-width nonce makes random generation safe without counters.
//!
//! ## Failure behavior
//!
//! [`open`] returns the generic
//! [`CryptoError::AuthenticationFailure`] for every decryption failure —
//! tag mismatch, truncation, wrong key — and never partial plaintext.

use blake2::{Blake2b512, Digest};
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{Key, KeyInit, XChaCha20Poly1305, XNonce};
use rand_core::{CryptoRngCore, OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// XChaCha20-Poly1305 nonce length (24 bytes).
pub const NONCE_LEN: usize = 24;

/// X25519 public key length (32 bytes).
pub const PUBLIC_KEY_LEN: usize = 32;

/// Domain-separation tag for envelope key derivation.
const ENVELOPE_KDF_TAG: &[u8] = b"civiq.envelope.v1";

/// An X25519 public key identifying an envelope recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientPublicKey {
    inner: x25519_dalek::PublicKey,
}

impl RecipientPublicKey {
    /// Wrap raw public key bytes.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self {
            inner: x25519_dalek::PublicKey::from(bytes),
        }
    }

    /// Parse from 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(s).map_err(|e| CryptoError::HexDecode(e.to_string()))?;
        let arr: [u8; PUBLIC_KEY_LEN] = raw
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::InvalidPublicKey(format!("{} bytes", v.len())))?;
        Ok(Self::from_bytes(arr))
    }

    /// Hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.inner.as_bytes())
    }

    /// Access the raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        self.inner.as_bytes()
    }
}

/// An X25519 secret key held by the decrypting party only.
///
/// The underlying secret is zeroized on drop.
pub struct RecipientSecretKey {
    inner: x25519_dalek::StaticSecret,
}

impl RecipientSecretKey {
    /// Generate a fresh secret key.
    pub fn generate<R: CryptoRngCore>(csprng: &mut R) -> Self {
        Self {
            inner: x25519_dalek::StaticSecret::random_from_rng(csprng),
        }
    }

    /// Reconstruct from raw secret bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self {
            inner: x25519_dalek::StaticSecret::from(bytes),
        }
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> RecipientPublicKey {
        RecipientPublicKey {
            inner: x25519_dalek::PublicKey::from(&self.inner),
        }
    }
}

impl std::fmt::Debug for RecipientSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secret bytes never appear in debug output.
        f.debug_struct("RecipientSecretKey").finish_non_exhaustive()
    }
}

/// A recipient key pair (generation convenience).
pub struct RecipientKeyPair {
    /// The secret half, held only by the decrypting party.
    pub secret: RecipientSecretKey,
    /// The public half, distributed to senders.
    pub public: RecipientPublicKey,
}

impl RecipientKeyPair {
    /// Generate a fresh key pair.
    pub fn generate() -> Self {
        let secret = RecipientSecretKey::generate(&mut OsRng);
        let public = secret.public_key();
        Self { secret, public }
    }
}

/// The sealed envelope wire format: ciphertext, nonce, and the ephemeral
/// public key the recipient needs to mirror the derivation.
///
/// This format is fixed regardless of who holds the recipient secret
/// (plain service or hardware-isolated holder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// XChaCha20-Poly1305 ciphertext including the 16-byte tag.
    #[serde(with = "hex_vec")]
    pub ciphertext: Vec<u8>,

    /// Random 24-byte nonce.
    #[serde(with = "hex_arr_24")]
    pub nonce: [u8; NONCE_LEN],

    /// Ephemeral X25519 public key for this envelope.
    #[serde(with = "hex_arr_32")]
    pub ephemeral_public_key: [u8; PUBLIC_KEY_LEN],
}

/// Seal a plaintext to a recipient public key.
///
/// Generates a fresh ephemeral key pair per call. The ephemeral secret is
/// consumed by the Diffie–Hellman exchange and zeroized before this
/// function returns; only the ephemeral public key travels with the
/// ciphertext.
pub fn seal(plaintext: &[u8], recipient: &RecipientPublicKey) -> Result<SealedEnvelope, CryptoError> {
    let ephemeral_secret = x25519_dalek::EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral_secret);

    // diffie_hellman consumes the ephemeral secret; it is zeroized here.
    let shared = ephemeral_secret.diffie_hellman(&recipient.inner);

    let key = derive_envelope_key(
        shared.as_bytes(),
        ephemeral_public.as_bytes(),
        recipient.as_bytes(),
    );

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::SealFailed(e.to_string()))?;

    Ok(SealedEnvelope {
        ciphertext,
        nonce,
        ephemeral_public_key: *ephemeral_public.as_bytes(),
    })
}

/// Open a sealed envelope with the recipient secret key.
///
/// Mirrors the key derivation exactly. Every failure maps to the generic
/// [`CryptoError::AuthenticationFailure`]; no partial plaintext escapes.
pub fn open(
    envelope: &SealedEnvelope,
    recipient_secret: &RecipientSecretKey,
) -> Result<Vec<u8>, CryptoError> {
    let ephemeral_public = x25519_dalek::PublicKey::from(envelope.ephemeral_public_key);
    let shared = recipient_secret.inner.diffie_hellman(&ephemeral_public);

    let key = derive_envelope_key(
        shared.as_bytes(),
        &envelope.ephemeral_public_key,
        recipient_secret.public_key().as_bytes(),
    );

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
    cipher
        .decrypt(XNonce::from_slice(&envelope.nonce), envelope.ciphertext.as_ref())
        .map_err(|_| CryptoError::AuthenticationFailure)
}

/// Derive the 32-byte envelope key from the shared secret and both public
/// keys. The derived key is zeroized on drop.
fn derive_envelope_key(
    shared: &[u8; 32],
    ephemeral_public: &[u8; 32],
    recipient_public: &[u8; 32],
) -> Zeroizing<[u8; 32]> {
    let mut hasher = Blake2b512::new();
    hasher.update(ENVELOPE_KDF_TAG);
    hasher.update(shared);
    hasher.update(ephemeral_public);
    hasher.update(recipient_public);
    let wide = hasher.finalize();

    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&wide[..32]);
    key
}

/// Serde helpers for hex-encoded byte fields.
mod hex_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

macro_rules! hex_arr_mod {
    ($name:ident, $len:expr) => {
        mod $name {
            use serde::{Deserialize, Deserializer, Serializer};

            pub fn serialize<S: Serializer>(
                bytes: &[u8; $len],
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(bytes))
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(
                deserializer: D,
            ) -> Result<[u8; $len], D::Error> {
                let s = String::deserialize(deserializer)?;
                let raw = hex::decode(&s).map_err(serde::de::Error::custom)?;
                raw.try_into()
                    .map_err(|v: Vec<u8>| serde::de::Error::custom(format!(
                        "expected {} bytes, got {}",
                        $len,
                        v.len()
                    )))
            }
        }
    };
}

hex_arr_mod!(hex_arr_24, 24);
hex_arr_mod!(hex_arr_32, 32);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn seal_open_roundtrip() {
        let pair = RecipientKeyPair::generate();
        let plaintext = b"proof payload with delivery address";
        let envelope = seal(plaintext, &pair.public).unwrap();
        let opened = open(&envelope, &pair.secret).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn open_fails_with_wrong_key() {
        let pair = RecipientKeyPair::generate();
        let other = RecipientKeyPair::generate();
        let envelope = seal(b"secret", &pair.public).unwrap();
        assert!(matches!(
            open(&envelope, &other.secret),
            Err(CryptoError::AuthenticationFailure)
        ));
    }

    #[test]
    fn bit_flip_in_ciphertext_fails_closed() {
        let pair = RecipientKeyPair::generate();
        let mut envelope = seal(b"payload", &pair.public).unwrap();
        envelope.ciphertext[0] ^= 0x01;
        assert!(matches!(
            open(&envelope, &pair.secret),
            Err(CryptoError::AuthenticationFailure)
        ));
    }

    #[test]
    fn bit_flip_in_nonce_fails_closed() {
        let pair = RecipientKeyPair::generate();
        let mut envelope = seal(b"payload", &pair.public).unwrap();
        envelope.nonce[0] ^= 0x01;
        assert!(matches!(
            open(&envelope, &pair.secret),
            Err(CryptoError::AuthenticationFailure)
        ));
    }

    #[test]
    fn tampered_ephemeral_key_fails_closed() {
        let pair = RecipientKeyPair::generate();
        let mut envelope = seal(b"payload", &pair.public).unwrap();
        envelope.ephemeral_public_key[5] ^= 0xff;
        assert!(open(&envelope, &pair.secret).is_err());
    }

    #[test]
    fn envelopes_are_unique_per_seal() {
        // Fresh ephemeral key and nonce per call: sealing the same
        // plaintext twice never produces the same envelope.
        let pair = RecipientKeyPair::generate();
        let e1 = seal(b"same plaintext", &pair.public).unwrap();
        let e2 = seal(b"same plaintext", &pair.public).unwrap();
        assert_ne!(e1.ephemeral_public_key, e2.ephemeral_public_key);
        assert_ne!(e1.nonce, e2.nonce);
        assert_ne!(e1.ciphertext, e2.ciphertext);
    }

    #[test]
    fn envelope_serde_roundtrip() {
        let pair = RecipientKeyPair::generate();
        let envelope = seal(b"wire format", &pair.public).unwrap();
        let json = serde_json::to_string(&envelope).unwrap();
        let decoded: SealedEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(envelope, decoded);
        assert_eq!(open(&decoded, &pair.secret).unwrap(), b"wire format");
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let pair = RecipientKeyPair::generate();
        let envelope = seal(b"", &pair.public).unwrap();
        assert_eq!(open(&envelope, &pair.secret).unwrap(), b"");
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let pair = RecipientKeyPair::generate();
        let parsed = RecipientPublicKey::from_hex(&pair.public.to_hex()).unwrap();
        assert_eq!(pair.public, parsed);
    }

    #[test]
    fn secret_key_debug_hides_bytes() {
        let secret = RecipientSecretKey::from_bytes([9u8; 32]);
        let debug = format!("{secret:?}");
        assert!(!debug.contains('9'));
    }

    proptest! {
        #[test]
        fn roundtrip_for_arbitrary_plaintext(plaintext in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let pair = RecipientKeyPair::generate();
            let envelope = seal(&plaintext, &pair.public).unwrap();
            prop_assert_eq!(open(&envelope, &pair.secret).unwrap(), plaintext);
        }

        #[test]
        fn any_ciphertext_bit_flip_fails(
            plaintext in proptest::collection::vec(any::<u8>(), 1..256),
            flip_bit in 0usize..8,
        ) {
            let pair = RecipientKeyPair::generate();
            let mut envelope = seal(&plaintext, &pair.public).unwrap();
            let idx = plaintext.len() % envelope.ciphertext.len();
            envelope.ciphertext[idx] ^= 1 << flip_bit;
            prop_assert!(open(&envelope, &pair.secret).is_err());
        }
    }
}
