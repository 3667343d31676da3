//! # Witness Key Custody
//!
//! The recipient secret key for the witness cipher is held by a minimal
//! trusted component. [`WitnessKeyHolder`] abstracts over who that is: a
//! plain in-process software holder, or a hardware-isolated one reached
//! over an attested channel. The sealed envelope wire format is identical
//! either way, so holders are swappable without protocol changes.

use crate::error::CryptoError;
use crate::sealed::{open, RecipientKeyPair, RecipientPublicKey, RecipientSecretKey, SealedEnvelope};

/// The party able to open sealed witness envelopes.
///
/// Implementations hold the recipient secret key and nothing else about
/// the pipeline. Decryption failures surface as the generic
/// [`CryptoError::AuthenticationFailure`].
pub trait WitnessKeyHolder: Send + Sync {
    /// The public key senders seal envelopes to.
    fn public_key(&self) -> RecipientPublicKey;

    /// Open a sealed envelope, returning the plaintext payload.
    fn open_envelope(&self, envelope: &SealedEnvelope) -> Result<Vec<u8>, CryptoError>;
}

/// In-process software key holder.
///
/// Suitable for development and for deployments without hardware
/// isolation. The secret key is zeroized on drop.
pub struct SoftwareKeyHolder {
    secret: RecipientSecretKey,
    public: RecipientPublicKey,
}

impl SoftwareKeyHolder {
    /// Generate a holder with a fresh key pair.
    pub fn generate() -> Self {
        let RecipientKeyPair { secret, public } = RecipientKeyPair::generate();
        Self { secret, public }
    }

    /// Construct a holder around an existing secret key.
    pub fn from_secret(secret: RecipientSecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }
}

impl WitnessKeyHolder for SoftwareKeyHolder {
    fn public_key(&self) -> RecipientPublicKey {
        self.public.clone()
    }

    fn open_envelope(&self, envelope: &SealedEnvelope) -> Result<Vec<u8>, CryptoError> {
        open(envelope, &self.secret)
    }
}

impl std::fmt::Debug for SoftwareKeyHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareKeyHolder")
            .field("public_key", &self.public.to_hex())
            .finish_non_exhaustive()
    }
}
