//! Ciphertext transport
//!
//! Moves serialized homomorphic ciphertexts across a boundary whose
//! asymmetric cipher accepts at most `chunk_max` bytes per operation
//! (RSA-OAEP with SHA-256). See [`seal`] for the chunking rules and
//! [`SealedChannel`] for the addressed in-memory exchange.

mod channel;
mod seal;

pub use channel::SealedChannel;
pub use seal::{key_chunk_max, open, seal, SealedCiphertext};

use rand::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::{PprlError, Result};
use crate::params::TransportParams;
use crate::scheme::HomomorphicScheme;

/// RSA keypair used to seal ciphertexts in transit
#[derive(Clone)]
pub struct TransportKeys {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl TransportKeys {
    /// Generate a fresh keypair of `params.key_bits`
    pub fn generate<R: RngCore + CryptoRng>(params: &TransportParams, rng: &mut R) -> Result<Self> {
        params
            .validate()
            .map_err(|e| PprlError::InvalidParameters(e.to_string()))?;
        let private_key = RsaPrivateKey::new(rng, params.key_bits)
            .map_err(|e| PprlError::transport(format!("key generation: {}", e)))?;
        Ok(Self::from_private_key(private_key))
    }

    /// Wrap an existing private key
    pub fn from_private_key(private_key: RsaPrivateKey) -> Self {
        let public_key = RsaPublicKey::from(&private_key);
        Self {
            private_key,
            public_key,
        }
    }

    /// Public half, handed to whoever seals
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Private half, kept by whoever opens
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Largest plaintext chunk per OAEP operation
    pub fn chunk_max(&self) -> usize {
        key_chunk_max(&self.public_key)
    }

    /// Seal raw bytes under the public key
    pub fn seal<R: RngCore + CryptoRng>(&self, bytes: &[u8], rng: &mut R) -> Result<SealedCiphertext> {
        seal(bytes, &self.public_key, rng)
    }

    /// Open a sealed byte stream with the private key
    pub fn open(&self, sealed: &SealedCiphertext) -> Result<Vec<u8>> {
        open(sealed, &self.private_key)
    }
}

impl std::fmt::Debug for TransportKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportKeys")
            .field("key_bytes", &self.public_key.size())
            .finish_non_exhaustive()
    }
}

/// Serialize a homomorphic ciphertext and seal its bytes
pub fn seal_ciphertext<S, R>(
    scheme: &S,
    ct: &S::Ciphertext,
    keys: &TransportKeys,
    rng: &mut R,
) -> Result<SealedCiphertext>
where
    S: HomomorphicScheme,
    R: RngCore + CryptoRng,
{
    let bytes = scheme.serialize(ct)?;
    keys.seal(&bytes, rng)
}

/// Open sealed bytes and deserialize them into a ciphertext
pub fn open_ciphertext<S: HomomorphicScheme>(
    scheme: &S,
    sealed: &SealedCiphertext,
    keys: &TransportKeys,
) -> Result<S::Ciphertext> {
    let bytes = keys.open(sealed)?;
    scheme.deserialize(&bytes)
}

#[cfg(test)]
pub(crate) fn test_keys() -> &'static TransportKeys {
    use std::sync::OnceLock;

    static KEYS: OnceLock<TransportKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        TransportKeys::generate(&TransportParams::default(), &mut rand::thread_rng())
            .expect("RSA key generation")
    })
}

/// Keys whose private half does not match the public half, so every open fails
#[cfg(test)]
pub(crate) fn mismatched_test_keys() -> TransportKeys {
    let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("RSA key generation");
    TransportKeys {
        private_key,
        public_key: test_keys().public_key.clone(),
    }
}
