//! Chunked RSA-OAEP sealing
//!
//! A serialized ciphertext is far larger than one OAEP operation accepts, so
//! it is cut into `chunk_max`-byte pieces that are sealed independently. Chunk
//! order is positional: `open` reassembles strictly by index.

use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{PprlError, Result};
use crate::params::{chunk_max, OAEP_HASH_BYTES};

/// Ordered sequence of independently sealed chunks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedCiphertext {
    /// OAEP ciphertexts, one per plaintext chunk, in order
    pub chunks: Vec<Vec<u8>>,
}

impl SealedCiphertext {
    /// Number of chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if nothing was sealed
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total sealed size in bytes
    pub fn sealed_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

/// Largest plaintext one OAEP-SHA256 operation accepts under `key`
pub fn key_chunk_max(key: &RsaPublicKey) -> usize {
    chunk_max(key.size(), OAEP_HASH_BYTES)
}

/// Split `bytes` into `⌈len/chunk_max⌉` chunks and seal each under `key`.
///
/// An empty input seals to zero chunks.
pub fn seal<R: RngCore + CryptoRng>(
    bytes: &[u8],
    key: &RsaPublicKey,
    rng: &mut R,
) -> Result<SealedCiphertext> {
    let limit = key_chunk_max(key);
    if limit == 0 {
        return Err(PprlError::transport("RSA key too small for OAEP-SHA256"));
    }

    let chunks = bytes
        .chunks(limit)
        .enumerate()
        .map(|(idx, chunk)| {
            key.encrypt(&mut *rng, Oaep::new::<Sha256>(), chunk)
                .map_err(|e| PprlError::chunk(idx, e))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::trace!(bytes = bytes.len(), chunks = chunks.len(), "sealed");
    Ok(SealedCiphertext { chunks })
}

/// Decrypt every chunk (in parallel) and concatenate in chunk order.
///
/// Any failing chunk fails the whole call; the error names its index.
pub fn open(sealed: &SealedCiphertext, key: &RsaPrivateKey) -> Result<Vec<u8>> {
    let pieces = sealed
        .chunks
        .par_iter()
        .enumerate()
        .map(|(idx, chunk)| {
            key.decrypt(Oaep::new::<Sha256>(), chunk)
                .map_err(|e| PprlError::chunk(idx, e))
        })
        .collect::<Result<Vec<Vec<u8>>>>()?;

    let bytes = pieces.concat();
    tracing::trace!(bytes = bytes.len(), chunks = sealed.len(), "opened");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::test_keys;

    #[test]
    fn test_roundtrip_boundary_lengths() {
        let keys = test_keys();
        let max = keys.chunk_max();
        assert_eq!(max, 190);

        let mut rng = rand::thread_rng();
        for len in [0, 1, max - 1, max, max + 1, 3 * max] {
            let bytes: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
            let sealed = seal(&bytes, keys.public_key(), &mut rng).unwrap();
            assert_eq!(sealed.len(), len.div_ceil(max), "chunk count for {}", len);
            assert_eq!(open(&sealed, keys.private_key()).unwrap(), bytes);
        }
    }

    #[test]
    fn test_chunk_order_is_positional() {
        let keys = test_keys();
        let mut rng = rand::thread_rng();
        let bytes: Vec<u8> = (0..400u32).map(|i| i as u8).collect();
        let mut sealed = seal(&bytes, keys.public_key(), &mut rng).unwrap();

        sealed.chunks.swap(0, 1);
        let reopened = open(&sealed, keys.private_key()).unwrap();
        assert_ne!(reopened, bytes);
        assert_eq!(reopened.len(), bytes.len());
    }

    #[test]
    fn test_corrupted_chunk_fails_whole_open() {
        let keys = test_keys();
        let mut rng = rand::thread_rng();
        let mut sealed = seal(&[7u8; 500], keys.public_key(), &mut rng).unwrap();
        sealed.chunks[1][10] ^= 0xFF;

        match open(&sealed, keys.private_key()) {
            Err(PprlError::Transport { chunk, .. }) => assert_eq!(chunk, Some(1)),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let keys = test_keys();
        let mut rng = rand::thread_rng();
        let other = RsaPrivateKey::new(&mut rng, 1024).unwrap();

        let sealed = seal(b"payload", keys.public_key(), &mut rng).unwrap();
        assert!(matches!(
            open(&sealed, &other),
            Err(PprlError::Transport { chunk: Some(0), .. })
        ));
    }
}
