//! Homomorphic scheme adapter
//!
//! The secure Q-table protocol only needs a handful of capabilities from a
//! homomorphic backend. They are collected here so the protocol stays generic
//! over the backend; [`crate::bfv::BfvScheme`] is the in-crate implementation.
//!
//! # Contract
//!
//! - `multiply` may return a ciphertext that must be passed through
//!   `relinearize` before it is used as an operand of another `multiply`.
//!   Backends reject such operands with a scheme error.
//! - `add` / `sub` need no relinearization.
//! - `decrypt` returns every slot; callers truncate to the width they use.
//! - `refresh` is a decrypt/re-encrypt round and therefore needs the secret
//!   key. Whoever calls it is the single trusted party of the protocol.

use crate::error::Result;

/// Capability bundle of a homomorphic encryption backend
pub trait HomomorphicScheme {
    /// Opaque encrypted slot vector
    type Ciphertext: Clone + Send + Sync;

    /// Number of plaintext slots per ciphertext
    fn slot_count(&self) -> usize;

    /// Plaintext modulus; slot values live in `[0, plaintext_modulus)`
    fn plaintext_modulus(&self) -> u64;

    /// Encrypt a slot vector (zero-padded to `slot_count`)
    fn encrypt(&mut self, slots: &[u64]) -> Result<Self::Ciphertext>;

    /// Decrypt every slot of a ciphertext
    fn decrypt(&self, ct: &Self::Ciphertext) -> Result<Vec<u64>>;

    /// Slot-wise product; the result needs `relinearize` before further products
    fn multiply(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    /// Restore a product ciphertext to a form usable in further products
    fn relinearize(&self, ct: &mut Self::Ciphertext) -> Result<()>;

    /// Slot-wise sum
    fn add(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    /// Slot-wise difference
    fn sub(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    /// Serialize a ciphertext to bytes
    fn serialize(&self, ct: &Self::Ciphertext) -> Result<Vec<u8>>;

    /// Deserialize a ciphertext, rejecting foreign parameter sets
    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Ciphertext>;

    /// Multiply then relinearize
    fn multiply_relin(
        &self,
        a: &Self::Ciphertext,
        b: &Self::Ciphertext,
    ) -> Result<Self::Ciphertext> {
        let mut product = self.multiply(a, b)?;
        self.relinearize(&mut product)?;
        Ok(product)
    }

    /// Noise refresh: decrypt, keep the first `width` slots, re-encrypt fresh.
    ///
    /// Resets accumulated noise to that of a fresh encryption. Requires the
    /// secret key, so the caller must be the key-holding party.
    fn refresh(&mut self, ct: &Self::Ciphertext, width: usize) -> Result<Self::Ciphertext> {
        let mut slots = self.decrypt(ct)?;
        slots.truncate(width);
        self.encrypt(&slots)
    }
}
