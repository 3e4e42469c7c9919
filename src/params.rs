//! Parameter sets for the secure Q-table
//!
//! Three independent parameter groups: the BFV scheme, the RSA-OAEP transport,
//! and the fixed-point codec. `validate()` checks each group on its own;
//! [`check_compatible`] checks that the codec range fits the plaintext space.

use serde::{Deserialize, Serialize};

use crate::math::gaussian::DEFAULT_SIGMA;
use crate::math::modular::MAX_MODULUS_BITS;
use crate::math::roots::is_prime;

/// Output size of the OAEP hash (SHA-256) in bytes
pub const OAEP_HASH_BYTES: usize = 32;

/// BFV scheme parameters
///
/// None of the presets target 128-bit security: ring dimensions are chosen so
/// a full Q-table update stays cheap in a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeParams {
    /// Ring dimension n (power of two); also the number of SIMD slots
    pub ring_dim: usize,

    /// Ciphertext modulus q (odd, below 2^110)
    pub q: u128,

    /// Plaintext modulus t (prime below 2^32, t ≡ 1 mod 2n for slot batching)
    pub t: u64,

    /// Standard deviation for Gaussian error sampling
    pub sigma: f64,

    /// Gadget decomposition base for relinearization keys
    pub gadget_base: u64,
}

impl SchemeParams {
    /// n = 16 slots, q ≈ 2^100, t = 65537.
    ///
    /// Enough slots for a 4-action grid world with a depth-2 multiplication
    /// budget between refreshes.
    pub fn fast_insecure_d16() -> Self {
        Self {
            ring_dim: 16,
            q: (1u128 << 100) - 15,
            t: 65537, // Fermat prime F4: 65536 = 2^16 covers every 2n up to 2^16
            sigma: DEFAULT_SIGMA,
            gadget_base: 1 << 16,
        }
    }

    /// n = 64 slots, same moduli. For tables with many actions.
    pub fn fast_insecure_d64() -> Self {
        Self {
            ring_dim: 64,
            ..Self::fast_insecure_d16()
        }
    }

    /// Scaling factor Δ = ⌊q/t⌋
    pub fn delta(&self) -> u128 {
        self.q / self.t as u128
    }

    /// Number of plaintext slots per ciphertext
    pub fn slot_count(&self) -> usize {
        self.ring_dim
    }

    /// Number of gadget digits ℓ = ⌈log_B(q)⌉
    pub fn gadget_len(&self) -> usize {
        let base = self.gadget_base as u128;
        let mut remaining = self.q - 1;
        let mut len = 0;
        while remaining > 0 {
            remaining /= base;
            len += 1;
        }
        len
    }

    /// Check if parameters are valid
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.ring_dim < 2 || !self.ring_dim.is_power_of_two() {
            return Err("ring_dim must be a power of two >= 2");
        }

        // bounds the trial division in is_prime
        if self.t >> 32 != 0 {
            return Err("t must be below 2^32");
        }

        if !is_prime(self.t) {
            return Err("t must be prime");
        }

        if (self.t - 1) % (2 * self.ring_dim as u64) != 0 {
            return Err("t must be ≡ 1 (mod 2n) for slot batching");
        }

        if self.q % 2 == 0 {
            return Err("q must be odd");
        }

        if self.q >> MAX_MODULUS_BITS != 0 {
            return Err("q must be below 2^110");
        }

        if self.q <= self.t as u128 {
            return Err("q must be larger than t");
        }

        // decryption computes t·x + q/2 for x < q in u128
        if self.q.checked_mul(2 * self.t as u128).is_none() {
            return Err("q·2t must fit in 128 bits");
        }

        if self.gadget_base < 2 || self.gadget_base > 1 << 16 {
            return Err("gadget_base must be in [2, 2^16]");
        }

        if !(self.sigma > 0.0) {
            return Err("sigma must be positive");
        }

        Ok(())
    }
}

impl Default for SchemeParams {
    fn default() -> Self {
        Self::fast_insecure_d16()
    }
}

/// RSA-OAEP transport parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportParams {
    /// RSA modulus size in bits
    pub key_bits: usize,
}

impl TransportParams {
    /// Largest plaintext a single OAEP operation accepts:
    /// `key_bytes - 2·hash_bytes - 2` (190 for 2048-bit keys with SHA-256)
    pub fn chunk_max(&self) -> usize {
        chunk_max(self.key_bits / 8, OAEP_HASH_BYTES)
    }

    /// Check if parameters are valid
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.key_bits % 8 != 0 {
            return Err("key_bits must be a multiple of 8");
        }
        if self.key_bits < 1024 {
            return Err("key_bits must be at least 1024");
        }
        Ok(())
    }
}

impl Default for TransportParams {
    fn default() -> Self {
        Self { key_bits: 2048 }
    }
}

/// OAEP single-operation plaintext limit for the given key and hash sizes
pub fn chunk_max(key_bytes: usize, hash_bytes: usize) -> usize {
    key_bytes.saturating_sub(2 * hash_bytes + 2)
}

/// Fixed-point codec parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodecParams {
    /// Scale applied before rounding: `x = round(q · coeff)`
    pub coeff: f64,
    /// Signed range bound N: valid scaled values lie in `[-N, N)`
    pub bound: i64,
}

impl CodecParams {
    /// Check if parameters are valid
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.coeff > 0.0) || !self.coeff.is_finite() {
            return Err("coeff must be positive and finite");
        }
        if self.bound <= 0 {
            return Err("bound must be positive");
        }
        // map/unmap shift by 2N in i64
        if self.bound > i64::MAX / 2 {
            return Err("bound must not exceed i64::MAX / 2");
        }
        Ok(())
    }
}

impl Default for CodecParams {
    fn default() -> Self {
        Self {
            coeff: 1000.0,
            bound: 10000,
        }
    }
}

/// Check that every mapped value `[0, 2N)` is a distinct plaintext in `[0, t)`
pub fn check_compatible(scheme: &SchemeParams, codec: &CodecParams) -> Result<(), &'static str> {
    if 2 * codec.bound as u128 > scheme.t as u128 {
        return Err("codec range 2N exceeds plaintext modulus t");
    }
    Ok(())
}
