//! BFV ciphertext and key types.
//!
//! Ring-LWE over R_q = Z_q[X]/(X^n + 1) with plaintexts in R_t.

use crate::math::{small_negacyclic_mul, GaussianSampler, Poly};
use serde::{Deserialize, Serialize};

/// BFV secret key: ternary polynomial s, with s² cached for 3-part ciphertexts.
///
/// Not serializable, and `Debug` omits the coefficients.
#[derive(Clone)]
pub struct SecretKey {
    /// Coefficients of s in {-1, 0, 1}
    coeffs: Vec<i64>,
    /// Coefficients of s² over Z (|c| ≤ n)
    squared: Vec<i64>,
}

impl SecretKey {
    /// Sample a ternary secret of dimension `dim`
    pub fn generate(dim: usize, sampler: &mut GaussianSampler) -> Self {
        let coeffs = sampler.sample_ternary(dim);
        let squared = small_negacyclic_mul(&coeffs, &coeffs);
        Self { coeffs, squared }
    }

    /// Ring dimension
    pub fn ring_dim(&self) -> usize {
        self.coeffs.len()
    }

    /// s as small signed coefficients
    pub fn coeffs(&self) -> &[i64] {
        &self.coeffs
    }

    /// s² as small signed coefficients
    pub fn squared(&self) -> &[i64] {
        &self.squared
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("ring_dim", &self.ring_dim())
            .finish_non_exhaustive()
    }
}

/// BFV ciphertext (c_0, c_1[, c_2]) with c_0 + c_1·s + c_2·s² = Δ·m + e.
///
/// Fresh and relinearized ciphertexts have two parts; a product has three
/// until it is relinearized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BfvCiphertext {
    /// Ciphertext components, lowest power of s first
    pub parts: Vec<Poly>,
}

impl BfvCiphertext {
    /// Creates a ciphertext from component polynomials.
    ///
    /// # Panics
    ///
    /// Debug-asserts that every part shares dimension and modulus.
    pub fn from_parts(parts: Vec<Poly>) -> Self {
        debug_assert!(
            parts.windows(2).all(|w| w[0].dimension() == w[1].dimension()
                && w[0].modulus() == w[1].modulus()),
            "Ciphertext polynomials must share dimension and modulus"
        );
        Self { parts }
    }

    /// Number of components (2 when linear, 3 after a product)
    pub fn size(&self) -> usize {
        self.parts.len()
    }

    /// Whether this ciphertext can be an operand of a product
    pub fn is_linear(&self) -> bool {
        self.parts.len() == 2
    }

    /// Returns the ring dimension.
    pub fn ring_dim(&self) -> usize {
        self.parts.first().map(Poly::dimension).unwrap_or(0)
    }

    /// Returns the modulus q.
    pub fn modulus(&self) -> u128 {
        self.parts.first().map(Poly::modulus).unwrap_or(0)
    }
}

/// Relinearization key: ℓ encryptions of B^j·s² under s.
///
/// Row j is (b_j, a_j) with b_j = -a_j·s + e_j + B^j·s².
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelinearizationKey {
    /// One 2-part ciphertext per gadget digit
    pub rows: Vec<BfvCiphertext>,
    /// Gadget base B
    pub base: u64,
}

impl RelinearizationKey {
    /// Gadget length ℓ
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the key has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
