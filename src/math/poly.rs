//! Polynomial operations over R_q = Z_q[X]/(X^d + 1).
//!
//! The ring dimensions used for the encrypted Q-table are tiny (d ≤ 64), so
//! products are computed schoolbook-style with explicit negacyclic wrap-around
//! instead of through an NTT. This also frees `q` from NTT-friendliness.
//!
//! # Example
//!
//! ```
//! use secure_qtable::math::Poly;
//!
//! let q: u128 = (1 << 100) - 15;
//! let a = Poly::constant(3, 16, q);
//! let x = Poly::from_signed(&[0, 1], 16, q);
//! let product = a.mul_small(&[0, 1]);
//! assert_eq!(product.coeff(1), 3);
//! assert_eq!(x.coeff(1), 1);
//! ```

use super::gaussian::GaussianSampler;
use super::modular::ModQ;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Polynomial in R_q = Z_q[X]/(X^d + 1).
///
/// Coefficients are stored in `[0, q)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poly {
    /// Coefficients in `[0, q)`.
    coeffs: Vec<u128>,
    /// Modulus q.
    q: u128,
}

impl Poly {
    /// Create zero polynomial with given dimension and modulus
    pub fn zero(dim: usize, q: u128) -> Self {
        Self {
            coeffs: vec![0; dim],
            q,
        }
    }

    /// Create polynomial from coefficient vector, reducing each entry mod q
    pub fn from_coeffs(coeffs: Vec<u128>, q: u128) -> Self {
        let coeffs = coeffs.into_iter().map(|c| c % q).collect();
        Self { coeffs, q }
    }

    /// Create polynomial from signed coefficients, zero-padded to `dim`
    pub fn from_signed(values: &[i64], dim: usize, q: u128) -> Self {
        debug_assert!(values.len() <= dim, "too many coefficients for ring");
        let mut coeffs = vec![0u128; dim];
        for (c, &v) in coeffs.iter_mut().zip(values) {
            *c = ModQ::from_signed(v as i128, q);
        }
        Self { coeffs, q }
    }

    /// Create polynomial with a single coefficient (constant polynomial)
    pub fn constant(value: u128, dim: usize, q: u128) -> Self {
        let mut coeffs = vec![0; dim];
        coeffs[0] = value % q;
        Self { coeffs, q }
    }

    /// Sample polynomial with coefficients from discrete Gaussian distribution
    pub fn sample_gaussian(dim: usize, q: u128, sampler: &mut GaussianSampler) -> Self {
        let coeffs = sampler.sample_vec_centered(dim, q);
        Self { coeffs, q }
    }

    /// Generate a uniformly random polynomial with given RNG
    pub fn random_with_rng<R: Rng>(dim: usize, q: u128, rng: &mut R) -> Self {
        let coeffs: Vec<u128> = (0..dim).map(|_| rng.gen_range(0..q)).collect();
        Self { coeffs, q }
    }

    /// Get the ring dimension d
    pub fn dimension(&self) -> usize {
        self.coeffs.len()
    }

    /// Get the modulus q
    pub fn modulus(&self) -> u128 {
        self.q
    }

    /// Get coefficient at index i
    #[inline]
    pub fn coeff(&self, i: usize) -> u128 {
        self.coeffs[i]
    }

    /// Get all coefficients
    pub fn coeffs(&self) -> &[u128] {
        &self.coeffs
    }

    /// Coefficients lifted to the centered range (-q/2, q/2]
    pub fn centered(&self) -> Vec<i128> {
        self.coeffs
            .iter()
            .map(|&c| ModQ::to_signed(c, self.q))
            .collect()
    }

    /// Multiply by a scalar in Z_q
    pub fn scalar_mul(&self, scalar: u128) -> Self {
        let coeffs = self
            .coeffs
            .iter()
            .map(|&c| ModQ::mul(c, scalar, self.q))
            .collect();
        Self { coeffs, q: self.q }
    }

    /// Negacyclic product with a polynomial of small signed coefficients.
    ///
    /// `small` is interpreted as a ring element with |coeff| < 2^16 (ternary
    /// secrets, gadget digits, s²). Entries beyond `small.len()` are zero.
    pub fn mul_small(&self, small: &[i64]) -> Self {
        let d = self.dimension();
        let q = self.q;
        let mut acc = vec![0u128; d];

        for (j, &s) in small.iter().enumerate().take(d) {
            if s == 0 {
                continue;
            }
            let magnitude = s.unsigned_abs() as u128;
            for (i, &a) in self.coeffs.iter().enumerate() {
                if a == 0 {
                    continue;
                }
                let prod = ModQ::mul_small(a, magnitude, q);
                // X^d = -1 flips the sign of wrapped terms
                let (k, wrapped) = if i + j >= d { (i + j - d, true) } else { (i + j, false) };
                if (s < 0) != wrapped {
                    acc[k] = ModQ::sub(acc[k], prod, q);
                } else {
                    acc[k] = ModQ::add(acc[k], prod, q);
                }
            }
        }

        Self { coeffs: acc, q }
    }

    /// Infinity norm of the centered representation
    pub fn linf_norm(&self) -> u128 {
        self.coeffs
            .iter()
            .map(|&c| ModQ::to_signed(c, self.q).unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Check if polynomial is zero
    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }
}

/// Negacyclic product of two small signed polynomials over Z (used for s²)
pub fn small_negacyclic_mul(a: &[i64], b: &[i64]) -> Vec<i64> {
    let d = a.len();
    debug_assert_eq!(d, b.len(), "dimensions must match");
    let mut out = vec![0i64; d];
    for (i, &x) in a.iter().enumerate() {
        if x == 0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            let k = i + j;
            if k < d {
                out[k] += x * y;
            } else {
                out[k - d] -= x * y;
            }
        }
    }
    out
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: Self) -> Self::Output {
        assert_eq!(self.q, rhs.q, "Moduli must match");

        let coeffs = self
            .coeffs
            .iter()
            .zip(rhs.coeffs.iter())
            .map(|(&a, &b)| ModQ::add(a, b, self.q))
            .collect();

        Poly { coeffs, q: self.q }
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, rhs: &Self) {
        *self = &*self + rhs;
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: Self) -> Self::Output {
        assert_eq!(self.q, rhs.q, "Moduli must match");

        let coeffs = self
            .coeffs
            .iter()
            .zip(rhs.coeffs.iter())
            .map(|(&a, &b)| ModQ::sub(a, b, self.q))
            .collect();

        Poly { coeffs, q: self.q }
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, rhs: &Self) {
        *self = &*self - rhs;
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Self::Output {
        let coeffs = self
            .coeffs
            .iter()
            .map(|&c| ModQ::negate(c, self.q))
            .collect();

        Poly { coeffs, q: self.q }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q: u128 = (1 << 100) - 15;

    #[test]
    fn test_add_sub_inverse() {
        let mut rng = rand::thread_rng();
        let a = Poly::random_with_rng(16, Q, &mut rng);
        let b = Poly::random_with_rng(16, Q, &mut rng);
        let sum = &a + &b;
        assert_eq!(&sum - &b, a);
    }

    #[test]
    fn test_neg() {
        let a = Poly::from_signed(&[1, -2, 3], 4, Q);
        let neg = -&a;
        assert_eq!(neg.centered(), vec![-1, 2, -3, 0]);
        assert!((&a + &neg).is_zero());
    }

    #[test]
    fn test_mul_small_wraps_negacyclic() {
        // (1 + X^3) · X = X + X^4 = X - 1 in Z_q[X]/(X^4 + 1)
        let a = Poly::from_signed(&[1, 0, 0, 1], 4, Q);
        let product = a.mul_small(&[0, 1, 0, 0]);
        assert_eq!(product.centered(), vec![-1, 1, 0, 0]);
    }

    #[test]
    fn test_mul_small_negative_factor() {
        let a = Poly::from_signed(&[2, 3, 0, 0], 4, Q);
        let product = a.mul_small(&[-1, 0, 0, 0]);
        assert_eq!(product.centered(), vec![-2, -3, 0, 0]);
    }

    #[test]
    fn test_small_negacyclic_mul_matches_mul_small() {
        let a = [1i64, -1, 0, 1];
        let b = [0i64, 1, -1, 1];
        let over_z = small_negacyclic_mul(&a, &b);
        let over_q = Poly::from_signed(&a, 4, Q).mul_small(&b);
        let expected: Vec<i128> = over_z.iter().map(|&v| v as i128).collect();
        assert_eq!(over_q.centered(), expected);
    }

    #[test]
    fn test_linf_norm() {
        let a = Poly::from_signed(&[5, -9, 2], 3, Q);
        assert_eq!(a.linf_norm(), 9);
    }
}
