//! SIMD slot encoding over Z_t
//!
//! A plaintext polynomial m(X) ∈ Z_t[X]/(X^n + 1) carries n slots: slot i is
//! the evaluation m(ψ^(2i+1)) where ψ is a primitive 2n-th root of unity mod t.
//! The ψ^(2i+1) are exactly the roots of X^n + 1, so ring products become
//! slot-wise products.
//!
//! n is tiny here, so both directions are direct O(n²) sums.

use crate::error::{scheme_err, Result};
use crate::math::{mod_inverse, pow_mod, primitive_2n_root};

/// Slot ⇄ coefficient transform for a fixed (n, t)
#[derive(Clone, Debug)]
pub struct SlotEncoder {
    n: usize,
    t: u64,
    /// ψ^e mod t for e in [0, 2n)
    psi_powers: Vec<u64>,
    /// n^{-1} mod t
    n_inv: u64,
}

impl SlotEncoder {
    /// Build the encoder; fails if t admits no primitive 2n-th root
    pub fn new(n: usize, t: u64) -> Result<Self> {
        let psi = primitive_2n_root(n as u64, t)
            .ok_or_else(|| scheme_err!("no primitive {}-th root of unity mod {}", 2 * n, t))?;
        let psi_powers = (0..2 * n as u64).map(|e| pow_mod(psi, e, t)).collect();
        let n_inv = mod_inverse(n as u64 % t, t)
            .ok_or_else(|| scheme_err!("ring dimension {} not invertible mod {}", n, t))?;

        Ok(Self {
            n,
            t,
            psi_powers,
            n_inv,
        })
    }

    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.n
    }

    /// ψ^((2·slot+1)·k), optionally inverted
    #[inline]
    fn root_power(&self, slot: usize, k: usize, inverse: bool) -> u64 {
        let order = 2 * self.n;
        let e = ((2 * slot + 1) * k) % order;
        let e = if inverse { (order - e) % order } else { e };
        self.psi_powers[e]
    }

    /// Slots → plaintext coefficients. Missing trailing slots are zero.
    pub fn encode(&self, slots: &[u64]) -> Result<Vec<u64>> {
        if slots.len() > self.n {
            return Err(scheme_err!(
                "{} slot values exceed the {} available slots",
                slots.len(),
                self.n
            ));
        }
        if let Some(&bad) = slots.iter().find(|&&z| z >= self.t) {
            return Err(scheme_err!(
                "slot value {} not below plaintext modulus {}",
                bad,
                self.t
            ));
        }

        let t = self.t as u128;
        let coeffs = (0..self.n)
            .map(|k| {
                let sum = slots
                    .iter()
                    .enumerate()
                    .fold(0u128, |acc, (i, &z)| {
                        (acc + z as u128 * self.root_power(i, k, true) as u128) % t
                    });
                (sum * self.n_inv as u128 % t) as u64
            })
            .collect();
        Ok(coeffs)
    }

    /// Plaintext coefficients → all n slots
    pub fn decode(&self, coeffs: &[u64]) -> Vec<u64> {
        let t = self.t as u128;
        (0..self.n)
            .map(|i| {
                coeffs
                    .iter()
                    .enumerate()
                    .fold(0u128, |acc, (k, &m)| {
                        (acc + m as u128 * self.root_power(i, k, false) as u128) % t
                    }) as u64
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 65537;

    fn negacyclic_mod_t(a: &[u64], b: &[u64], t: u64) -> Vec<u64> {
        let n = a.len();
        let mut out = vec![0u64; n];
        for i in 0..n {
            for j in 0..n {
                let prod = a[i] * b[j] % t;
                let k = (i + j) % n;
                out[k] = if i + j < n {
                    (out[k] + prod) % t
                } else {
                    (out[k] + t - prod) % t
                };
            }
        }
        out
    }

    #[test]
    fn test_roundtrip() {
        let encoder = SlotEncoder::new(16, T).unwrap();
        let slots: Vec<u64> = (0..16).map(|i| (i * 4099 + 7) % T).collect();
        let coeffs = encoder.encode(&slots).unwrap();
        assert_eq!(encoder.decode(&coeffs), slots);
    }

    #[test]
    fn test_broadcast_is_constant_polynomial() {
        let encoder = SlotEncoder::new(16, T).unwrap();
        let coeffs = encoder.encode(&[5; 16]).unwrap();
        assert_eq!(coeffs[0], 5);
        assert!(coeffs[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_ring_product_is_slotwise() {
        let encoder = SlotEncoder::new(8, T).unwrap();
        let a = [1, 2, 3, 4, 0, 0, 65536, 9];
        let b = [7, 0, 5, 1, 3, 2, 2, 100];
        let pa = encoder.encode(&a).unwrap();
        let pb = encoder.encode(&b).unwrap();
        let product = encoder.decode(&negacyclic_mod_t(&pa, &pb, T));
        let expected: Vec<u64> = a.iter().zip(&b).map(|(x, y)| x * y % T).collect();
        assert_eq!(product, expected);
    }

    #[test]
    fn test_rejects_oversized_input() {
        let encoder = SlotEncoder::new(4, T).unwrap();
        assert!(encoder.encode(&[0; 5]).is_err());
        assert!(encoder.encode(&[T]).is_err());
    }

    #[test]
    fn test_rejects_incompatible_modulus() {
        assert!(SlotEncoder::new(16, 17).is_err());
    }
}
