//! BFV encryption, decryption and linear operations
//!
//! Encryption: (c_0, c_1) = (-a·s + e + Δ·m, a), Δ = ⌊q/t⌋.
//! Decryption: m = ⌊t·(c_0 + c_1·s + c_2·s²)/q⌉ mod t.

use crate::error::{scheme_err, Result};
use crate::math::{GaussianSampler, ModQ, Poly};
use crate::params::SchemeParams;

use super::types::{BfvCiphertext, SecretKey};

impl BfvCiphertext {
    /// Encrypt a message polynomial (coefficients in [0, t))
    pub fn encrypt(
        sk: &SecretKey,
        message: &[u64],
        params: &SchemeParams,
        sampler: &mut GaussianSampler,
    ) -> Self {
        let d = params.ring_dim;
        let q = params.q;

        let a = Poly::random_with_rng(d, q, sampler.rng_mut());
        let e = Poly::sample_gaussian(d, q, sampler);

        // Δ·m
        let scaled_msg =
            Poly::from_coeffs(message.iter().map(|&m| m as u128).collect(), q)
                .scalar_mul(params.delta());

        // c_0 = -a·s + e + Δ·m
        let neg_a_s = -&a.mul_small(sk.coeffs());
        let c0 = &(&neg_a_s + &e) + &scaled_msg;

        Self::from_parts(vec![c0, a])
    }

    /// c_0 + c_1·s + c_2·s² mod q
    pub(crate) fn phase(&self, sk: &SecretKey) -> Poly {
        let mut acc = self.parts[0].clone();
        if let Some(c1) = self.parts.get(1) {
            acc += &c1.mul_small(sk.coeffs());
        }
        if let Some(c2) = self.parts.get(2) {
            acc += &c2.mul_small(sk.squared());
        }
        acc
    }

    /// Decrypt to message polynomial coefficients in [0, t)
    pub fn decrypt(&self, sk: &SecretKey, t: u64) -> Vec<u64> {
        let phase = self.phase(sk);
        let q = phase.modulus();
        let t = t as u128;

        // m = ⌊t·x/q⌉ mod t
        phase
            .coeffs()
            .iter()
            .map(|&x| ((t * x + q / 2) / q % t) as u64)
            .collect()
    }

    /// Largest |e| in c_0 + c_1·s + c_2·s² = Δ·m + e
    pub fn noise_norm(&self, sk: &SecretKey, params: &SchemeParams) -> u128 {
        let phase = self.phase(sk);
        let message = self.decrypt(sk, params.t);
        let q = params.q;
        let delta = params.delta();

        phase
            .coeffs()
            .iter()
            .zip(message)
            .map(|(&x, m)| {
                let expected = ModQ::mul(delta, m as u128, q);
                ModQ::to_signed(ModQ::sub(x, expected, q), q).unsigned_abs()
            })
            .max()
            .unwrap_or(0)
    }

    fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.ring_dim() != other.ring_dim() || self.modulus() != other.modulus() {
            return Err(scheme_err!(
                "operand mismatch: (n={}, q={}) vs (n={}, q={})",
                self.ring_dim(),
                self.modulus(),
                other.ring_dim(),
                other.modulus()
            ));
        }
        Ok(())
    }

    /// Homomorphic addition; a missing component counts as zero.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;
        Ok(self.combine(other, |a, b| a + b))
    }

    /// Homomorphic subtraction; a missing component counts as zero.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;
        Ok(self.combine(other, |a, b| a - b))
    }

    fn combine(&self, other: &Self, op: impl Fn(&Poly, &Poly) -> Poly) -> Self {
        let zero = Poly::zero(self.ring_dim(), self.modulus());
        let size = self.size().max(other.size());
        let parts = (0..size)
            .map(|k| {
                let a = self.parts.get(k).unwrap_or(&zero);
                let b = other.parts.get(k).unwrap_or(&zero);
                op(a, b)
            })
            .collect();
        Self::from_parts(parts)
    }
}
