//! In-crate BFV backend
//!
//! A small, exact BFV implementation with SIMD slot batching that satisfies
//! [`HomomorphicScheme`]. All key material lives in one [`BfvScheme`] value
//! held by the trusted key-holding party.
//!
//! # Example
//!
//! ```
//! use secure_qtable::bfv::BfvScheme;
//! use secure_qtable::params::SchemeParams;
//! use secure_qtable::scheme::HomomorphicScheme;
//!
//! let mut scheme = BfvScheme::with_seed(SchemeParams::fast_insecure_d16(), 7).unwrap();
//! let a = scheme.encrypt(&[1, 2, 3]).unwrap();
//! let b = scheme.encrypt(&[4, 5, 6]).unwrap();
//! let product = scheme.multiply_relin(&a, &b).unwrap();
//! assert_eq!(&scheme.decrypt(&product).unwrap()[..3], &[4, 10, 18]);
//! ```

mod enc;
pub mod encoding;
pub mod mul;
pub mod types;

pub use encoding::SlotEncoder;
pub use types::{BfvCiphertext, RelinearizationKey, SecretKey};

use crate::error::{scheme_err, PprlError, Result};
use crate::math::GaussianSampler;
use crate::params::SchemeParams;
use crate::scheme::HomomorphicScheme;

/// BFV context with secret and relinearization keys
#[derive(Debug)]
pub struct BfvScheme {
    params: SchemeParams,
    encoder: SlotEncoder,
    secret_key: SecretKey,
    relin_key: RelinearizationKey,
    sampler: GaussianSampler,
}

impl BfvScheme {
    /// Generate fresh keys from OS entropy
    pub fn generate(params: SchemeParams) -> Result<Self> {
        let sampler = GaussianSampler::new(params.sigma);
        Self::from_sampler(params, sampler)
    }

    /// Deterministic key generation and encryption randomness
    pub fn with_seed(params: SchemeParams, seed: u64) -> Result<Self> {
        let sampler = GaussianSampler::with_seed(params.sigma, seed);
        Self::from_sampler(params, sampler)
    }

    fn from_sampler(params: SchemeParams, mut sampler: GaussianSampler) -> Result<Self> {
        params
            .validate()
            .map_err(|e| PprlError::InvalidParameters(e.to_string()))?;
        let encoder = SlotEncoder::new(params.ring_dim, params.t)?;
        let secret_key = SecretKey::generate(params.ring_dim, &mut sampler);
        let relin_key = RelinearizationKey::generate(&secret_key, &params, &mut sampler);

        tracing::debug!(
            ring_dim = params.ring_dim,
            t = params.t,
            gadget_len = relin_key.len(),
            "generated BFV keys"
        );

        Ok(Self {
            params,
            encoder,
            secret_key,
            relin_key,
            sampler,
        })
    }

    /// Scheme parameters
    pub fn params(&self) -> &SchemeParams {
        &self.params
    }

    /// Relinearization key (public evaluation material)
    pub fn relin_key(&self) -> &RelinearizationKey {
        &self.relin_key
    }

    /// Remaining noise budget in bits; decryption is correct while positive
    pub fn noise_budget_bits(&self, ct: &BfvCiphertext) -> f64 {
        let noise = ct.noise_norm(&self.secret_key, &self.params) as f64;
        let half_delta = self.params.delta() as f64 / 2.0;
        half_delta.log2() - (noise + 1.0).log2()
    }

    /// Reject ciphertexts produced under other parameters or malformed ones
    pub fn check_ciphertext(&self, ct: &BfvCiphertext) -> Result<()> {
        if !(2..=3).contains(&ct.size()) {
            return Err(scheme_err!("ciphertext has {} parts, expected 2 or 3", ct.size()));
        }
        for (idx, part) in ct.parts.iter().enumerate() {
            if part.dimension() != self.params.ring_dim {
                return Err(scheme_err!(
                    "part {} has ring dimension {}, expected {}",
                    idx,
                    part.dimension(),
                    self.params.ring_dim
                ));
            }
            if part.modulus() != self.params.q {
                return Err(scheme_err!("part {} uses a foreign modulus", idx));
            }
            if part.coeffs().iter().any(|&c| c >= self.params.q) {
                return Err(scheme_err!("part {} has unreduced coefficients", idx));
            }
        }
        Ok(())
    }
}

impl HomomorphicScheme for BfvScheme {
    type Ciphertext = BfvCiphertext;

    fn slot_count(&self) -> usize {
        self.encoder.slot_count()
    }

    fn plaintext_modulus(&self) -> u64 {
        self.params.t
    }

    fn encrypt(&mut self, slots: &[u64]) -> Result<BfvCiphertext> {
        let message = self.encoder.encode(slots)?;
        Ok(BfvCiphertext::encrypt(
            &self.secret_key,
            &message,
            &self.params,
            &mut self.sampler,
        ))
    }

    fn decrypt(&self, ct: &BfvCiphertext) -> Result<Vec<u64>> {
        self.check_ciphertext(ct)?;
        let coeffs = ct.decrypt(&self.secret_key, self.params.t);
        Ok(self.encoder.decode(&coeffs))
    }

    fn multiply(&self, a: &BfvCiphertext, b: &BfvCiphertext) -> Result<BfvCiphertext> {
        self.check_ciphertext(a)?;
        self.check_ciphertext(b)?;
        a.multiply(b, self.params.t)
    }

    fn relinearize(&self, ct: &mut BfvCiphertext) -> Result<()> {
        self.check_ciphertext(ct)?;
        self.relin_key.relinearize(ct)
    }

    fn add(&self, a: &BfvCiphertext, b: &BfvCiphertext) -> Result<BfvCiphertext> {
        self.check_ciphertext(a)?;
        self.check_ciphertext(b)?;
        a.add(b)
    }

    fn sub(&self, a: &BfvCiphertext, b: &BfvCiphertext) -> Result<BfvCiphertext> {
        self.check_ciphertext(a)?;
        self.check_ciphertext(b)?;
        a.sub(b)
    }

    fn serialize(&self, ct: &BfvCiphertext) -> Result<Vec<u8>> {
        Ok(bincode::serialize(ct)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<BfvCiphertext> {
        let ct: BfvCiphertext = bincode::deserialize(bytes)?;
        self.check_ciphertext(&ct)?;
        Ok(ct)
    }

    fn refresh(&mut self, ct: &BfvCiphertext, width: usize) -> Result<BfvCiphertext> {
        let mut slots = self.decrypt(ct)?;
        slots.truncate(width);
        let fresh = self.encrypt(&slots)?;
        tracing::trace!(
            before = self.noise_budget_bits(ct),
            after = self.noise_budget_bits(&fresh),
            "refreshed noise budget"
        );
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme() -> BfvScheme {
        BfvScheme::with_seed(SchemeParams::fast_insecure_d16(), 42).unwrap()
    }

    #[test]
    fn test_slotwise_arithmetic() {
        let mut s = scheme();
        let t = s.plaintext_modulus();
        let a = s.encrypt(&[5, 0, t - 1, 9]).unwrap();
        let b = s.encrypt(&[3, 8, 2, 1]).unwrap();

        assert_eq!(&s.decrypt(&s.add(&a, &b).unwrap()).unwrap()[..4], &[8, 8, 1, 10]);
        assert_eq!(
            &s.decrypt(&s.sub(&a, &b).unwrap()).unwrap()[..4],
            &[2, t - 8, t - 3, 8]
        );
        assert_eq!(
            &s.decrypt(&s.multiply_relin(&a, &b).unwrap()).unwrap()[..4],
            &[15, 0, t - 2, 9]
        );
    }

    #[test]
    fn test_depth_two_products() {
        let mut s = scheme();
        let x = s.encrypt(&[1, 0, 1, 1]).unwrap();
        let y = s.encrypt(&[0, 0, 1, 0]).unwrap();
        let v = s.encrypt(&[100, 200, 3250, 400]).unwrap();

        let xy = s.multiply_relin(&x, &y).unwrap();
        let selected = s.multiply_relin(&xy, &v).unwrap();

        assert_eq!(&s.decrypt(&selected).unwrap()[..4], &[0, 0, 3250, 0]);
        assert!(s.noise_budget_bits(&selected) > 10.0);
    }

    #[test]
    fn test_unrelinearized_operand_rejected() {
        let mut s = scheme();
        let a = s.encrypt(&[2]).unwrap();
        let product = s.multiply(&a, &a).unwrap();
        assert!(matches!(s.multiply(&product, &a), Err(PprlError::Scheme(_))));

        // additions still accept the 3-part form
        let sum = s.add(&product, &a).unwrap();
        assert_eq!(s.decrypt(&sum).unwrap()[0], 6);
    }

    #[test]
    fn test_deserialize_rejects_foreign_ciphertext() {
        let mut narrow = scheme();
        let mut wide = BfvScheme::with_seed(SchemeParams::fast_insecure_d64(), 1).unwrap();

        let ct = wide.encrypt(&[1, 2, 3]).unwrap();
        let bytes = wide.serialize(&ct).unwrap();
        assert!(narrow.deserialize(&bytes).is_err());
        assert!(narrow.deserialize(&[1, 2, 3]).is_err());

        let own = narrow.encrypt(&[7]).unwrap();
        let bytes = narrow.serialize(&own).unwrap();
        let back = narrow.deserialize(&bytes).unwrap();
        assert_eq!(narrow.decrypt(&back).unwrap()[0], 7);
    }

    #[test]
    fn test_refresh_restores_noise_budget() {
        let mut s = scheme();
        let a = s.encrypt(&[11, 12, 13]).unwrap();
        let b = s.encrypt(&[2, 2, 2]).unwrap();
        let product = s.multiply_relin(&a, &b).unwrap();
        let before = s.noise_budget_bits(&product);

        let fresh = s.refresh(&product, 2).unwrap();
        assert!(s.noise_budget_bits(&fresh) > before);
        assert_eq!(&s.decrypt(&fresh).unwrap()[..3], &[22, 24, 0]);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = SchemeParams {
            ring_dim: 12,
            ..SchemeParams::default()
        };
        assert!(matches!(
            BfvScheme::with_seed(params, 0),
            Err(PprlError::InvalidParameters(_))
        ));
    }
}
