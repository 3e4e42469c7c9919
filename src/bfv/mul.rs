//! Ciphertext multiplication and relinearization
//!
//! Multiplication is the textbook BFV tensor product: both operands are
//! lifted to centered integers, multiplied exactly over Z[X]/(X^n + 1) and
//! scaled by t/q with rounding. The exact products reach ~2^205 so the tensor
//! runs on `BigInt`.
//!
//! Relinearization folds c_2 back into (c_0, c_1) with a base-B gadget
//! decomposition of c_2 against encryptions of B^j·s².

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

use crate::error::{scheme_err, Result};
use crate::math::{GaussianSampler, ModQ, Poly};
use crate::params::SchemeParams;

use super::types::{BfvCiphertext, RelinearizationKey, SecretKey};

/// Exact negacyclic product over Z
fn negacyclic_mul(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    let n = a.len();
    let mut out = vec![BigInt::zero(); n];
    for (i, x) in a.iter().enumerate() {
        if x.is_zero() {
            continue;
        }
        for (j, y) in b.iter().enumerate() {
            let prod = x * y;
            if i + j < n {
                out[i + j] += prod;
            } else {
                out[i + j - n] -= prod;
            }
        }
    }
    out
}

/// ⌊t·d/q⌉ mod q for every coefficient
fn scale_round(d: &[BigInt], t: u64, q: u128) -> Result<Poly> {
    let two_t = BigInt::from(2 * t);
    let q_big = BigInt::from(q);
    let two_q = BigInt::from(2u8) * &q_big;

    let coeffs = d
        .iter()
        .map(|x| {
            // round(t·x/q) = ⌊(2t·x + q) / 2q⌋
            let rounded = (&two_t * x + &q_big).div_floor(&two_q);
            rounded
                .mod_floor(&q_big)
                .to_u128()
                .ok_or_else(|| scheme_err!("scaled coefficient does not fit modulus"))
        })
        .collect::<Result<Vec<u128>>>()?;

    Ok(Poly::from_coeffs(coeffs, q))
}

fn lift(poly: &Poly) -> Vec<BigInt> {
    poly.centered().into_iter().map(BigInt::from).collect()
}

impl BfvCiphertext {
    /// Tensor product of two 2-part ciphertexts; the result has three parts.
    pub fn multiply(&self, other: &Self, t: u64) -> Result<Self> {
        if !self.is_linear() || !other.is_linear() {
            return Err(scheme_err!(
                "multiply needs relinearized operands, got {} and {} parts",
                self.size(),
                other.size()
            ));
        }
        if self.ring_dim() != other.ring_dim() || self.modulus() != other.modulus() {
            return Err(scheme_err!("multiply operands use different parameters"));
        }

        let q = self.modulus();
        let (a0, a1) = (lift(&self.parts[0]), lift(&self.parts[1]));
        let (b0, b1) = (lift(&other.parts[0]), lift(&other.parts[1]));

        let d0 = negacyclic_mul(&a0, &b0);
        let d1: Vec<BigInt> = negacyclic_mul(&a0, &b1)
            .into_iter()
            .zip(negacyclic_mul(&a1, &b0))
            .map(|(x, y)| x + y)
            .collect();
        let d2 = negacyclic_mul(&a1, &b1);

        Ok(Self::from_parts(vec![
            scale_round(&d0, t, q)?,
            scale_round(&d1, t, q)?,
            scale_round(&d2, t, q)?,
        ]))
    }
}

/// Split each coefficient of `poly` into ℓ base-B digits, lowest first.
///
/// Returns ℓ digit polynomials with entries in `[0, B)`.
pub fn gadget_decompose(poly: &Poly, base: u64, len: usize) -> Vec<Vec<i64>> {
    let base = base as u128;
    let mut digits = vec![vec![0i64; poly.dimension()]; len];
    for (k, &c) in poly.coeffs().iter().enumerate() {
        let mut rest = c;
        for digit in digits.iter_mut() {
            digit[k] = (rest % base) as i64;
            rest /= base;
        }
    }
    digits
}

impl RelinearizationKey {
    /// Encrypt B^j·s² under s for j in [0, ℓ)
    pub fn generate(sk: &SecretKey, params: &SchemeParams, sampler: &mut GaussianSampler) -> Self {
        let d = params.ring_dim;
        let q = params.q;
        let s_squared = Poly::from_signed(sk.squared(), d, q);

        let mut power = 1u128;
        let rows = (0..params.gadget_len())
            .map(|_| {
                let a = Poly::random_with_rng(d, q, sampler.rng_mut());
                let e = Poly::sample_gaussian(d, q, sampler);
                let neg_a_s = -&a.mul_small(sk.coeffs());
                let b = &(&neg_a_s + &e) + &s_squared.scalar_mul(power);
                power = ModQ::mul(power, params.gadget_base as u128, q);
                BfvCiphertext::from_parts(vec![b, a])
            })
            .collect();

        Self {
            rows,
            base: params.gadget_base,
        }
    }

    /// Fold c_2 into (c_0, c_1). Two-part ciphertexts are left untouched.
    pub fn relinearize(&self, ct: &mut BfvCiphertext) -> Result<()> {
        match ct.size() {
            2 => return Ok(()),
            3 => {}
            n => return Err(scheme_err!("cannot relinearize a {}-part ciphertext", n)),
        }

        let Some(c2) = ct.parts.pop() else {
            return Err(scheme_err!("empty ciphertext"));
        };
        if self.rows.first().map(BfvCiphertext::modulus) != Some(c2.modulus()) {
            return Err(scheme_err!("relinearization key does not match ciphertext"));
        }

        let digits = gadget_decompose(&c2, self.base, self.rows.len());
        for (digit, row) in digits.iter().zip(&self.rows) {
            ct.parts[0] += &row.parts[0].mul_small(digit);
            ct.parts[1] += &row.parts[1].mul_small(digit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (SchemeParams, SecretKey, GaussianSampler) {
        let params = SchemeParams::fast_insecure_d16();
        let mut sampler = GaussianSampler::with_seed(params.sigma, 5);
        let sk = SecretKey::generate(params.ring_dim, &mut sampler);
        (params, sk, sampler)
    }

    #[test]
    fn test_gadget_decompose_recomposes() {
        let q: u128 = (1 << 100) - 15;
        let poly = Poly::from_coeffs(vec![0, 1, q - 1, 123_456_789_012_345], q);
        let digits = gadget_decompose(&poly, 1 << 16, 7);
        for k in 0..4 {
            let back = digits
                .iter()
                .rev()
                .fold(0u128, |acc, d| (acc << 16) + d[k] as u128);
            assert_eq!(back, poly.coeff(k));
        }
    }

    #[test]
    fn test_multiply_constant_polynomials() {
        let (params, sk, mut sampler) = setup();
        // constant polynomials multiply like integers mod t
        let a = BfvCiphertext::encrypt(&sk, &[300], &params, &mut sampler);
        let b = BfvCiphertext::encrypt(&sk, &[7], &params, &mut sampler);

        let product = a.multiply(&b, params.t).unwrap();
        assert_eq!(product.size(), 3);
        assert_eq!(product.decrypt(&sk, params.t)[0], 2100);
    }

    #[test]
    fn test_relinearize_preserves_plaintext() {
        let (params, sk, mut sampler) = setup();
        let rlk = RelinearizationKey::generate(&sk, &params, &mut sampler);
        assert_eq!(rlk.len(), params.gadget_len());

        let a = BfvCiphertext::encrypt(&sk, &[2, 1], &params, &mut sampler);
        let b = BfvCiphertext::encrypt(&sk, &[3], &params, &mut sampler);
        let mut product = a.multiply(&b, params.t).unwrap();
        let before = product.decrypt(&sk, params.t);

        rlk.relinearize(&mut product).unwrap();
        assert_eq!(product.size(), 2);
        assert_eq!(product.decrypt(&sk, params.t), before);
        assert_eq!(&before[..2], &[6, 3]);
    }

    #[test]
    fn test_multiply_rejects_three_part_operand() {
        let (params, sk, mut sampler) = setup();
        let a = BfvCiphertext::encrypt(&sk, &[1], &params, &mut sampler);
        let product = a.multiply(&a, params.t).unwrap();
        assert!(product.multiply(&a, params.t).is_err());
    }
}
