//! Modular arithmetic operations over a u128 modulus
//!
//! All helpers require `q < 2^110` so that a residue shifted by one 16-bit
//! limb still fits in a `u128` without overflow.

/// Largest supported modulus bit-width.
pub const MAX_MODULUS_BITS: u32 = 110;

const LIMB_BITS: u32 = 16;
const LIMB_MASK: u128 = (1 << LIMB_BITS) - 1;

/// Modular arithmetic operations over Z_q
pub struct ModQ;

impl ModQ {
    /// Add two values modulo q
    #[inline]
    pub fn add(a: u128, b: u128, q: u128) -> u128 {
        let sum = a + b;
        if sum >= q {
            sum - q
        } else {
            sum
        }
    }

    /// Subtract two values modulo q
    #[inline]
    pub fn sub(a: u128, b: u128, q: u128) -> u128 {
        if a >= b {
            a - b
        } else {
            q - (b - a)
        }
    }

    /// Multiply two values modulo q
    ///
    /// Processes `b` in 16-bit limbs (Horner) so no intermediate exceeds 2^127.
    pub fn mul(a: u128, b: u128, q: u128) -> u128 {
        let a = a % q;
        let b = b % q;
        let limbs = (128 - b.leading_zeros()).div_ceil(LIMB_BITS);

        let mut acc: u128 = 0;
        for limb_idx in (0..limbs).rev() {
            let limb = (b >> (limb_idx * LIMB_BITS)) & LIMB_MASK;
            acc = ((acc << LIMB_BITS) % q + (a * limb) % q) % q;
        }
        acc
    }

    /// Multiply by a small factor (< 2^16) without the limb loop
    #[inline]
    pub fn mul_small(a: u128, small: u128, q: u128) -> u128 {
        debug_assert!(small <= LIMB_MASK, "small factor must fit in 16 bits");
        (a * small) % q
    }

    /// Negate a value modulo q
    #[inline]
    pub fn negate(a: u128, q: u128) -> u128 {
        if a == 0 {
            0
        } else {
            q - a
        }
    }

    /// Convert a signed integer to its representation in Z_q
    #[inline]
    pub fn from_signed(val: i128, q: u128) -> u128 {
        let abs = val.unsigned_abs() % q;
        if val >= 0 {
            abs
        } else {
            Self::negate(abs, q)
        }
    }

    /// Convert from Z_q to signed representation in (-q/2, q/2]
    #[inline]
    pub fn to_signed(val: u128, q: u128) -> i128 {
        if val <= q / 2 {
            val as i128
        } else {
            -((q - val) as i128)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q: u128 = (1 << 100) - 15;

    #[test]
    fn test_add() {
        assert_eq!(ModQ::add(5, 7, Q), 12);
        assert_eq!(ModQ::add(Q - 1, 2, Q), 1);
    }

    #[test]
    fn test_sub() {
        assert_eq!(ModQ::sub(10, 3, Q), 7);
        assert_eq!(ModQ::sub(3, 10, Q), Q - 7);
    }

    #[test]
    fn test_mul_matches_small_product() {
        assert_eq!(ModQ::mul(5, 7, Q), 35);
        assert_eq!(ModQ::mul(1 << 60, 1 << 30, Q), 1 << 90);
    }

    #[test]
    fn test_mul_wraps() {
        // 2^100 ≡ 15 (mod Q), so 2^60 · 2^40 ≡ 15
        assert_eq!(ModQ::mul(1 << 60, 1 << 40, Q), 15);
        // (Q-1)^2 ≡ 1
        assert_eq!(ModQ::mul(Q - 1, Q - 1, Q), 1);
    }

    #[test]
    fn test_mul_small() {
        assert_eq!(ModQ::mul_small(Q - 1, 3, Q), Q - 3);
    }

    #[test]
    fn test_negate() {
        assert_eq!(ModQ::negate(5, Q), Q - 5);
        assert_eq!(ModQ::negate(0, Q), 0);
    }

    #[test]
    fn test_signed_roundtrip() {
        assert_eq!(ModQ::from_signed(5, Q), 5);
        assert_eq!(ModQ::from_signed(-5, Q), Q - 5);
        assert_eq!(ModQ::to_signed(Q - 5, Q), -5);
        assert_eq!(ModQ::to_signed(5, Q), 5);
    }
}
