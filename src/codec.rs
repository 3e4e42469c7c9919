//! Fixed-point codec between real Q-values and unsigned plaintext slots
//!
//! A Q-value `q` becomes the integer `x = round(q · coeff)`, which is folded
//! into the unsigned range `[0, 2N)`: non-negative values stay put, negative
//! values are shifted by `2N`. `2N` must not exceed the plaintext modulus so
//! that slot arithmetic mod t agrees with arithmetic mod 2N on the result.
//!
//! The raw `map`/`unmap` pair is total and wraps silently outside `[-N, N)`;
//! the `*_checked` entry points reject such values with
//! [`PprlError::EncodingRange`].

use serde::{Deserialize, Serialize};

use crate::error::{PprlError, Result};
use crate::params::CodecParams;

/// Signed fixed-point ⇄ unsigned slot mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegerCodec {
    coeff: f64,
    bound: i64,
}

impl IntegerCodec {
    /// Create a codec from validated parameters
    pub fn new(params: &CodecParams) -> Result<Self> {
        params
            .validate()
            .map_err(|e| PprlError::InvalidParameters(e.to_string()))?;
        Ok(Self {
            coeff: params.coeff,
            bound: params.bound,
        })
    }

    /// Scale factor `coeff`
    pub fn coeff(&self) -> f64 {
        self.coeff
    }

    /// Range bound N
    pub fn bound(&self) -> i64 {
        self.bound
    }

    /// `[-N, N) → [0, 2N)`: negative values are shifted by `2N`
    #[inline]
    pub fn map(&self, x: i64) -> u64 {
        if x < 0 {
            (x + 2 * self.bound) as u64
        } else {
            x as u64
        }
    }

    /// `[0, 2N) → [-N, N)`: values at or above N are shifted back by `2N`
    #[inline]
    pub fn unmap(&self, u: u64) -> i64 {
        let u = u as i64;
        if u >= self.bound {
            u - 2 * self.bound
        } else {
            u
        }
    }

    /// `round(q · coeff)`
    #[inline]
    pub fn encode(&self, q: f64) -> i64 {
        (q * self.coeff).round() as i64
    }

    /// `v / coeff`
    #[inline]
    pub fn decode(&self, v: i64) -> f64 {
        v as f64 / self.coeff
    }

    /// Encode with a range check instead of silent wraparound
    pub fn encode_checked(&self, q: f64) -> Result<i64> {
        let scaled = (q * self.coeff).round();
        let bound = self.bound as f64;
        if !scaled.is_finite() || scaled < -bound || scaled >= bound {
            return Err(PprlError::EncodingRange {
                value: scaled,
                bound: self.bound,
            });
        }
        Ok(scaled as i64)
    }

    /// Map with a range check instead of silent wraparound
    pub fn map_checked(&self, x: i64) -> Result<u64> {
        if x < -self.bound || x >= self.bound {
            return Err(PprlError::EncodingRange {
                value: x as f64,
                bound: self.bound,
            });
        }
        Ok(self.map(x))
    }

    /// Q-value → plaintext slot value, rejecting out-of-range inputs
    pub fn to_slot(&self, q: f64) -> Result<u64> {
        self.map_checked(self.encode_checked(q)?)
    }

    /// Plaintext slot value → Q-value
    pub fn from_slot(&self, u: u64) -> f64 {
        self.decode(self.unmap(u))
    }

    /// Unmap and decode a decrypted slot vector
    pub fn decode_slots(&self, slots: &[u64]) -> Vec<f64> {
        slots.iter().map(|&u| self.from_slot(u)).collect()
    }
}

impl Default for IntegerCodec {
    fn default() -> Self {
        let params = CodecParams::default();
        Self {
            coeff: params.coeff,
            bound: params.bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> IntegerCodec {
        IntegerCodec::default()
    }

    #[test]
    fn test_map_unmap_full_domain() {
        let c = codec();
        for x in -c.bound()..c.bound() {
            assert_eq!(c.unmap(c.map(x)), x, "roundtrip failed for {}", x);
        }
    }

    #[test]
    fn test_map_range() {
        let c = codec();
        assert_eq!(c.map(0), 0);
        assert_eq!(c.map(9999), 9999);
        assert_eq!(c.map(-1), 19999);
        assert_eq!(c.map(-10000), 10000);
    }

    #[test]
    fn test_encode_decode_within_tolerance() {
        let c = codec();
        for &y in &[0.0, 3.25, -3.25, 0.0004, -9.9994, 1.23456, 7.0] {
            let back = c.decode(c.encode(y));
            assert!((back - y).abs() <= 1.0 / c.coeff(), "{} -> {}", y, back);
        }
    }

    #[test]
    fn test_slot_roundtrip() {
        let c = codec();
        let slot = c.to_slot(-2.5).unwrap();
        assert_eq!(slot, 17500);
        assert_eq!(c.from_slot(slot), -2.5);
    }

    #[test]
    fn test_checked_rejects_out_of_range() {
        let c = codec();
        assert!(c.encode_checked(9.999).is_ok());
        assert!(c.encode_checked(-10.0).is_ok());
        assert!(matches!(
            c.encode_checked(10.0),
            Err(PprlError::EncodingRange { bound: 10000, .. })
        ));
        assert!(c.encode_checked(-10.001).is_err());
        assert!(c.encode_checked(f64::NAN).is_err());
        assert!(c.map_checked(10000).is_err());
    }

    #[test]
    fn test_unchecked_map_wraps_silently() {
        let c = codec();
        // 10000 is outside [-N, N) and comes back as -10000
        assert_eq!(c.unmap(c.map(10000)), -10000);
    }

    #[test]
    fn test_new_rejects_bad_params() {
        let params = CodecParams {
            coeff: 0.0,
            bound: 10,
        };
        assert!(IntegerCodec::new(&params).is_err());
    }
}
