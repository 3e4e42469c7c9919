//! Plaintext-modulus number theory: inverses, powers and roots of unity.
//!
//! These operate on the (small, prime) plaintext modulus t, where the SIMD
//! slot encoding lives. All values fit in u64 and products in u128.

/// Compute a modular inverse using extended Euclidean algorithm.
///
/// Returns `None` when `a` is not invertible modulo `modulus`.
pub fn mod_inverse(a: u64, modulus: u64) -> Option<u64> {
    let mut t: i128 = 0;
    let mut new_t: i128 = 1;
    let mut r: i128 = modulus as i128;
    let mut new_r: i128 = (a % modulus) as i128;

    while new_r != 0 {
        let quotient = r / new_r;
        let tmp_t = t - quotient * new_t;
        t = new_t;
        new_t = tmp_t;

        let tmp_r = r - quotient * new_r;
        r = new_r;
        new_r = tmp_r;
    }

    if r != 1 {
        return None;
    }

    if t < 0 {
        t += modulus as i128;
    }
    Some(t as u64)
}

/// Modular exponentiation by squaring.
pub fn pow_mod(base: u64, mut exp: u64, modulus: u64) -> u64 {
    let m = modulus as u128;
    let mut result: u128 = 1 % m;
    let mut b = base as u128 % m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * b % m;
        }
        b = b * b % m;
        exp >>= 1;
    }
    result as u64
}

/// Deterministic primality check by trial division
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Find a primitive `2n`-th root of unity modulo prime `t`.
///
/// Requires `n` a power of two with `2n | t - 1`. Since the order is a power of
/// two, ψ is primitive exactly when ψ^n ≡ -1.
pub fn primitive_2n_root(n: u64, t: u64) -> Option<u64> {
    let order = 2 * n;
    if n == 0 || !n.is_power_of_two() || (t - 1) % order != 0 {
        return None;
    }
    let cofactor = (t - 1) / order;
    (2..t)
        .map(|x| pow_mod(x, cofactor, t))
        .find(|&psi| pow_mod(psi, n, t) == t - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 65537;

    #[test]
    fn test_mod_inverse() {
        let inv = mod_inverse(16, T).unwrap();
        assert_eq!((16 * inv) % T, 1);
        assert_eq!(mod_inverse(4, 8), None);
    }

    #[test]
    fn test_pow_mod() {
        assert_eq!(pow_mod(3, 0, T), 1);
        assert_eq!(pow_mod(2, 16, T), T - 1);
    }

    #[test]
    fn test_is_prime() {
        assert!(is_prime(65537));
        assert!(is_prime(2));
        assert!(!is_prime(20017)); // 37 · 541
        assert!(!is_prime(1));
        assert!(is_prime(4_294_967_291)); // largest prime below 2^32
        assert!(!is_prime(4_294_967_297)); // F5 = 641 · 6700417
    }

    #[test]
    fn test_primitive_root_order() {
        for n in [4u64, 16, 64] {
            let psi = primitive_2n_root(n, T).unwrap();
            assert_eq!(pow_mod(psi, 2 * n, T), 1);
            assert_eq!(pow_mod(psi, n, T), T - 1);
        }
    }

    #[test]
    fn test_primitive_root_requires_divisibility() {
        // 2·3 does not divide 65536
        assert_eq!(primitive_2n_root(3, T), None);
        // 2n must divide t - 1 = 16
        assert_eq!(primitive_2n_root(16, 17), None);
    }
}
