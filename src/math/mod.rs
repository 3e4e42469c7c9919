//! Mathematical primitives for the BFV backend.
//!
//! - **Modular arithmetic** over Z_q for a u128 modulus q < 2^110
//! - **Polynomial operations** over R_q = Z_q[X]/(X^d + 1), schoolbook negacyclic
//! - **Discrete Gaussian and ternary sampling** for errors and secrets
//! - **Roots of unity** modulo the plaintext prime t for SIMD slot encoding
//!
//! # Example
//!
//! ```
//! use secure_qtable::math::{GaussianSampler, Poly};
//!
//! let q: u128 = (1 << 100) - 15;
//! let mut sampler = GaussianSampler::with_seed(3.2, 0);
//! let e = Poly::sample_gaussian(16, q, &mut sampler);
//! assert!(e.linf_norm() <= 20);
//! ```

pub mod gaussian;
pub mod modular;
pub mod poly;
pub mod roots;

pub use gaussian::GaussianSampler;
pub use modular::ModQ;
pub use poly::{small_negacyclic_mul, Poly};
pub use roots::{mod_inverse, pow_mod, primitive_2n_root};
