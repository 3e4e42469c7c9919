//! Secure Q-table: privacy-preserving Q-learning over homomorphic encryption
//!
//! An agent's Q-table is stored as one BFV ciphertext per state at an
//! untrusted party. Updates and queries select rows with encrypted one-hot
//! vectors, so neither the stored values nor the accessed state are visible
//! in storage.
//!
//! Key components:
//! - IntegerCodec: signed fixed-point Q-values ⇄ unsigned plaintext slots
//! - Transport: chunked RSA-OAEP sealing of serialized ciphertexts
//! - Scheme adapter: the capabilities the protocol needs from a backend
//! - BFV: the in-crate backend with SIMD slots and relinearization
//! - Protocol: secure update and select over the encrypted table

pub mod params;
pub mod error;
pub mod math;
pub mod codec;
pub mod scheme;
pub mod bfv;
pub mod transport;
pub mod protocol;

pub use bfv::{BfvCiphertext, BfvScheme};
pub use codec::IntegerCodec;
pub use error::{PprlError, Result};
pub use params::{CodecParams, SchemeParams, TransportParams};
pub use protocol::{
    greedy_action, secure_select, secure_select_action, secure_update,
    ConfidentialityWaiver, EncryptedQtable, KeyMaterial, SecureQtable, SelectionVector,
};
pub use scheme::HomomorphicScheme;
pub use transport::{SealedChannel, SealedCiphertext, TransportKeys};
