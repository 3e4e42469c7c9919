//! Error handling for the secure Q-table stack
//!
//! One stable error type shared by the codec, the transport, the scheme
//! backend and the protocol. No component retries; every failure surfaces to
//! the Update/Select caller.

use std::fmt;

/// Secure Q-table operation error
#[derive(Debug)]
pub enum PprlError {
    /// Chunked asymmetric seal/open failed (wrong key, corrupted chunk, staging I/O).
    ///
    /// `chunk` is the index of the failing chunk when one is known.
    Transport {
        chunk: Option<usize>,
        reason: String,
    },
    /// Homomorphic backend failure: parameter mismatch, malformed or foreign
    /// ciphertext, multiply before relinearize, (de)serialization.
    Scheme(String),
    /// Fixed-point value outside `[-bound, bound)` before mapping.
    EncodingRange { value: f64, bound: i64 },
    /// Selection vector is not one-hot or an index is out of range.
    InvalidSelection(String),
    /// Parameter sets are inconsistent with each other.
    InvalidParameters(String),
}

impl fmt::Display for PprlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PprlError::Transport {
                chunk: Some(idx),
                reason,
            } => write!(f, "transport error at chunk {}: {}", idx, reason),
            PprlError::Transport { chunk: None, reason } => {
                write!(f, "transport error: {}", reason)
            }
            PprlError::Scheme(msg) => write!(f, "scheme error: {}", msg),
            PprlError::EncodingRange { value, bound } => write!(
                f,
                "fixed-point value {} outside representable range [-{}, {})",
                value, bound, bound
            ),
            PprlError::InvalidSelection(msg) => write!(f, "invalid selection: {}", msg),
            PprlError::InvalidParameters(msg) => write!(f, "invalid parameters: {}", msg),
        }
    }
}

impl std::error::Error for PprlError {}

impl PprlError {
    /// Transport failure tied to a specific chunk
    pub fn chunk(idx: usize, reason: impl fmt::Display) -> Self {
        Self::Transport {
            chunk: Some(idx),
            reason: reason.to_string(),
        }
    }

    /// Transport failure not tied to a chunk
    pub fn transport(reason: impl fmt::Display) -> Self {
        Self::Transport {
            chunk: None,
            reason: reason.to_string(),
        }
    }
}

impl From<bincode::Error> for PprlError {
    fn from(err: bincode::Error) -> Self {
        Self::Scheme(format!("serialization: {}", err))
    }
}

impl From<std::io::Error> for PprlError {
    fn from(err: std::io::Error) -> Self {
        Self::transport(err)
    }
}

/// Result type for secure Q-table operations
pub type Result<T> = std::result::Result<T, PprlError>;

/// Create a `PprlError::Scheme` with format string support
macro_rules! scheme_err {
    ($($arg:tt)*) => {
        $crate::error::PprlError::Scheme(format!($($arg)*))
    };
}

/// Create a `PprlError::InvalidSelection` with format string support
macro_rules! selection_err {
    ($($arg:tt)*) => {
        $crate::error::PprlError::InvalidSelection(format!($($arg)*))
    };
}

pub(crate) use scheme_err;
pub(crate) use selection_err;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_chunk() {
        let err = PprlError::chunk(3, "decryption error");
        assert_eq!(err.to_string(), "transport error at chunk 3: decryption error");
    }

    #[test]
    fn test_encoding_range_display() {
        let err = PprlError::EncodingRange {
            value: 12000.0,
            bound: 10000,
        };
        assert!(err.to_string().contains("[-10000, 10000)"));
    }

    #[test]
    fn test_macro_builds_scheme_error() {
        let err = scheme_err!("ring dim {} != {}", 16, 32);
        assert!(matches!(err, PprlError::Scheme(ref m) if m == "ring dim 16 != 32"));
    }
}
