//! Crypto error taxonomy.

use thiserror::Error;

/// Errors raised by key derivation and AEAD operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// AES-GCM authentication tag did not verify, or the ciphertext was
    /// too short to contain a nonce and tag. No partial plaintext is ever
    /// returned on this path.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The requested key length is not one this module supports.
    #[error("invalid key length {len}, expected 16 or 32")]
    InvalidKeyLength {
        /// The rejected length.
        len: usize,
    },

    /// PBKDF2 iteration count fell outside the configured bounds.
    #[error("iteration count {iterations} out of range [{min}, {max}]")]
    IterationsOutOfRange {
        /// The rejected iteration count.
        iterations: u32,
        /// Minimum accepted value.
        min: u32,
        /// Maximum accepted value.
        max: u32,
    },
}
