//! PBKDF2-HMAC-SHA256 key derivation.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Salt size for all BitPack key derivations.
pub const SALT_LEN: usize = 16;

/// Minimum accepted PBKDF2 iteration count.
pub const MIN_ITERATIONS: u32 = 5_000;
/// Maximum accepted PBKDF2 iteration count.
pub const MAX_ITERATIONS: u32 = 100_000;
/// Default PBKDF2 iteration count when the caller has no stronger opinion.
pub const DEFAULT_ITERATIONS: u32 = 10_000;

/// A derived symmetric key. Zeroized on drop so key material does not
/// linger in memory after use.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey(Vec<u8>);

impl DerivedKey {
    /// Borrows the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the derived key in bytes (16 or 32).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the key is empty (never the case for a successfully
    /// derived key; present for API symmetry).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Derives a symmetric key from `password` and `salt` via
/// PBKDF2-HMAC-SHA256. `key_len` must be 16 (AES-128) or 32 (AES-256).
/// `iterations` must fall within `[MIN_ITERATIONS, MAX_ITERATIONS]`.
pub fn derive_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    iterations: u32,
    key_len: usize,
) -> Result<DerivedKey, CryptoError> {
    if key_len != 16 && key_len != 32 {
        return Err(CryptoError::InvalidKeyLength { len: key_len });
    }
    if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&iterations) {
        return Err(CryptoError::IterationsOutOfRange {
            iterations,
            min: MIN_ITERATIONS,
            max: MAX_ITERATIONS,
        });
    }

    let mut out = vec![0u8; key_len];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    Ok(DerivedKey(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let salt = [7u8; SALT_LEN];
        let a = derive_key("correct horse", &salt, DEFAULT_ITERATIONS, 32).unwrap();
        let b = derive_key("correct horse", &salt, DEFAULT_ITERATIONS, 32).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salts_produce_different_keys() {
        let a = derive_key("same password", &[1u8; SALT_LEN], DEFAULT_ITERATIONS, 32).unwrap();
        let b = derive_key("same password", &[2u8; SALT_LEN], DEFAULT_ITERATIONS, 32).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn rejects_invalid_key_length() {
        let salt = [0u8; SALT_LEN];
        assert!(derive_key("pw", &salt, DEFAULT_ITERATIONS, 24).is_err());
    }

    #[test]
    fn rejects_iterations_below_minimum() {
        let salt = [0u8; SALT_LEN];
        assert!(derive_key("pw", &salt, MIN_ITERATIONS - 1, 32).is_err());
    }

    #[test]
    fn rejects_iterations_above_maximum() {
        let salt = [0u8; SALT_LEN];
        assert!(derive_key("pw", &salt, MAX_ITERATIONS + 1, 32).is_err());
    }

    #[test]
    fn accepts_both_key_lengths() {
        let salt = [3u8; SALT_LEN];
        assert_eq!(derive_key("pw", &salt, DEFAULT_ITERATIONS, 16).unwrap().len(), 16);
        assert_eq!(derive_key("pw", &salt, DEFAULT_ITERATIONS, 32).unwrap().len(), 32);
    }
}
