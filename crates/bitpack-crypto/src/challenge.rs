//! Zero-knowledge challenge block: proves knowledge of a shared secret
//! without transmitting it.

use crate::{
    aead::{decrypt_with_header, encrypt_with_header, NONCE_LEN},
    error::CryptoError,
};

/// The fixed marker every valid challenge plaintext starts with.
pub const MARKER: &[u8; 8] = b"BITPACK\0";

/// Plaintext size: 8-byte marker plus 8 random bytes.
pub const PLAINTEXT_LEN: usize = 16;

/// Builds the 16-byte challenge plaintext from an 8-byte random suffix.
pub fn build_plaintext(random_suffix: [u8; 8]) -> [u8; PLAINTEXT_LEN] {
    let mut plaintext = [0u8; PLAINTEXT_LEN];
    plaintext[..8].copy_from_slice(MARKER);
    plaintext[8..].copy_from_slice(&random_suffix);
    plaintext
}

/// Encrypts a fresh challenge under `key`, authenticating `header_bytes`.
pub fn encrypt_challenge(
    key: &[u8],
    header_bytes: &[u8],
    random_suffix: [u8; 8],
    nonce: [u8; NONCE_LEN],
) -> Result<Vec<u8>, CryptoError> {
    let plaintext = build_plaintext(random_suffix);
    encrypt_with_header(&plaintext, key, header_bytes, nonce)
}

/// Decrypts and verifies a challenge envelope. Returns `Ok(())` iff
/// decryption succeeds and the plaintext's first 8 bytes equal [`MARKER`].
pub fn verify_challenge(envelope: &[u8], key: &[u8], header_bytes: &[u8]) -> Result<(), CryptoError> {
    let plaintext = decrypt_with_header(envelope, key, header_bytes)?;
    if plaintext.len() == PLAINTEXT_LEN && &plaintext[..8] == MARKER {
        Ok(())
    } else {
        Err(CryptoError::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [4u8; 32];
    const NONCE: [u8; NONCE_LEN] = [2u8; NONCE_LEN];

    #[test]
    fn valid_challenge_verifies() {
        let envelope = encrypt_challenge(&KEY, b"hdr", [0xAB; 8], NONCE).unwrap();
        assert!(verify_challenge(&envelope, &KEY, b"hdr").is_ok());
    }

    #[test]
    fn wrong_key_fails_verification() {
        let envelope = encrypt_challenge(&KEY, b"hdr", [0xAB; 8], NONCE).unwrap();
        assert!(verify_challenge(&envelope, &[9u8; 32], b"hdr").is_err());
    }

    #[test]
    fn plaintext_always_starts_with_marker() {
        let plaintext = build_plaintext([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&plaintext[..8], MARKER);
    }
}
