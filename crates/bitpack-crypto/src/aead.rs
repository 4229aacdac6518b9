//! AES-GCM envelope encryption with the packet header as associated data.
//!
//! All functions are pure: the nonce is supplied by the caller rather than
//! drawn from an RNG owned by this crate, so this crate carries no CSPRNG
//! dependency and stays deterministic for testing. Production callers draw
//! the nonce from an `Environment`.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes128Gcm, Aes256Gcm, Nonce,
};

use crate::error::CryptoError;

/// Nonce size for AES-GCM.
pub const NONCE_LEN: usize = 12;
/// Authentication tag size for AES-GCM.
pub const TAG_LEN: usize = 16;

enum Cipher {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl Cipher {
    fn new(key: &[u8]) -> Result<Self, CryptoError> {
        match key.len() {
            16 => Ok(Self::Aes128(Box::new(
                Aes128Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength { len: key.len() })?,
            ))),
            32 => Ok(Self::Aes256(Box::new(
                Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength { len: key.len() })?,
            ))),
            len => Err(CryptoError::InvalidKeyLength { len }),
        }
    }

    fn encrypt(&self, nonce: &Nonce, payload: Payload<'_, '_>) -> Result<Vec<u8>, CryptoError> {
        match self {
            Self::Aes128(cipher) => cipher.encrypt(nonce, payload).map_err(|_| CryptoError::AuthenticationFailed),
            Self::Aes256(cipher) => cipher.encrypt(nonce, payload).map_err(|_| CryptoError::AuthenticationFailed),
        }
    }

    fn decrypt(&self, nonce: &Nonce, payload: Payload<'_, '_>) -> Result<Vec<u8>, CryptoError> {
        match self {
            Self::Aes128(cipher) => cipher.decrypt(nonce, payload).map_err(|_| CryptoError::AuthenticationFailed),
            Self::Aes256(cipher) => cipher.decrypt(nonce, payload).map_err(|_| CryptoError::AuthenticationFailed),
        }
    }
}

/// Encrypts `plaintext` under `key`, authenticating `header_bytes` as
/// associated data. `key` must be 16 or 32 bytes. Returns
/// `nonce ‖ ciphertext ‖ tag`.
pub fn encrypt_with_header(
    plaintext: &[u8],
    key: &[u8],
    header_bytes: &[u8],
    nonce: [u8; NONCE_LEN],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Cipher::new(key)?;
    let nonce_ga = Nonce::from_slice(&nonce);
    let sealed = cipher.encrypt(nonce_ga, Payload { msg: plaintext, aad: header_bytes })?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypts an envelope produced by [`encrypt_with_header`]. `header_bytes`
/// must match what was authenticated at encryption time. Returns
/// [`CryptoError::AuthenticationFailed`] on any tag mismatch, wrong key, or
/// wrong header — never partial plaintext.
pub fn decrypt_with_header(envelope: &[u8], key: &[u8], header_bytes: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if envelope.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::AuthenticationFailed);
    }
    let cipher = Cipher::new(key)?;
    let nonce = Nonce::from_slice(&envelope[..NONCE_LEN]);
    let sealed = &envelope[NONCE_LEN..];
    cipher.decrypt(nonce, Payload { msg: sealed, aad: header_bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY16: [u8; 16] = [9u8; 16];
    const KEY32: [u8; 32] = [9u8; 32];
    const NONCE: [u8; NONCE_LEN] = [1u8; NONCE_LEN];

    #[test]
    fn roundtrip_aes128() {
        let envelope = encrypt_with_header(b"hello mesh", &KEY16, b"header", NONCE).unwrap();
        let plaintext = decrypt_with_header(&envelope, &KEY16, b"header").unwrap();
        assert_eq!(plaintext, b"hello mesh");
    }

    #[test]
    fn roundtrip_aes256() {
        let envelope = encrypt_with_header(b"hello mesh", &KEY32, b"header", NONCE).unwrap();
        let plaintext = decrypt_with_header(&envelope, &KEY32, b"header").unwrap();
        assert_eq!(plaintext, b"hello mesh");
    }

    #[test]
    fn wrong_header_fails_authentication() {
        let envelope = encrypt_with_header(b"hello mesh", &KEY16, b"header-a", NONCE).unwrap();
        assert_eq!(decrypt_with_header(&envelope, &KEY16, b"header-b"), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let mut envelope = encrypt_with_header(b"hello mesh", &KEY16, b"header", NONCE).unwrap();
        let last = envelope.len() - 1;
        envelope[last] ^= 0xFF;
        assert!(decrypt_with_header(&envelope, &KEY16, b"header").is_err());
    }

    #[test]
    fn truncated_envelope_fails_cleanly() {
        assert_eq!(decrypt_with_header(&[0u8; 4], &KEY16, b"header"), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn invalid_key_length_rejected() {
        assert!(encrypt_with_header(b"x", &[0u8; 20], b"header", NONCE).is_err());
    }
}
