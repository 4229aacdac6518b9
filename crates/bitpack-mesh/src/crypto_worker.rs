//! Async wrapper dispatching PBKDF2 key derivation to a background worker.
//!
//! [`bitpack_crypto::derive_key`] is pure and synchronous, so it carries no
//! async runtime dependency of its own (§4.10). Long derivations must not
//! block the packet-receive path, so this crate — the one place in the
//! workspace that already owns an async boundary — runs it on
//! `tokio::task::spawn_blocking` instead.

use bitpack_crypto::{derive_key, DerivedKey};

use crate::error::MeshError;

/// Derives a key on a blocking worker thread, off the packet-receive path.
///
/// Forwards [`bitpack_crypto::CryptoError`] unchanged; surfaces a worker
/// panic or cancellation as [`MeshError::DerivationTaskFailed`].
pub async fn derive_key_in_background(
    password: String,
    salt: [u8; bitpack_crypto::kdf::SALT_LEN],
    iterations: u32,
    key_len: usize,
) -> Result<DerivedKey, MeshError> {
    tokio::task::spawn_blocking(move || derive_key(&password, &salt, iterations, key_len))
        .await
        .map_err(|_| MeshError::DerivationTaskFailed)?
        .map_err(MeshError::from)
}

#[cfg(test)]
mod tests {
    use bitpack_crypto::kdf::{DEFAULT_ITERATIONS, SALT_LEN};

    use super::*;

    #[tokio::test]
    async fn derivation_runs_to_completion_off_thread() {
        let key =
            derive_key_in_background("shared-secret".to_string(), [7u8; SALT_LEN], DEFAULT_ITERATIONS, 16)
                .await
                .unwrap();
        assert_eq!(key.len(), 16);
    }

    #[tokio::test]
    async fn matches_the_synchronous_derivation() {
        let salt = [3u8; SALT_LEN];
        let background =
            derive_key_in_background("pw".to_string(), salt, DEFAULT_ITERATIONS, 32).await.unwrap();
        let direct = derive_key("pw", &salt, DEFAULT_ITERATIONS, 32).unwrap();
        assert_eq!(background.as_bytes(), direct.as_bytes());
    }

    #[tokio::test]
    async fn invalid_parameters_surface_as_crypto_error() {
        let result = derive_key_in_background("pw".to_string(), [0u8; SALT_LEN], 1, 16).await;
        assert!(matches!(result, Err(MeshError::Crypto(_))));
    }
}
