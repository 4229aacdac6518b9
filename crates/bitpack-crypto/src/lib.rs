//! Key derivation and AEAD envelope encryption for BitPack's encrypted
//! payloads.
//!
//! Stateless by design: every message is encrypted under a key freshly
//! derived from a password and salt via PBKDF2, then sealed with AES-GCM
//! using the packet header as associated data. There is no forward-secret
//! ratchet — a compromised password compromises every message encrypted
//! under it, which is an accepted tradeoff for a protocol whose shared
//! secret is a human-memorable passphrase exchanged out of band.
//!
//! Pure functions throughout: nonces and random suffixes are supplied by
//! the caller rather than drawn from an RNG owned by this crate, so it has
//! no CSPRNG dependency and stays deterministic for testing.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod challenge;
mod error;
pub mod kdf;

pub use aead::{decrypt_with_header, encrypt_with_header};
pub use error::CryptoError;
pub use kdf::{derive_key, DerivedKey};
