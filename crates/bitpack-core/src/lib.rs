//! Environment abstraction and shared configuration for BitPack.
//!
//! This crate sits below every other BitPack crate: it owns the
//! [`Environment`] trait that decouples mesh logic from wall-clock time and
//! system randomness, the production [`SystemEnv`] implementation, and the
//! per-subsystem configuration structs composed into [`MeshControllerConfig`].
//!
//! It has no error enum of its own — there is nothing here that fails.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod system_env;

pub use config::{
    BackoffConfig, CryptoConfig, FragmentationConfig, MeshConfig, MeshControllerConfig,
    PeerRegistryConfig, SelectiveRepeatConfig,
};
pub use env::Environment;
pub use system_env::SystemEnv;
