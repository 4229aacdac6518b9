//! Deterministic simulation harness for BitPack mesh scenarios.
//!
//! Provides [`SimEnv`], a virtual-clock/seeded-CSPRNG [`bitpack_core::
//! Environment`], and [`MeshTopology`], a small in-process cluster of
//! [`bitpack_mesh::MeshController`]s wired together by adjacency. Together
//! they let the end-to-end scenarios in `tests/` reproduce multi-hop relay,
//! backoff, and fragment-recovery behavior without any real BLE or network
//! I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod topology;

pub use env::SimEnv;
pub use topology::{MeshNode, MeshTopology};
