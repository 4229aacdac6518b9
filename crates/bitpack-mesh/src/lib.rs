//! Mesh relay logic for BitPack: the action-based [`MeshController`] that
//! ties dedup, broadcast-storm-prevention backoff, fragmentation, and
//! selective repeat into the inbound-packet and origination algorithms.
//!
//! Like [`bitpack_proto`], this crate touches no I/O directly. The
//! controller is Sans-IO: it consumes [`MeshEvent`]s and returns
//! [`MeshAction`]s, and reaches a clock or RNG only through the
//! [`bitpack_core::Environment`] it is built with. The caller owns sockets,
//! timers, and the event loop that drives [`MeshController::process_event`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod backoff;
mod controller;
mod crypto_worker;
mod dedup_cache;
mod error;
mod fragmentation;
mod message_id;
mod registry;
mod relay_policy;

pub use backoff::{PendingRelay, RelayBackoff};
pub use controller::{MeshAction, MeshController, MeshEvent, MeshNotification};
pub use crypto_worker::derive_key_in_background;
pub use dedup_cache::{MessageCache, MessageCacheEntry};
pub use error::MeshError;
pub use fragmentation::{ReassemblyOutcome, Reassembler, RetriesExceeded, SelectiveRepeat, fragment_with_headers};
pub use message_id::{assign_message_id, estimate_age_windows, generate, generate_compact, generate_standard};
pub use registry::{PeerId, PeerInfo, PeerRegistry};
pub use relay_policy::{calculate_priority, hop_count_from_ttls, prepare_for_relay, should_relay};
