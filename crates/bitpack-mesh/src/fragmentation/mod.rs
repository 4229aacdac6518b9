//! Splitting oversized payloads into fragment packets, reassembling them,
//! and driving selective-repeat retransmission of missing fragments.

mod reassembler;
mod selective_repeat;
mod splitter;

pub use reassembler::{Reassembler, ReassemblyOutcome};
pub use selective_repeat::{RetriesExceeded, SelectiveRepeat};
pub use splitter::fragment_with_headers;
