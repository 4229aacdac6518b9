//! The BitPack wire format: Compact/Standard headers, the closed payload
//! set, packet framing with integrity trailers, and a fluent packet
//! builder.
//!
//! This crate is pure codec logic over [`bitpack_codec`] — it has no
//! knowledge of mesh relaying, timers, or cryptography, and no dependency
//! on a clock or RNG. Callers that need locally-measured hold time or
//! message ID generation (both require an `Environment`) live one layer
//! up, in the mesh crate.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod builder;
mod error;
mod flags;
mod header;
mod opcode;
mod packet;
pub mod payloads;

pub use builder::PacketBuilder;
pub use error::ProtocolError;
pub use flags::PacketFlags;
pub use header::{CompactHeader, FragmentHeader, PacketMode, StandardHeader};
pub use opcode::{MessageType, OpcodeError};
pub use packet::Packet;
pub use payloads::Payload;
