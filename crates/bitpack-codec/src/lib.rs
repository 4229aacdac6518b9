//! Bit/byte level codecs, CRC engines, and field encodings shared by the
//! BitPack wire format.
//!
//! This crate has no knowledge of headers, payloads, or packets — it only
//! provides the primitives those higher layers are built from: big-endian
//! integer I/O, sub-byte bit-field packing, VarInt/ZigZag, CRC-8/CRC-32,
//! and the GPS/BCD field encodings used by the SOS and location payloads.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bcd;
pub mod bits;
pub mod crc;
mod error;
pub mod gps;
pub mod varint;

pub use bits::{BitReader, BitWriter};
pub use crc::{Crc8, Crc32};
pub use error::CodecError;
