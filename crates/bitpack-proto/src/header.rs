//! Compact and Standard header structs: encode, decode, and the
//! relative-age/TTL bookkeeping used when preparing a packet for relay.
//!
//! Headers are plain value types. They do not own a clock: the locally
//! measured hold time used by [`StandardHeader::prepare_for_relay`] is
//! computed by whichever caller owns an environment clock (the mesh
//! controller) and passed in as `hold_minutes`.

use bitpack_codec::{bits, BitReader, BitWriter};

use crate::{error::ProtocolError, flags::PacketFlags, opcode::MessageType};

/// Discriminates the two wire framings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketMode {
    /// 4-byte header, CRC-8, up to 20 bytes total.
    Compact,
    /// 11-byte header, CRC-32, payload up to 8191 bytes.
    Standard,
}

const COMPACT_HEADER_SIZE: usize = 4;
const STANDARD_HEADER_SIZE: usize = 11;
const FRAGMENT_HEADER_SIZE: usize = 3;

const MAX_COMPACT_TTL: u8 = 15;
const MAX_STANDARD_PAYLOAD_LEN: u16 = 8191;
const MAX_FRAGMENT_TOTAL: u16 = 4095;

/// The 4-byte Compact header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactHeader {
    /// Message type; must fit the 4-bit Compact codespace.
    pub message_type: MessageType,
    /// Behavioral flags (only the Compact-visible subset is meaningful).
    pub flags: PacketFlags,
    /// Remaining hop count, 0-15.
    pub ttl: u8,
    /// 16-bit message identifier.
    pub message_id: u16,
}

impl CompactHeader {
    /// Byte size of an encoded Compact header.
    pub const SIZE: usize = COMPACT_HEADER_SIZE;

    /// Validates and encodes this header to exactly [`Self::SIZE`] bytes.
    pub fn encode(&self) -> Result<[u8; COMPACT_HEADER_SIZE], ProtocolError> {
        self.message_type.require_compact_compatible()?;
        if self.ttl > MAX_COMPACT_TTL {
            return Err(ProtocolError::OutOfRange {
                field: "ttl",
                value: i64::from(self.ttl),
                min: 0,
                max: i64::from(MAX_COMPACT_TTL),
            });
        }

        let byte0 = (self.message_type.code() & 0x0F) << 3 | self.flags.compact_byte0_bits();
        let byte1 = (self.ttl & 0x0F) << 4 | self.flags.compact_byte1_bits() << 2;
        let mut out = [0u8; COMPACT_HEADER_SIZE];
        out[0] = byte0;
        out[1] = byte1;
        out[2..4].copy_from_slice(&self.message_id.to_be_bytes());
        Ok(out)
    }

    /// Decodes a Compact header from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < COMPACT_HEADER_SIZE {
            return Err(ProtocolError::InsufficientBytes {
                needed: COMPACT_HEADER_SIZE,
                available: bytes.len(),
            });
        }
        if bytes[0] & 0x80 != 0 {
            return Err(ProtocolError::InvalidMode);
        }

        let type_code = (bytes[0] >> 3) & 0x0F;
        let byte0_flag_bits = bytes[0] & 0x07;
        let ttl = (bytes[1] >> 4) & 0x0F;
        let byte1_flag_bits = (bytes[1] >> 2) & 0x03;
        let message_id = bits::read_u16_be(&bytes[2..4])?;

        let flags = PacketFlags::from_compact_byte0_bits(byte0_flag_bits)
            .with_compact_byte1_bits(byte1_flag_bits);

        Ok(Self { message_type: MessageType::from_code(type_code), flags, ttl, message_id })
    }

    /// Returns a copy with `ttl` saturating-decremented by one, per the
    /// Compact relay policy (no age tracking in Compact mode).
    pub fn prepare_for_relay(&self) -> Self {
        Self { ttl: self.ttl.saturating_sub(1), ..*self }
    }
}

/// The 11-byte Standard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardHeader {
    /// Header format version; 0 today.
    pub version: u8,
    /// Message type; 6-bit Standard codespace.
    pub message_type: MessageType,
    /// All seven behavioral flags.
    pub flags: PacketFlags,
    /// Remaining hop count, 0-255.
    pub hop_ttl: u8,
    /// 32-bit message identifier.
    pub message_id: u32,
    /// Security mode (3 bits); 0 means unencrypted.
    pub security_mode: u8,
    /// Payload length in bytes, 0-8191.
    pub payload_length: u16,
    /// Relative age in minutes since origination (never wall-clock).
    pub age_minutes: u16,
}

impl StandardHeader {
    /// Byte size of an encoded Standard header.
    pub const SIZE: usize = STANDARD_HEADER_SIZE;

    /// Validates and encodes this header to exactly [`Self::SIZE`] bytes.
    pub fn encode(&self) -> Result<[u8; STANDARD_HEADER_SIZE], ProtocolError> {
        if self.payload_length > MAX_STANDARD_PAYLOAD_LEN {
            return Err(ProtocolError::OutOfRange {
                field: "payload_length",
                value: i64::from(self.payload_length),
                min: 0,
                max: i64::from(MAX_STANDARD_PAYLOAD_LEN),
            });
        }
        if self.security_mode > 0x07 {
            return Err(ProtocolError::OutOfRange {
                field: "security_mode",
                value: i64::from(self.security_mode),
                min: 0,
                max: 7,
            });
        }

        let mut out = [0u8; STANDARD_HEADER_SIZE];
        out[0] = 1 << 7 | (self.version & 0x01) << 6 | (self.message_type.code() & 0x3F);
        out[1] = self.flags.to_standard_byte();
        out[2] = self.hop_ttl;
        out[3..7].copy_from_slice(&self.message_id.to_be_bytes());
        out[7] = (self.security_mode & 0x07) << 5 | ((self.payload_length >> 8) as u8 & 0x1F);
        out[8] = (self.payload_length & 0xFF) as u8;
        out[9..11].copy_from_slice(&self.age_minutes.to_be_bytes());
        Ok(out)
    }

    /// Decodes a Standard header from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < STANDARD_HEADER_SIZE {
            return Err(ProtocolError::InsufficientBytes {
                needed: STANDARD_HEADER_SIZE,
                available: bytes.len(),
            });
        }
        if bytes[0] & 0x80 == 0 {
            return Err(ProtocolError::InvalidMode);
        }

        let version = (bytes[0] >> 6) & 0x01;
        let type_code = bytes[0] & 0x3F;
        let flags = PacketFlags::from_standard_byte(bytes[1]);
        let hop_ttl = bytes[2];
        let message_id = bits::read_u32_be(&bytes[3..7])?;
        let security_mode = (bytes[7] >> 5) & 0x07;
        let payload_length = (u16::from(bytes[7] & 0x1F) << 8) | u16::from(bytes[8]);
        let age_minutes = bits::read_u16_be(&bytes[9..11])?;

        Ok(Self {
            version,
            message_type: MessageType::from_code(type_code),
            flags,
            hop_ttl,
            message_id,
            security_mode,
            payload_length,
            age_minutes,
        })
    }

    /// `age_minutes + hold_minutes`, saturating at `u16::MAX`.
    pub fn current_age_minutes(&self, hold_minutes: u16) -> u16 {
        self.age_minutes.saturating_add(hold_minutes)
    }

    /// Returns a new header with `hop_ttl` saturating-decremented by one
    /// and `age_minutes` advanced by `hold_minutes`, the locally measured
    /// time this node held the packet before relaying it.
    pub fn prepare_for_relay(&self, hold_minutes: u16) -> Self {
        Self {
            hop_ttl: self.hop_ttl.saturating_sub(1),
            age_minutes: self.current_age_minutes(hold_minutes),
            ..*self
        }
    }

    /// True iff this header must not be relayed: `hop_ttl == 0` or the
    /// current age has reached `max_age_minutes`.
    pub fn is_expired(&self, hold_minutes: u16, max_age_minutes: u16) -> bool {
        self.hop_ttl == 0 || self.current_age_minutes(hold_minutes) >= max_age_minutes
    }
}

/// The 3-byte fragment header, present only when `flags.is_fragment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentHeader {
    /// 0-based index of this fragment.
    pub fragment_index: u16,
    /// Total number of fragments in the logical message.
    pub total_fragments: u16,
}

impl FragmentHeader {
    /// Byte size of an encoded fragment header.
    pub const SIZE: usize = FRAGMENT_HEADER_SIZE;

    /// Validates (`index < total <= 4095`) and encodes to exactly
    /// [`Self::SIZE`] bytes.
    pub fn encode(&self) -> Result<[u8; FRAGMENT_HEADER_SIZE], ProtocolError> {
        if self.total_fragments > MAX_FRAGMENT_TOTAL {
            return Err(ProtocolError::OutOfRange {
                field: "total_fragments",
                value: i64::from(self.total_fragments),
                min: 0,
                max: i64::from(MAX_FRAGMENT_TOTAL),
            });
        }
        if self.fragment_index >= self.total_fragments {
            return Err(ProtocolError::OutOfRange {
                field: "fragment_index",
                value: i64::from(self.fragment_index),
                min: 0,
                max: i64::from(self.total_fragments) - 1,
            });
        }

        let mut writer = BitWriter::new();
        writer.write_bits(u32::from(self.fragment_index), 12);
        writer.write_bits(u32::from(self.total_fragments), 12);
        let bytes = writer.finish();
        let mut out = [0u8; FRAGMENT_HEADER_SIZE];
        out.copy_from_slice(&bytes);
        Ok(out)
    }

    /// Decodes a fragment header from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < FRAGMENT_HEADER_SIZE {
            return Err(ProtocolError::InsufficientBytes {
                needed: FRAGMENT_HEADER_SIZE,
                available: bytes.len(),
            });
        }
        let mut reader = BitReader::new(&bytes[..FRAGMENT_HEADER_SIZE]);
        let fragment_index = reader.read_bits(12)? as u16;
        let total_fragments = reader.read_bits(12)? as u16;
        if fragment_index >= total_fragments {
            return Err(ProtocolError::OutOfRange {
                field: "fragment_index",
                value: i64::from(fragment_index),
                min: 0,
                max: i64::from(total_fragments) - 1,
            });
        }
        Ok(Self { fragment_index, total_fragments })
    }
}
