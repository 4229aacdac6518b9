//! Fluent packet assembly with automatic Compact/Standard mode selection.

use crate::{
    error::ProtocolError,
    flags::PacketFlags,
    header::{CompactHeader, PacketMode, StandardHeader},
    opcode::MessageType,
    packet::Packet,
    payloads::Payload,
};

const COMPACT_MAX_TTL: u8 = 15;
const COMPACT_MAX_PAYLOAD_SIZE: usize = 15;

/// Builds a [`Packet`] from application-level intent, choosing Compact or
/// Standard mode per [`PacketBuilder::determine_mode`] unless the caller
/// pins one explicitly.
///
/// The builder never generates a message ID itself — that requires a
/// clock and CSPRNG (see [`crate::header`] module docs), which this crate
/// does not own. Callers must supply one via [`PacketBuilder::message_id`].
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    message_type: MessageType,
    mode: Option<PacketMode>,
    message_id: Option<u32>,
    ttl: u8,
    security_mode: u8,
    flags: PacketFlags,
    payload: Payload,
    age_minutes: u16,
}

impl PacketBuilder {
    /// Starts building a packet carrying `payload` under `message_type`.
    pub fn new(message_type: MessageType, payload: Payload) -> Self {
        Self {
            message_type,
            mode: None,
            message_id: None,
            ttl: COMPACT_MAX_TTL,
            security_mode: 0,
            flags: PacketFlags::default(),
            payload,
            age_minutes: 0,
        }
    }

    /// Pins the wire mode, overriding [`Self::determine_mode`].
    pub fn mode(mut self, mode: PacketMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the message ID. Required before [`Self::build`] unless the
    /// caller supplies one through other means.
    pub fn message_id(mut self, id: u32) -> Self {
        self.message_id = Some(id);
        self
    }

    /// Sets the remaining hop count.
    pub fn ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the security mode (0 = unencrypted).
    pub fn security_mode(mut self, security_mode: u8) -> Self {
        self.security_mode = security_mode;
        self
    }

    /// Sets all behavioral flags at once.
    pub fn flags(mut self, flags: PacketFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the relative age in minutes (nonzero forces Standard mode).
    pub fn age_minutes(mut self, age_minutes: u16) -> Self {
        self.age_minutes = age_minutes;
        self
    }

    /// Applies §4.11's auto-selection rule: Standard if the type requires
    /// it, or security/encryption/fragmentation/age/ttl/payload size push
    /// past what Compact can express; Compact otherwise.
    pub fn determine_mode(&self) -> PacketMode {
        let needs_standard = self.message_type.is_standard_only()
            || self.security_mode != 0
            || self.flags.encrypted
            || self.flags.is_fragment
            || self.flags.more_fragments
            || self.age_minutes > 0
            || self.ttl > COMPACT_MAX_TTL
            || self.payload.size_in_bytes() > COMPACT_MAX_PAYLOAD_SIZE;

        if needs_standard {
            PacketMode::Standard
        } else {
            PacketMode::Compact
        }
    }

    /// Assembles the final [`Packet`]. Fails if no message ID was
    /// supplied, or if the chosen mode's header validation rejects the
    /// configured fields (e.g. a Standard-only type forced into Compact).
    pub fn build(self) -> Result<Packet, ProtocolError> {
        let mode = self.mode.unwrap_or_else(|| self.determine_mode());
        let message_id = self.message_id.ok_or(ProtocolError::InsufficientBytes { needed: 1, available: 0 })?;

        match mode {
            PacketMode::Compact => {
                let message_id = u16::try_from(message_id).map_err(|_| ProtocolError::OutOfRange {
                    field: "message_id",
                    value: i64::from(message_id),
                    min: 0,
                    max: i64::from(u16::MAX),
                })?;
                let header = CompactHeader { message_type: self.message_type, flags: self.flags, ttl: self.ttl, message_id };
                header.encode()?;
                Ok(Packet::Compact { header, payload: self.payload })
            },
            PacketMode::Standard => {
                let header = StandardHeader {
                    version: 0,
                    message_type: self.message_type,
                    flags: self.flags,
                    hop_ttl: self.ttl,
                    message_id,
                    security_mode: self.security_mode,
                    payload_length: 0,
                    age_minutes: self.age_minutes,
                };
                Ok(Packet::Standard { header, fragment: None, payload: self.payload })
            },
        }
    }
}
