//! The closed `MessageType` codespace.

use thiserror::Error;

/// A BitPack message type.
///
/// Compact mode can only carry types whose numeric code is `<= 0x0F`;
/// Standard-only types require Standard mode (see [`MessageType::is_standard_only`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum MessageType {
    /// SOS beacon (Compact/Standard).
    SosBeacon,
    /// Acknowledgement of an SOS beacon (Compact/Standard).
    SosAck,
    /// Location report (Compact/Standard).
    Location,
    /// Mesh keepalive ping (Compact/Standard).
    Ping,
    /// Mesh keepalive pong (Compact/Standard).
    Pong,
    /// Short text message (Compact/Standard).
    TextShort,
    /// Relay self-announcement (Compact/Standard).
    RelayAnnounce,
    /// Handshake initiation (Standard only).
    HandshakeInit,
    /// Handshake acknowledgement (Standard only).
    HandshakeAck,
    /// Encrypted data payload (Standard only).
    DataEncrypted,
    /// Acknowledgement of encrypted data (Standard only).
    DataAck,
    /// Capability query (Standard only).
    CapabilityQuery,
    /// Capability response (Standard only).
    CapabilityResponse,
    /// Selective-repeat negative acknowledgement (Standard only).
    Nack,
    /// Explicit request for a missing fragment (Standard only).
    FragmentRequest,
    /// Extended text message (Standard only).
    TextExtended,
    /// Opaque binary payload (Standard only).
    BinaryData,
    /// Group broadcast (Standard only).
    GroupBroadcast,
    /// Peer discovery announcement (Standard only).
    PeerDiscovery,
    /// Text bundled with a location (Standard only).
    TextLocation,
    /// Zero-knowledge challenge block (Standard only).
    Challenge,
    /// An unrecognized type code, preserved verbatim.
    Raw(u8),
}

/// The error raised when a [`MessageType`] cannot be used with the
/// requested [`crate::header::PacketMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OpcodeError {
    /// Code does not fit in the requested mode's codespace.
    #[error("type code 0x{code:02x} requires Standard mode")]
    RequiresStandard {
        /// The offending code.
        code: u8,
    },
}

impl MessageType {
    /// The wire code for this type.
    pub fn code(self) -> u8 {
        match self {
            Self::SosBeacon => 0x00,
            Self::SosAck => 0x01,
            Self::Location => 0x02,
            Self::Ping => 0x03,
            Self::Pong => 0x04,
            Self::TextShort => 0x05,
            Self::RelayAnnounce => 0x06,
            Self::HandshakeInit => 0x10,
            Self::HandshakeAck => 0x11,
            Self::DataEncrypted => 0x12,
            Self::DataAck => 0x13,
            Self::CapabilityQuery => 0x14,
            Self::CapabilityResponse => 0x15,
            Self::Nack => 0x16,
            Self::FragmentRequest => 0x17,
            Self::TextExtended => 0x18,
            Self::BinaryData => 0x19,
            Self::GroupBroadcast => 0x1A,
            Self::PeerDiscovery => 0x1B,
            Self::TextLocation => 0x1C,
            Self::Challenge => 0x1D,
            Self::Raw(code) => code,
        }
    }

    /// Reconstructs a [`MessageType`] from its wire code. Unknown codes
    /// (including known Standard-only codes queried by a Compact decoder)
    /// become [`MessageType::Raw`] rather than failing, per the
    /// "unknown types never fail to decode" contract.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::SosBeacon,
            0x01 => Self::SosAck,
            0x02 => Self::Location,
            0x03 => Self::Ping,
            0x04 => Self::Pong,
            0x05 => Self::TextShort,
            0x06 => Self::RelayAnnounce,
            0x10 => Self::HandshakeInit,
            0x11 => Self::HandshakeAck,
            0x12 => Self::DataEncrypted,
            0x13 => Self::DataAck,
            0x14 => Self::CapabilityQuery,
            0x15 => Self::CapabilityResponse,
            0x16 => Self::Nack,
            0x17 => Self::FragmentRequest,
            0x18 => Self::TextExtended,
            0x19 => Self::BinaryData,
            0x1A => Self::GroupBroadcast,
            0x1B => Self::PeerDiscovery,
            0x1C => Self::TextLocation,
            0x1D => Self::Challenge,
            other => Self::Raw(other),
        }
    }

    /// True if this type's code is outside the Compact 4-bit codespace.
    pub fn is_standard_only(self) -> bool {
        self.code() > 0x0F
    }

    /// Validates that this type can be encoded in Compact mode.
    pub fn require_compact_compatible(self) -> Result<(), OpcodeError> {
        if self.is_standard_only() {
            Err(OpcodeError::RequiresStandard { code: self.code() })
        } else {
            Ok(())
        }
    }
}
