//! The closed set of typed payloads and the `Payload` dispatch enum.
//!
//! Unlike a self-describing format, the wire type code in the header is
//! what determines which payload variant follows — there is no redundant
//! tag inside the payload bytes themselves.

pub mod ack;
pub mod challenge;
pub mod location;
pub mod nack;
pub mod raw;
pub mod sos;
pub mod text;
pub mod text_location;

use crate::{error::ProtocolError, header::PacketMode, opcode::MessageType};

pub use ack::{AckPayload, AckStatus, IdWidth};
pub use challenge::ChallengePayload;
pub use location::LocationPayload;
pub use nack::{NackBlock, NackPayload};
pub use raw::RawPayload;
pub use sos::{SosPayload, SosType};
pub use text::TextPayload;
pub use text_location::TextLocationPayload;

/// Any payload carried by a packet, dispatched by the header's
/// [`MessageType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// SOS beacon.
    Sos(SosPayload),
    /// Location report.
    Location(LocationPayload),
    /// Short text message.
    Text(TextPayload),
    /// Acknowledgement.
    Ack(AckPayload),
    /// Selective-repeat NACK.
    Nack(NackPayload),
    /// Text bundled with a location.
    TextLocation(TextLocationPayload),
    /// Zero-knowledge challenge block.
    Challenge(ChallengePayload),
    /// Opaque bytes for an unrecognized type code.
    Raw(RawPayload),
}

impl Payload {
    /// Encoded size in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Self::Sos(p) => p.size_in_bytes(),
            Self::Location(p) => p.size_in_bytes(),
            Self::Text(p) => p.size_in_bytes(),
            Self::Ack(p) => p.size_in_bytes(),
            Self::Nack(p) => p.size_in_bytes(),
            Self::TextLocation(p) => p.size_in_bytes(),
            Self::Challenge(p) => p.size_in_bytes(),
            Self::Raw(p) => p.size_in_bytes(),
        }
    }

    /// Encodes this payload to its wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Sos(p) => p.encode(),
            Self::Location(p) => p.encode(),
            Self::Text(p) => p.encode(),
            Self::Ack(p) => p.encode(),
            Self::Nack(p) => p.encode(),
            Self::TextLocation(p) => p.encode(),
            Self::Challenge(p) => p.encode(),
            Self::Raw(p) => Ok(p.encode()),
        }
    }

    /// Dispatches on `message_type` to decode `bytes` as the matching
    /// payload variant. Unknown types never fail: they become
    /// [`Payload::Raw`].
    pub fn decode(message_type: MessageType, bytes: &[u8], mode: PacketMode) -> Result<Self, ProtocolError> {
        let id_width = match mode {
            PacketMode::Compact => IdWidth::Bits16,
            PacketMode::Standard => IdWidth::Bits32,
        };
        match message_type {
            MessageType::SosBeacon => Ok(Self::Sos(SosPayload::decode(bytes)?)),
            MessageType::SosAck | MessageType::DataAck => {
                Ok(Self::Ack(AckPayload::decode(bytes, id_width)?))
            },
            MessageType::Location => Ok(Self::Location(LocationPayload::decode(bytes)?)),
            MessageType::TextShort | MessageType::TextExtended => Ok(Self::Text(TextPayload::decode(bytes)?)),
            MessageType::Nack => Ok(Self::Nack(NackPayload::decode(bytes)?)),
            MessageType::TextLocation => Ok(Self::TextLocation(TextLocationPayload::decode(bytes)?)),
            MessageType::Challenge => Ok(Self::Challenge(ChallengePayload::decode(bytes)?)),
            MessageType::Ping
            | MessageType::Pong
            | MessageType::RelayAnnounce
            | MessageType::HandshakeInit
            | MessageType::HandshakeAck
            | MessageType::DataEncrypted
            | MessageType::CapabilityQuery
            | MessageType::CapabilityResponse
            | MessageType::FragmentRequest
            | MessageType::BinaryData
            | MessageType::GroupBroadcast
            | MessageType::PeerDiscovery
            | MessageType::Raw(_) => {
                Ok(Self::Raw(RawPayload::decode(message_type.code(), bytes)))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_decodes_as_raw_not_error() {
        let decoded = Payload::decode(MessageType::Raw(0x3A), &[1, 2, 3], PacketMode::Standard).unwrap();
        assert!(matches!(decoded, Payload::Raw(_)));
    }

    #[test]
    fn sos_beacon_dispatches_to_sos_variant() {
        let payload = SosPayload {
            sos_type: SosType::GeneralDistress,
            people_count: 1,
            has_injured: false,
            is_trapped: false,
            latitude: 0.0,
            longitude: 0.0,
            phone_digits: None,
            altitude_meters: 0,
            battery_coded: 0,
        };
        let bytes = payload.encode().unwrap();
        let decoded = Payload::decode(MessageType::SosBeacon, &bytes, PacketMode::Compact).unwrap();
        assert!(matches!(decoded, Payload::Sos(_)));
    }

    #[test]
    fn ack_uses_id_width_matching_mode() {
        let payload = AckPayload {
            original_message_id: 7,
            id_width: IdWidth::Bits16,
            status: AckStatus::Received,
            reason: None,
        };
        let bytes = payload.encode().unwrap();
        let decoded = Payload::decode(MessageType::SosAck, &bytes, PacketMode::Compact).unwrap();
        match decoded {
            Payload::Ack(ack) => assert_eq!(ack.id_width, IdWidth::Bits16),
            other => panic!("expected Ack, got {other:?}"),
        }
    }
}
