//! Packet glue: mode-aware encode (header ‖ payload ‖ CRC) and CRC-first
//! fail-fast decode.

use bitpack_codec::{Crc32, Crc8};

use crate::{
    error::ProtocolError,
    header::{CompactHeader, FragmentHeader, PacketMode, StandardHeader},
    opcode::MessageType,
    payloads::{Payload, RawPayload},
};

/// A fully framed packet: header, payload, and (implicitly) its integrity
/// trailer, which is computed fresh on every [`Packet::encode`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Compact-mode packet: 4-byte header, CRC-8 trailer.
    Compact {
        /// The Compact header.
        header: CompactHeader,
        /// The payload carried by this packet.
        payload: Payload,
    },
    /// Standard-mode packet: 11-byte header, CRC-32 trailer.
    Standard {
        /// The Standard header.
        header: StandardHeader,
        /// Fragment header, present iff `header.flags.is_fragment`.
        fragment: Option<FragmentHeader>,
        /// The payload carried by this packet. When `fragment` is `Some`,
        /// this is a [`Payload::Raw`] wrapping the fragment's opaque chunk
        /// bytes; reassembly happens above this layer.
        payload: Payload,
    },
}

impl Packet {
    /// The wire mode of this packet.
    pub fn mode(&self) -> PacketMode {
        match self {
            Self::Compact { .. } => PacketMode::Compact,
            Self::Standard { .. } => PacketMode::Standard,
        }
    }

    /// The message type carried by this packet's header.
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Compact { header, .. } => header.message_type,
            Self::Standard { header, .. } => header.message_type,
        }
    }

    /// The message ID, widened to `u32` for uniform handling.
    pub fn message_id(&self) -> u32 {
        match self {
            Self::Compact { header, .. } => u32::from(header.message_id),
            Self::Standard { header, .. } => header.message_id,
        }
    }

    /// Encodes header ‖ payload ‖ trailer. For Standard packets, the
    /// header's `payload_length` is recomputed from the actual payload
    /// bytes before encoding so invariant I6 always holds.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Compact { header, payload } => {
                let mut out = Vec::with_capacity(CompactHeader::SIZE + payload.size_in_bytes() + 1);
                out.extend_from_slice(&header.encode()?);
                out.extend_from_slice(&payload.encode()?);
                let crc = Crc8::compute(&out);
                out.push(crc);
                Ok(out)
            },
            Self::Standard { header, fragment, payload } => {
                let mut body = Vec::new();
                if let Some(fragment) = fragment {
                    body.extend_from_slice(&fragment.encode()?);
                }
                body.extend_from_slice(&payload.encode()?);

                let mut header = *header;
                header.payload_length = u16::try_from(body.len()).map_err(|_| ProtocolError::OutOfRange {
                    field: "payload_length",
                    value: body.len() as i64,
                    min: 0,
                    max: 8191,
                })?;

                let mut out = Vec::with_capacity(StandardHeader::SIZE + body.len() + 4);
                out.extend_from_slice(&header.encode()?);
                out.extend_from_slice(&body);
                let crc = Crc32::compute(&out);
                out.extend_from_slice(&crc.to_be_bytes());
                Ok(out)
            },
        }
    }

    /// Decodes a packet. CRC is validated before any header or payload
    /// field is interpreted; a mismatch is `CrcMismatch` and nothing past
    /// the mode bit is ever parsed.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mode_byte = *bytes.first().ok_or(ProtocolError::InsufficientBytes { needed: 1, available: 0 })?;

        if mode_byte & 0x80 == 0 {
            Crc8::verify_or_error(bytes).map_err(|_| ProtocolError::CrcMismatch)?;
            let body = &bytes[..bytes.len() - 1];
            let header = CompactHeader::decode(body)?;
            let payload_bytes = &body[CompactHeader::SIZE..];
            let payload = Payload::decode(header.message_type, payload_bytes, PacketMode::Compact)?;
            Ok(Self::Compact { header, payload })
        } else {
            Crc32::verify_or_error(bytes).map_err(|_| ProtocolError::CrcMismatch)?;
            let body = &bytes[..bytes.len() - 4];
            let header = StandardHeader::decode(body)?;
            let rest = body.get(StandardHeader::SIZE..).ok_or(ProtocolError::InsufficientBytes {
                needed: StandardHeader::SIZE,
                available: body.len(),
            })?;
            let payload_bytes = rest.get(..usize::from(header.payload_length)).ok_or(
                ProtocolError::InsufficientBytes {
                    needed: usize::from(header.payload_length),
                    available: rest.len(),
                },
            )?;

            if header.flags.is_fragment {
                if payload_bytes.len() < FragmentHeader::SIZE {
                    return Err(ProtocolError::InsufficientBytes {
                        needed: FragmentHeader::SIZE,
                        available: payload_bytes.len(),
                    });
                }
                let fragment = FragmentHeader::decode(payload_bytes)?;
                let chunk = &payload_bytes[FragmentHeader::SIZE..];
                let payload = Payload::Raw(RawPayload::decode(header.message_type.code(), chunk));
                Ok(Self::Standard { header, fragment: Some(fragment), payload })
            } else {
                let payload = Payload::decode(header.message_type, payload_bytes, PacketMode::Standard)?;
                Ok(Self::Standard { header, fragment: None, payload })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{flags::PacketFlags, payloads::sos::SosType};

    fn sos_compact() -> Packet {
        let payload = Payload::Sos(crate::payloads::SosPayload {
            sos_type: SosType::Trapped,
            people_count: 3,
            has_injured: true,
            is_trapped: true,
            latitude: 41.0082,
            longitude: 28.9784,
            phone_digits: Some("90533123".into()),
            altitude_meters: 10,
            battery_coded: 10,
        });
        let header = CompactHeader {
            message_type: MessageType::SosBeacon,
            flags: PacketFlags { mesh: true, ..Default::default() },
            ttl: 3,
            message_id: 1,
        };
        Packet::Compact { header, payload }
    }

    #[test]
    fn sos_compact_roundtrip_is_20_bytes() {
        let packet = sos_compact();
        let bytes = packet.encode().unwrap();
        assert_eq!(bytes.len(), 20);
        let decoded = Packet::decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn crc_fail_fast_on_bit_flip() {
        let packet = sos_compact();
        let mut bytes = packet.encode().unwrap();
        bytes[0] ^= 0x01;
        assert_eq!(Packet::decode(&bytes), Err(ProtocolError::CrcMismatch));
    }

    #[test]
    fn standard_roundtrip_with_text() {
        let header = StandardHeader {
            version: 0,
            message_type: MessageType::TextShort,
            flags: PacketFlags { mesh: true, ..Default::default() },
            hop_ttl: 10,
            message_id: 123,
            security_mode: 0,
            payload_length: 0,
            age_minutes: 0,
        };
        let payload =
            Payload::Text(crate::payloads::TextPayload { sender: None, recipient: None, text: "hi".into() });
        let packet = Packet::Standard { header, fragment: None, payload };
        let bytes = packet.encode().unwrap();
        let decoded = Packet::decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn standard_fragment_flagged_packet_decodes_as_raw_chunk() {
        let header = StandardHeader {
            version: 0,
            message_type: MessageType::BinaryData,
            flags: PacketFlags { mesh: true, is_fragment: true, more_fragments: true, ..Default::default() },
            hop_ttl: 10,
            message_id: 999,
            security_mode: 0,
            payload_length: 0,
            age_minutes: 0,
        };
        let fragment = FragmentHeader { fragment_index: 0, total_fragments: 3 };
        let payload = Payload::Raw(RawPayload { type_code: MessageType::BinaryData.code(), bytes: vec![9, 9, 9] });
        let packet = Packet::Standard { header, fragment: Some(fragment), payload };
        let bytes = packet.encode().unwrap();
        let decoded = Packet::decode(&bytes).unwrap();
        match decoded {
            Packet::Standard { fragment: Some(f), payload: Payload::Raw(raw), .. } => {
                assert_eq!(f, fragment);
                assert_eq!(raw.bytes, vec![9, 9, 9]);
            },
            other => panic!("unexpected decode result: {other:?}"),
        }
    }

    #[test]
    fn crc_failure_never_reaches_payload_dispatch() {
        let packet = sos_compact();
        let mut bytes = packet.encode().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert_eq!(Packet::decode(&bytes), Err(ProtocolError::CrcMismatch));
    }
}
