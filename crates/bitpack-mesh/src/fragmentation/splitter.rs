//! Splits an oversized payload into Standard fragment packets.

use bitpack_proto::{
    FragmentHeader, MessageType, Packet, PacketFlags, PacketMode, Payload, StandardHeader,
    payloads::RawPayload,
};

use crate::error::MeshError;

const HEADER_AND_TRAILER: usize = StandardHeader::SIZE + 4;
const FRAGMENT_OVERHEAD: usize = FragmentHeader::SIZE;
const MAX_FRAGMENTS: usize = 4095;

/// Splits `payload_bytes` (already encoded) into one or more Standard
/// packets of at most `mtu` bytes each, reusing `message_id` across all
/// fragments. Returns a single non-fragment packet if the payload already
/// fits within one Standard packet.
pub fn fragment_with_headers(
    payload_bytes: &[u8],
    message_id: u32,
    message_type: MessageType,
    ttl: u8,
    mtu: usize,
) -> Result<Vec<Packet>, MeshError> {
    let single_packet_capacity = mtu.saturating_sub(HEADER_AND_TRAILER);

    if payload_bytes.len() <= single_packet_capacity {
        let header = StandardHeader {
            version: 0,
            message_type,
            flags: PacketFlags::default(),
            hop_ttl: ttl,
            message_id,
            security_mode: 0,
            payload_length: 0,
            age_minutes: 0,
        };
        let payload = Payload::Raw(RawPayload { type_code: message_type.code(), bytes: payload_bytes.to_vec() });
        return Ok(vec![Packet::Standard { header, fragment: None, payload }]);
    }

    let chunk_size = mtu.saturating_sub(HEADER_AND_TRAILER + FRAGMENT_OVERHEAD);
    if chunk_size == 0 {
        return Err(MeshError::MtuTooSmall { mtu });
    }

    let total = payload_bytes.len().div_ceil(chunk_size);
    if total > MAX_FRAGMENTS {
        return Err(MeshError::TooManyFragments { total, max: MAX_FRAGMENTS });
    }
    let total_fragments = total as u16;

    let mut packets = Vec::with_capacity(total);
    for (index, chunk) in payload_bytes.chunks(chunk_size).enumerate() {
        let fragment_index = index as u16;
        let header = StandardHeader {
            version: 0,
            message_type,
            flags: PacketFlags {
                is_fragment: true,
                more_fragments: fragment_index + 1 < total_fragments,
                ..Default::default()
            },
            hop_ttl: ttl,
            message_id,
            security_mode: 0,
            payload_length: 0,
            age_minutes: 0,
        };
        let fragment = FragmentHeader { fragment_index, total_fragments };
        let payload = Payload::Raw(RawPayload { type_code: message_type.code(), bytes: chunk.to_vec() });
        packets.push(Packet::Standard { header, fragment: Some(fragment), payload });
    }

    Ok(packets)
}

/// Wire mode every fragment packet uses; fragments are never Compact.
pub const FRAGMENT_MODE: PacketMode = PacketMode::Standard;
