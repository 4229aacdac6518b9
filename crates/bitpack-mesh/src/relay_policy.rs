//! Pure relay decisions over a decoded packet's header fields.
//!
//! Nothing here touches a clock, an RNG, or the dedup cache — every
//! function takes the locally measured hold time as an explicit parameter
//! and returns a value, matching [`bitpack_proto::header`]'s no-clock
//! design.

use bitpack_proto::{MessageType, Packet};

/// True iff `packet` is eligible for relay at all: `flags.mesh` is set,
/// hop budget remains, and (Standard only) the packet hasn't aged out.
pub fn should_relay(packet: &Packet, hold_minutes: u16, max_age_minutes: u16) -> bool {
    match packet {
        Packet::Compact { header, .. } => header.flags.mesh && header.ttl > 0,
        Packet::Standard { header, .. } => {
            header.flags.mesh && !header.is_expired(hold_minutes, max_age_minutes)
        },
    }
}

/// Returns a copy of `packet` ready to relay: hop count decremented, and
/// for Standard mode, age advanced by `hold_minutes`. Payload bytes are
/// unchanged.
pub fn prepare_for_relay(packet: &Packet, hold_minutes: u16) -> Packet {
    match packet {
        Packet::Compact { header, payload } => {
            Packet::Compact { header: header.prepare_for_relay(), payload: payload.clone() }
        },
        Packet::Standard { header, fragment, payload } => Packet::Standard {
            header: header.prepare_for_relay(hold_minutes),
            fragment: *fragment,
            payload: payload.clone(),
        },
    }
}

/// `200*[type==SosBeacon] + 100*[flags.urgent] + 10*(15 - min(ttl,15))`.
/// Higher values relay earlier.
pub fn calculate_priority(packet: &Packet) -> u32 {
    let (message_type, urgent, ttl) = match packet {
        Packet::Compact { header, .. } => (header.message_type, header.flags.urgent, header.ttl),
        Packet::Standard { header, .. } => {
            (header.message_type, header.flags.urgent, header.hop_ttl)
        },
    };

    let sos_bonus = if message_type == MessageType::SosBeacon { 200 } else { 0 };
    let urgent_bonus = if urgent { 100 } else { 0 };
    let ttl_bonus = 10 * (15 - u32::from(ttl.min(15)));

    sos_bonus + urgent_bonus + ttl_bonus
}

/// `current_ttl - original_ttl` is unknowable from the packet alone (the
/// original TTL isn't carried on the wire); the controller tracks
/// `hop_count` itself from the first-seen TTL recorded in the dedup cache
/// and passes it to [`crate::backoff::RelayBackoff::compute_delay_ms`].
pub fn hop_count_from_ttls(original_ttl: u8, current_ttl: u8) -> u32 {
    u32::from(original_ttl.saturating_sub(current_ttl))
}

#[cfg(test)]
mod tests {
    use bitpack_proto::{
        CompactHeader, PacketFlags, Payload,
        payloads::RawPayload,
    };

    use super::*;

    fn compact(mesh: bool, ttl: u8, urgent: bool) -> Packet {
        Packet::Compact {
            header: CompactHeader {
                message_type: MessageType::Ping,
                flags: PacketFlags { mesh, urgent, ..Default::default() },
                ttl,
                message_id: 1,
            },
            payload: Payload::Raw(RawPayload { type_code: MessageType::Ping.code(), bytes: vec![] }),
        }
    }

    #[test]
    fn relay_requires_mesh_flag() {
        let packet = compact(false, 5, false);
        assert!(!should_relay(&packet, 0, 1440));
    }

    #[test]
    fn relay_requires_positive_ttl() {
        let packet = compact(true, 0, false);
        assert!(!should_relay(&packet, 0, 1440));
    }

    #[test]
    fn relay_allowed_with_mesh_and_ttl() {
        let packet = compact(true, 5, false);
        assert!(should_relay(&packet, 0, 1440));
    }

    #[test]
    fn prepare_for_relay_decrements_compact_ttl() {
        let packet = compact(true, 5, false);
        let prepared = prepare_for_relay(&packet, 0);
        match prepared {
            Packet::Compact { header, .. } => assert_eq!(header.ttl, 4),
            _ => panic!("expected Compact"),
        }
    }

    #[test]
    fn sos_beacon_outranks_urgent_flag() {
        let sos = Packet::Compact {
            header: CompactHeader {
                message_type: MessageType::SosBeacon,
                flags: PacketFlags::default(),
                ttl: 15,
                message_id: 1,
            },
            payload: Payload::Raw(RawPayload { type_code: MessageType::SosBeacon.code(), bytes: vec![] }),
        };
        let urgent = compact(true, 15, true);
        assert!(calculate_priority(&sos) > calculate_priority(&urgent));
    }

    #[test]
    fn lower_ttl_increases_priority() {
        let high_ttl = compact(true, 15, false);
        let low_ttl = compact(true, 1, false);
        assert!(calculate_priority(&low_ttl) > calculate_priority(&high_ttl));
    }

    #[test]
    fn hop_count_is_ttl_delta() {
        assert_eq!(hop_count_from_ttls(15, 12), 3);
        assert_eq!(hop_count_from_ttls(5, 10), 0);
    }
}
