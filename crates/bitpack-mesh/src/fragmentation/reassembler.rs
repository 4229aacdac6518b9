//! Reassembles Standard fragment packets back into a logical payload, and
//! re-synthesizes a complete [`Packet`].
//!
//! Generic over `Instant` to support both real time and virtual time for
//! deterministic testing, the same way this workspace's connection state
//! machine is.

use std::collections::BTreeMap;
use std::ops::Sub;
use std::time::{Duration, Instant};

use bitpack_proto::{Packet, PacketFlags, Payload, StandardHeader, payloads::RawPayload};
use lru::LruCache;

use crate::error::MeshError;

/// Per-message fragment accumulator.
struct FragmentBuffer<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    total: u16,
    chunks: BTreeMap<u16, Vec<u8>>,
    message_type_code: u8,
    header_template: StandardHeader,
    first_seen: I,
    last_activity: I,
}

impl<I> FragmentBuffer<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    fn is_complete(&self) -> bool {
        self.chunks.len() == usize::from(self.total)
    }

    fn concat(&self) -> Vec<u8> {
        self.chunks.values().flat_map(|chunk| chunk.iter().copied()).collect()
    }
}

/// Outcome of adding a fragment to the reassembler.
#[derive(Debug)]
pub enum ReassemblyOutcome {
    /// Message is still incomplete; more fragments are expected.
    Pending,
    /// Message is complete; the re-synthesized, fragmentation-flag-free
    /// packet is ready.
    Complete(Box<Packet>),
}

/// Bounded LRU reassembly buffer pool.
pub struct Reassembler<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    buffers: LruCache<u32, FragmentBuffer<I>>,
    timeout: Duration,
}

impl<I> Reassembler<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Creates a reassembler bounded to `max_buffers` concurrent in-flight
    /// messages, each evicted after `timeout` without activity.
    pub fn new(max_buffers: usize, timeout: Duration) -> Self {
        let capacity = std::num::NonZeroUsize::new(max_buffers)
            .unwrap_or(std::num::NonZeroUsize::new(1).unwrap());
        Self { buffers: LruCache::new(capacity), timeout }
    }

    /// Adds a fragment packet. `packet` must be a Standard packet carrying
    /// `flags.is_fragment` and a [`bitpack_proto::FragmentHeader`].
    pub fn add_fragment(&mut self, packet: &Packet, now: I) -> Result<ReassemblyOutcome, MeshError> {
        let Packet::Standard { header, fragment: Some(fragment), payload } = packet else {
            return Err(MeshError::MissingFragment);
        };
        let Payload::Raw(raw) = payload else {
            return Err(MeshError::MissingFragment);
        };

        let message_id = header.message_id;
        if let Some(existing) = self.buffers.peek(&message_id) {
            if existing.total != fragment.total_fragments {
                return Err(MeshError::FragmentTotalMismatch {
                    message_id,
                    expected: existing.total,
                    got: fragment.total_fragments,
                });
            }
        }

        if self.buffers.peek(&message_id).is_none() {
            self.buffers.put(message_id, FragmentBuffer {
                total: fragment.total_fragments,
                chunks: BTreeMap::new(),
                message_type_code: raw.type_code,
                header_template: *header,
                first_seen: now,
                last_activity: now,
            });
        }
        let buffer = self.buffers.get_mut(&message_id).expect("just inserted or already present");

        buffer.chunks.insert(fragment.fragment_index, raw.bytes.clone());
        buffer.last_activity = now;

        if buffer.is_complete() {
            let reassembled_bytes = buffer.concat();
            let mut header = buffer.header_template;
            header.flags = PacketFlags { is_fragment: false, more_fragments: false, ..header.flags };
            header.payload_length = 0;
            let payload =
                Payload::Raw(RawPayload { type_code: buffer.message_type_code, bytes: reassembled_bytes });
            self.buffers.pop(&message_id);
            Ok(ReassemblyOutcome::Complete(Box::new(Packet::Standard { header, fragment: None, payload })))
        } else {
            Ok(ReassemblyOutcome::Pending)
        }
    }

    /// Set of fragment indices still missing for `message_id`, or `None`
    /// if there is no in-flight buffer for it.
    pub fn missing_indices(&self, message_id: u32) -> Option<Vec<u16>> {
        let buffer = self.buffers.peek(&message_id)?;
        Some((0..buffer.total).filter(|i| !buffer.chunks.contains_key(i)).collect())
    }

    /// How long a still-incomplete message has been in flight, for
    /// diagnostics.
    pub fn age(&self, message_id: u32, now: I) -> Option<Duration> {
        let buffer = self.buffers.peek(&message_id)?;
        Some(now - buffer.first_seen)
    }

    /// Removes buffers that haven't been touched within the configured
    /// timeout, invoking `on_timeout` for each with its message_id and the
    /// indices that were never received.
    pub fn cleanup(&mut self, now: I, mut on_timeout: impl FnMut(u32, Vec<u16>)) {
        let timed_out: Vec<u32> = self
            .buffers
            .iter()
            .filter(|(_, buffer)| now - buffer.last_activity >= self.timeout)
            .map(|(id, _)| *id)
            .collect();

        for id in timed_out {
            if let Some(buffer) = self.buffers.pop(&id) {
                let missing: Vec<u16> = (0..buffer.total).filter(|i| !buffer.chunks.contains_key(i)).collect();
                on_timeout(id, missing);
            }
        }
    }

    /// Number of in-flight reassembly buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether there are no in-flight buffers.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use bitpack_proto::MessageType;

    use super::*;
    use crate::fragmentation::splitter::fragment_with_headers;

    #[test]
    fn complete_sequence_reassembles_to_original_bytes() {
        let payload: Vec<u8> = (0..2000u32).map(|i| (i % 256) as u8).collect();
        let packets = fragment_with_headers(&payload, 7, MessageType::BinaryData, 15, 244).unwrap();

        let mut reassembler = Reassembler::new(10, Duration::from_secs(300));
        let now = Instant::now();
        let mut outcome = None;
        for packet in &packets {
            outcome = Some(reassembler.add_fragment(packet, now).unwrap());
        }

        match outcome.unwrap() {
            ReassemblyOutcome::Complete(packet) => match *packet {
                Packet::Standard { header, payload: Payload::Raw(raw), .. } => {
                    assert!(!header.flags.is_fragment);
                    assert_eq!(raw.bytes, payload);
                },
                _ => panic!("expected raw Standard payload"),
            },
            ReassemblyOutcome::Pending => panic!("expected completion"),
        }
    }

    #[test]
    fn out_of_order_arrival_still_completes() {
        let payload = vec![0xCD; 1000];
        let mut packets = fragment_with_headers(&payload, 1, MessageType::BinaryData, 15, 244).unwrap();
        packets.reverse();

        let mut reassembler = Reassembler::new(10, Duration::from_secs(300));
        let now = Instant::now();
        let mut last = None;
        for packet in &packets {
            last = Some(reassembler.add_fragment(packet, now).unwrap());
        }
        assert!(matches!(last.unwrap(), ReassemblyOutcome::Complete(_)));
    }

    #[test]
    fn mismatched_total_is_rejected() {
        let payload = vec![0u8; 1000];
        let packets = fragment_with_headers(&payload, 1, MessageType::BinaryData, 15, 244).unwrap();
        let mut reassembler = Reassembler::new(10, Duration::from_secs(300));
        let now = Instant::now();
        reassembler.add_fragment(&packets[0], now).unwrap();

        let Packet::Standard { header, mut fragment, payload } = packets[1].clone() else { panic!() };
        if let Some(ref mut f) = fragment {
            f.total_fragments += 1;
        }
        let tampered = Packet::Standard { header, fragment, payload };
        assert!(reassembler.add_fragment(&tampered, now).is_err());
    }

    #[test]
    fn cleanup_evicts_stale_buffers_and_reports_missing() {
        let payload = vec![0u8; 1000];
        let packets = fragment_with_headers(&payload, 1, MessageType::BinaryData, 15, 244).unwrap();
        let mut reassembler = Reassembler::new(10, Duration::from_millis(10));
        let start = Instant::now();
        reassembler.add_fragment(&packets[0], start).unwrap();

        let mut reported = None;
        reassembler.cleanup(start + Duration::from_millis(50), |id, missing| {
            reported = Some((id, missing));
        });

        assert_eq!(reassembler.len(), 0);
        let (id, missing) = reported.unwrap();
        assert_eq!(id, 1);
        assert!(!missing.is_empty());
    }

    #[test]
    fn missing_indices_reports_unreceived_fragments() {
        let payload = vec![0u8; 1000];
        let packets = fragment_with_headers(&payload, 1, MessageType::BinaryData, 15, 244).unwrap();
        let mut reassembler = Reassembler::new(10, Duration::from_secs(300));
        let now = Instant::now();
        reassembler.add_fragment(&packets[0], now).unwrap();
        let missing = reassembler.missing_indices(1).unwrap();
        assert!(!missing.contains(&0));
        assert!(missing.contains(&1));
    }
}
