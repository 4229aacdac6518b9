//! Action-based mesh controller.
//!
//! Ties dedup, backoff, relay policy, fragmentation, and selective repeat
//! together into the inbound-packet algorithm and the origination path.
//! Like the rest of this workspace's controllers, it is Sans-IO: it takes
//! an event, returns a list of actions, and never performs I/O or touches
//! a clock/RNG except through the injected [`Environment`].

use std::collections::HashMap;
use std::time::Duration;

use bitpack_core::{Environment, MeshControllerConfig};
use bitpack_proto::{MessageType, Packet, PacketBuilder, PacketFlags, Payload, payloads::NackPayload};
use tracing::{debug, info, warn};

use crate::{
    backoff::RelayBackoff,
    dedup_cache::MessageCache,
    error::MeshError,
    fragmentation::{Reassembler, ReassemblyOutcome, SelectiveRepeat},
    message_id::assign_message_id,
    relay_policy::{calculate_priority, hop_count_from_ttls, prepare_for_relay, should_relay},
};

/// Events fed into the controller.
#[derive(Debug, Clone)]
pub enum MeshEvent {
    /// A packet arrived over the transport (already CRC-verified and
    /// decoded by [`Packet::decode`]).
    Inbound {
        /// The decoded packet.
        packet: Packet,
    },
    /// A previously scheduled relay's backoff timer fired. The caller owns
    /// the actual timer; the controller only tracks whether it was
    /// cancelled in the meantime.
    RelayTimerFired {
        /// The message ID whose relay timer fired.
        message_id: u32,
    },
    /// Periodic housekeeping: sweeps expired dedup entries and stale
    /// fragment buffers.
    Tick,
}

/// Actions the controller asks the caller to perform.
#[derive(Debug, Clone)]
pub enum MeshAction {
    /// Broadcast `packet` to all reachable peers, at the given relay
    /// priority (§4.9's `calculate_priority`, higher goes first).
    Broadcast {
        /// The packet to send.
        packet: Box<Packet>,
        /// Relative relay priority.
        priority: u32,
    },
    /// Start a cancellable timer; deliver [`MeshEvent::RelayTimerFired`]
    /// for `message_id` after `delay` unless it is cancelled first.
    ScheduleRelay {
        /// The message ID being scheduled.
        message_id: u32,
        /// Computed backoff delay.
        delay: Duration,
    },
    /// Hand a newly-seen, fully reassembled packet to the application.
    Deliver {
        /// The packet the application should see.
        packet: Box<Packet>,
    },
    /// A taxonomy event from §6, surfaced for the host application's event
    /// stream (distinct from the `tracing` diagnostics this controller
    /// also emits).
    Notify(MeshNotification),
}

/// The event taxonomy from §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshNotification {
    /// A packet was received, after dedup.
    PacketReceived {
        /// The message ID involved.
        message_id: u32,
        /// Whether this is the first time this message ID was observed.
        is_new: bool,
    },
    /// A packet was relayed onward.
    PacketRelayed {
        /// The message ID relayed.
        message_id: u32,
    },
    /// A pending relay was cancelled because the message was heard again.
    RelayCancelled {
        /// The message ID whose relay was cancelled.
        message_id: u32,
    },
    /// Selective repeat gave up retrying a fragmented message, or its
    /// reassembly buffer timed out.
    RetryExceeded {
        /// The message ID retries were exhausted for.
        message_id: u32,
    },
}

fn current_ttl(packet: &Packet) -> u8 {
    match packet {
        Packet::Compact { header, .. } => header.ttl,
        Packet::Standard { header, .. } => header.hop_ttl,
    }
}

/// Coordinates dedup, backoff, relay policy, and fragmentation for one mesh
/// node.
///
/// Fragment buffers and the message cache are two flat maps keyed by
/// `message_id`, never by pointer (§9): a fragment packet is routed to the
/// reassembler first, and only the reassembled logical packet enters the
/// dedup/backoff/relay pipeline below. A node that would need to relay a
/// still-incomplete fragmented transfer onward is out of scope here — it
/// reassembles, then re-fragments for the next hop via
/// [`crate::fragmentation::fragment_with_headers`] at the application
/// layer.
pub struct MeshController<E: Environment> {
    config: MeshControllerConfig,
    env: E,
    cache: MessageCache<E::Instant>,
    backoff: RelayBackoff,
    reassembler: Reassembler<E::Instant>,
    selective_repeat: SelectiveRepeat<E::Instant>,
    pending_relay_packets: HashMap<u32, Packet>,
}

impl<E: Environment> MeshController<E> {
    /// Builds a controller from `config` and `env`.
    pub fn new(config: MeshControllerConfig, env: E) -> Self {
        Self {
            cache: MessageCache::new(config.mesh.cache_max_size, config.mesh.cache_ttl),
            backoff: RelayBackoff::new(config.backoff),
            reassembler: Reassembler::new(
                config.fragmentation.max_buffers,
                config.fragmentation.reassembly_timeout,
            ),
            selective_repeat: SelectiveRepeat::new(config.selective_repeat),
            pending_relay_packets: HashMap::new(),
            config,
            env,
        }
    }

    /// Processes one event and returns the actions the caller should take.
    pub fn process_event(&mut self, event: MeshEvent) -> Result<Vec<MeshAction>, MeshError> {
        match event {
            MeshEvent::Inbound { packet } => {
                let now = self.env.now();
                match &packet {
                    Packet::Standard { fragment: Some(_), .. } => self.handle_fragment(packet, now),
                    _ => self.handle_whole_packet(packet, now),
                }
            },
            MeshEvent::RelayTimerFired { message_id } => Ok(self.handle_relay_fired(message_id)),
            MeshEvent::Tick => Ok(self.handle_tick()),
        }
    }

    /// Originates a new packet locally: inserts it into the dedup cache
    /// immediately (echo suppression, §4.9 "Origination") and hands it
    /// straight to the broadcast callback, with no backoff.
    pub fn broadcast(&mut self, packet: Packet) -> Vec<MeshAction> {
        let message_id = packet.message_id();
        let priority = calculate_priority(&packet);
        let now = self.env.now();
        self.cache.mark_seen(message_id, now);
        info!(message_id, priority, "originating broadcast");
        vec![MeshAction::Broadcast { packet: Box::new(packet), priority }]
    }

    fn handle_fragment(&mut self, packet: Packet, now: E::Instant) -> Result<Vec<MeshAction>, MeshError> {
        let message_id = packet.message_id();
        let fragment_index = match &packet {
            Packet::Standard { fragment: Some(fragment), .. } => fragment.fragment_index,
            _ => unreachable!("handle_fragment is only called with a fragment packet"),
        };

        match self.reassembler.add_fragment(&packet, now)? {
            ReassemblyOutcome::Pending => {
                self.selective_repeat.on_fragment_received(message_id, fragment_index);
                let missing = self.reassembler.missing_indices(message_id).unwrap_or_default();
                match self.selective_repeat.generate_nack(message_id, &missing, now) {
                    Ok(Some(nack)) => {
                        debug!(message_id, blocks = nack.blocks.len(), "requesting missing fragments");
                        let packet = self.build_nack_packet(nack)?;
                        let priority = calculate_priority(&packet);
                        Ok(vec![MeshAction::Broadcast { packet: Box::new(packet), priority }])
                    },
                    Ok(None) => Ok(Vec::new()),
                    Err(exceeded) => {
                        warn!(message_id = exceeded.message_id, "fragment retries exceeded");
                        Ok(vec![MeshAction::Notify(MeshNotification::RetryExceeded {
                            message_id: exceeded.message_id,
                        })])
                    },
                }
            },
            ReassemblyOutcome::Complete(reassembled) => {
                self.selective_repeat.forget(message_id);
                self.handle_whole_packet(*reassembled, now)
            },
        }
    }

    /// §4.9's inbound algorithm, for a complete (non-fragment, or
    /// already-reassembled) packet.
    fn handle_whole_packet(&mut self, packet: Packet, now: E::Instant) -> Result<Vec<MeshAction>, MeshError> {
        let message_id = packet.message_id();
        let mut actions = Vec::new();

        if self.backoff.on_packet_received(message_id) {
            self.pending_relay_packets.remove(&message_id);
            debug!(message_id, "pending relay cancelled: message heard again");
            actions.push(MeshAction::Notify(MeshNotification::RelayCancelled { message_id }));
        }

        let is_new = !self.cache.has_seen(message_id, now);
        self.cache.mark_seen(message_id, now);
        actions.push(MeshAction::Notify(MeshNotification::PacketReceived { message_id, is_new }));

        if !is_new {
            debug!(message_id, "duplicate packet dropped");
            return Ok(actions);
        }

        info!(message_id, message_type = ?packet.message_type(), "new packet received");
        actions.push(MeshAction::Deliver { packet: Box::new(packet.clone()) });

        if should_relay(&packet, 0, self.config.mesh.max_age_minutes) {
            let hop_count = hop_count_from_ttls(self.config.mesh.default_ttl, current_ttl(&packet));
            let delay_ms = self.backoff.compute_delay_ms(hop_count, &self.env);
            let prepared = prepare_for_relay(&packet, 0);
            self.backoff.schedule(message_id, delay_ms);
            self.pending_relay_packets.insert(message_id, prepared);
            debug!(message_id, delay_ms, "relay scheduled");
            actions.push(MeshAction::ScheduleRelay { message_id, delay: Duration::from_millis(delay_ms) });
        }

        Ok(actions)
    }

    fn handle_relay_fired(&mut self, message_id: u32) -> Vec<MeshAction> {
        if !self.backoff.fire(message_id) {
            self.pending_relay_packets.remove(&message_id);
            return Vec::new();
        }
        match self.pending_relay_packets.remove(&message_id) {
            Some(packet) => {
                let priority = calculate_priority(&packet);
                info!(message_id, "relaying packet");
                vec![
                    MeshAction::Notify(MeshNotification::PacketRelayed { message_id }),
                    MeshAction::Broadcast { packet: Box::new(packet), priority },
                ]
            },
            None => Vec::new(),
        }
    }

    fn handle_tick(&mut self) -> Vec<MeshAction> {
        let now = self.env.now();
        self.cache.cleanup(now);

        let mut timed_out = Vec::new();
        self.reassembler.cleanup(now, |message_id, _missing| timed_out.push(message_id));

        timed_out
            .into_iter()
            .map(|message_id| {
                self.selective_repeat.forget(message_id);
                warn!(message_id, "fragment reassembly timed out");
                MeshAction::Notify(MeshNotification::RetryExceeded { message_id })
            })
            .collect()
    }

    fn build_nack_packet(&self, nack: NackPayload) -> Result<Packet, MeshError> {
        let builder = PacketBuilder::new(MessageType::Nack, Payload::Nack(nack))
            .ttl(self.config.mesh.default_ttl)
            .flags(PacketFlags { mesh: true, ..Default::default() });
        Ok(assign_message_id(builder, &self.env).build()?)
    }
}
