//! In-process relay topology: a small cluster of [`MeshController`]s wired
//! together by adjacency, with no real BLE or network I/O.
//!
//! Broadcast actions are delivered synchronously to a node's neighbors;
//! scheduled relay timers are left pending until the scenario explicitly
//! fires them, mirroring how the controller hands timer ownership to its
//! caller rather than driving one itself.

use std::collections::HashMap;

use bitpack_core::{Environment, MeshControllerConfig};
use bitpack_mesh::{MeshAction, MeshController, MeshError, MeshEvent, MeshNotification};
use bitpack_proto::Packet;

use crate::env::SimEnv;

/// One simulated mesh node: a controller plus everything it has produced
/// so far, for the scenario to assert against.
pub struct MeshNode<E: Environment> {
    /// The controller under test.
    pub controller: MeshController<E>,
    /// Packets handed to the application via [`MeshAction::Deliver`].
    pub delivered: Vec<Packet>,
    /// Notifications emitted via [`MeshAction::Notify`].
    pub notifications: Vec<MeshNotification>,
    pending_relays: HashMap<u32, std::time::Duration>,
}

impl<E: Environment> MeshNode<E> {
    fn new(config: MeshControllerConfig, env: E) -> Self {
        Self {
            controller: MeshController::new(config, env),
            delivered: Vec::new(),
            notifications: Vec::new(),
            pending_relays: HashMap::new(),
        }
    }

    /// Message IDs this node has a relay timer pending for.
    pub fn pending_relay_ids(&self) -> Vec<u32> {
        self.pending_relays.keys().copied().collect()
    }
}

/// A cluster of mesh nodes connected by an adjacency list.
///
/// `links[i]` lists the neighbor indices node `i` can reach directly (a
/// BLE broadcast from `i` is heard by exactly those nodes).
pub struct MeshTopology<E: Environment> {
    nodes: Vec<MeshNode<E>>,
    links: Vec<Vec<usize>>,
}

impl MeshTopology<SimEnv> {
    /// Builds a line topology `0 - 1 - 2 - ... - (count-1)`, the shape
    /// used by the multi-hop mesh scenarios.
    pub fn line(count: usize, config: MeshControllerConfig, seed: u64) -> Self {
        let links = (0..count)
            .map(|i| {
                let mut neighbors = Vec::new();
                if i > 0 {
                    neighbors.push(i - 1);
                }
                if i + 1 < count {
                    neighbors.push(i + 1);
                }
                neighbors
            })
            .collect();
        Self::new(links, config, SimEnv::with_seed(seed))
    }
}

impl<E: Environment + Clone> MeshTopology<E> {
    /// Builds a topology from an explicit adjacency list, all nodes
    /// sharing clones of the same `env`.
    pub fn new(links: Vec<Vec<usize>>, config: MeshControllerConfig, env: E) -> Self {
        let nodes = links.iter().map(|_| MeshNode::new(config, env.clone())).collect();
        Self { nodes, links }
    }

    /// Read-only access to a node's state.
    pub fn node(&self, index: usize) -> &MeshNode<E> {
        &self.nodes[index]
    }

    /// Originates `packet` at `node` (no backoff, immediate broadcast to
    /// its neighbors), per the controller's origination path.
    pub fn originate(&mut self, node: usize, packet: Packet) -> Result<(), MeshError> {
        let actions = self.nodes[node].controller.broadcast(packet);
        self.apply(node, actions)
    }

    /// Feeds `packet` to `node` as if it arrived over the air, without it
    /// coming from a neighbor's broadcast (used to replay the same bytes
    /// at a node a second time).
    pub fn inject(&mut self, node: usize, packet: Packet) -> Result<(), MeshError> {
        let actions = self.nodes[node].controller.process_event(MeshEvent::Inbound { packet })?;
        self.apply(node, actions)
    }

    /// Fires `node`'s pending relay timer for `message_id`, as if its
    /// backoff delay had elapsed without being cancelled.
    pub fn fire_relay(&mut self, node: usize, message_id: u32) -> Result<(), MeshError> {
        self.nodes[node].pending_relays.remove(&message_id);
        let actions =
            self.nodes[node].controller.process_event(MeshEvent::RelayTimerFired { message_id })?;
        self.apply(node, actions)
    }

    /// Delivers a housekeeping tick to `node` (dedup/reassembly sweep).
    pub fn tick(&mut self, node: usize) -> Result<(), MeshError> {
        let actions = self.nodes[node].controller.process_event(MeshEvent::Tick)?;
        self.apply(node, actions)
    }

    fn apply(&mut self, node: usize, actions: Vec<MeshAction>) -> Result<(), MeshError> {
        let neighbors = self.links[node].clone();
        for action in actions {
            match action {
                MeshAction::Broadcast { packet, .. } => {
                    for &neighbor in &neighbors {
                        let heard =
                            self.nodes[neighbor].controller.process_event(MeshEvent::Inbound {
                                packet: (*packet).clone(),
                            })?;
                        self.apply(neighbor, heard)?;
                    }
                },
                MeshAction::ScheduleRelay { message_id, delay } => {
                    self.nodes[node].pending_relays.insert(message_id, delay);
                },
                MeshAction::Deliver { packet } => self.nodes[node].delivered.push(*packet),
                MeshAction::Notify(notification) => self.nodes[node].notifications.push(notification),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bitpack_proto::{CompactHeader, MessageType, PacketFlags, Payload, payloads::RawPayload};

    use super::*;

    fn compact(message_id: u16, ttl: u8) -> Packet {
        Packet::Compact {
            header: CompactHeader {
                message_type: MessageType::Ping,
                flags: PacketFlags { mesh: true, ..Default::default() },
                ttl,
                message_id,
            },
            payload: Payload::Raw(RawPayload { type_code: MessageType::Ping.code(), bytes: vec![] }),
        }
    }

    #[test]
    fn origination_reaches_the_immediate_neighbor() {
        let mut topology = MeshTopology::line(3, MeshControllerConfig::default(), 1);
        topology.originate(0, compact(1, 5)).unwrap();
        assert_eq!(topology.node(1).delivered.len(), 1);
        assert!(topology.node(2).delivered.is_empty());
        assert_eq!(topology.node(1).pending_relay_ids(), vec![1]);
    }

    #[test]
    fn firing_the_relay_reaches_the_next_hop() {
        let mut topology = MeshTopology::line(3, MeshControllerConfig::default(), 1);
        topology.originate(0, compact(1, 5)).unwrap();
        topology.fire_relay(1, 1).unwrap();
        assert_eq!(topology.node(2).delivered.len(), 1);
    }
}
