//! Optional peer registry: per-peer sighting/relay bookkeeping used to give
//! the mesh controller a link-aware relay hint.
//!
//! The controller works correctly (broadcast-only) without this — it is an
//! additive, swappable component, not a dependency of §4.9's core relay
//! algorithm.

use std::collections::VecDeque;

use lru::LruCache;

/// Opaque peer identifier (e.g. a BLE connection handle or MAC-derived id).
pub type PeerId = u64;

/// Per-peer sighting and relay history.
#[derive(Debug, Clone)]
pub struct PeerInfo {
    /// Most recently observed received-signal-strength indicator.
    pub last_rssi: i8,
    /// Total number of messages seen from this peer.
    pub messages_seen: u64,
    /// Message IDs most recently relayed to this peer (bounded, oldest
    /// dropped first).
    relayed_to: VecDeque<u32>,
}

const RELAYED_TO_HISTORY: usize = 64;

impl PeerInfo {
    fn new(rssi: i8) -> Self {
        Self { last_rssi: rssi, messages_seen: 1, relayed_to: VecDeque::new() }
    }
}

/// Bounded registry of recently seen peers.
pub struct PeerRegistry {
    peers: LruCache<PeerId, PeerInfo>,
}

impl PeerRegistry {
    /// Creates a registry bounded to `max_peers` entries.
    #[allow(clippy::unwrap_used)]
    pub fn new(max_peers: usize) -> Self {
        let capacity =
            std::num::NonZeroUsize::new(max_peers).unwrap_or(std::num::NonZeroUsize::new(1).unwrap());
        Self { peers: LruCache::new(capacity) }
    }

    /// Records that `peer` was heard with `rssi`, updating its sighting
    /// count and promoting it to most-recently-used.
    pub fn record_sighting(&mut self, peer: PeerId, rssi: i8) {
        if let Some(info) = self.peers.get_mut(&peer) {
            info.last_rssi = rssi;
            info.messages_seen += 1;
        } else {
            self.peers.put(peer, PeerInfo::new(rssi));
        }
    }

    /// Records that `message_id` was relayed to `peer`.
    pub fn record_relay(&mut self, peer: PeerId, message_id: u32) {
        if let Some(info) = self.peers.get_mut(&peer) {
            if info.relayed_to.len() >= RELAYED_TO_HISTORY {
                info.relayed_to.pop_front();
            }
            info.relayed_to.push_back(message_id);
        }
    }

    /// Info for a known peer, if any.
    pub fn info(&self, peer: PeerId) -> Option<&PeerInfo> {
        self.peers.peek(&peer)
    }

    /// Peers ranked by recency (most recently used first), excluding
    /// `exclude`. A candidate relay-target ordering for link-aware
    /// relaying.
    pub fn relay_candidates(&self, exclude: &[PeerId]) -> Vec<PeerId> {
        self.peers.iter().map(|(peer, _)| *peer).filter(|peer| !exclude.contains(peer)).collect()
    }

    /// Number of tracked peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
