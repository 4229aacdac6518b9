//! LRU duplicate-suppression cache for inbound message IDs.
//!
//! Generic over `Instant` to support both real time and virtual time for
//! deterministic testing, the same way this workspace's connection state
//! machine is.

use std::ops::Sub;
use std::time::{Duration, Instant};

use lru::LruCache;

/// Per-message bookkeeping kept by the dedup cache.
#[derive(Debug, Clone)]
pub struct MessageCacheEntry<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// When this message ID was first observed.
    pub first_seen: I,
    /// When this message ID was last touched (seen again, or relayed to).
    pub last_access: I,
    /// Count of distinct peers this message has already been relayed to,
    /// for per-peer dedup via [`MessageCacheEntry::relayed_to_peers`].
    pub relayed_to_peers: Vec<u64>,
}

impl<I> MessageCacheEntry<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    fn new(now: I) -> Self {
        Self { first_seen: now, last_access: now, relayed_to_peers: Vec::new() }
    }
}

/// Bounded, TTL-aware duplicate cache over message IDs.
///
/// Entries older than `ttl` are treated as absent and evicted lazily, on
/// access or via [`MessageCache::cleanup`].
pub struct MessageCache<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    entries: LruCache<u32, MessageCacheEntry<I>>,
    ttl: Duration,
}

impl<I> MessageCache<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Creates a cache bounded to `max_size` entries, each expiring after
    /// `ttl`.
    #[allow(clippy::unwrap_used)]
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        let capacity =
            std::num::NonZeroUsize::new(max_size).unwrap_or(std::num::NonZeroUsize::new(1).unwrap());
        Self { entries: LruCache::new(capacity), ttl }
    }

    fn is_expired(&self, entry: &MessageCacheEntry<I>, now: I) -> bool {
        now - entry.first_seen >= self.ttl
    }

    /// Whether `id` has already been seen and hasn't expired. Expired
    /// entries are evicted as a side effect.
    pub fn has_seen(&mut self, id: u32, now: I) -> bool {
        let expired = match self.entries.peek(&id) {
            Some(entry) => self.is_expired(entry, now),
            None => return false,
        };
        if expired {
            self.entries.pop(&id);
            false
        } else {
            true
        }
    }

    /// Marks `id` as seen, inserting a fresh entry or promoting an existing
    /// one to most-recently-used.
    pub fn mark_seen(&mut self, id: u32, now: I) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.last_access = now;
        } else {
            self.entries.put(id, MessageCacheEntry::new(now));
        }
    }

    /// Records that `id` was relayed to `peer`, for per-peer dedup.
    pub fn mark_relayed_to(&mut self, id: u32, peer: u64, now: I) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.last_access = now;
            if !entry.relayed_to_peers.contains(&peer) {
                entry.relayed_to_peers.push(peer);
            }
        }
    }

    /// Current number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sweeps and removes every entry older than `ttl`.
    pub fn cleanup(&mut self, now: I) {
        let expired: Vec<u32> = self
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            self.entries.pop(&id);
        }
    }
}
