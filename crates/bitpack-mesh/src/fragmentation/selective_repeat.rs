//! Selective-repeat NACK strategy: decide when to ask for missing
//! fragments, and how to group the request into blocks.
//!
//! Generic over `Instant` to support both real time and virtual time for
//! deterministic testing, the same way this workspace's connection state
//! machine is.

use std::collections::{HashMap, HashSet};
use std::ops::Sub;
use std::time::{Duration, Instant};

use bitpack_core::SelectiveRepeatConfig;
use bitpack_proto::payloads::{NackBlock, NackPayload};

const BLOCK_SPAN: u16 = 12;

/// Per-message NACK bookkeeping.
#[derive(Debug, Clone)]
struct TrackedMessage<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    nack_count: u32,
    last_nack_at: Option<I>,
    pending_fragments: HashSet<u16>,
}

/// Drives NACK generation for in-flight fragmented messages.
pub struct SelectiveRepeat<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    config: SelectiveRepeatConfig,
    tracked: HashMap<u32, TrackedMessage<I>>,
}

/// Terminal outcome when a message exceeds its retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetriesExceeded {
    /// The message that was given up on.
    pub message_id: u32,
}

impl<I> SelectiveRepeat<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Creates a tracker from `config`.
    pub fn new(config: SelectiveRepeatConfig) -> Self {
        Self { config, tracked: HashMap::new() }
    }

    fn entry(&mut self, message_id: u32) -> &mut TrackedMessage<I> {
        self.tracked.entry(message_id).or_insert_with(|| TrackedMessage {
            nack_count: 0,
            last_nack_at: None,
            pending_fragments: HashSet::new(),
        })
    }

    /// Generates a NACK for `message_id` given its currently missing
    /// indices, or `None` if no NACK should be sent: the buffer is
    /// complete, retries are exhausted, or the retry interval hasn't
    /// elapsed yet.
    pub fn generate_nack(
        &mut self,
        message_id: u32,
        missing: &[u16],
        now: I,
    ) -> Result<Option<NackPayload>, RetriesExceeded> {
        if missing.is_empty() {
            self.tracked.remove(&message_id);
            return Ok(None);
        }

        let tracked = self.entry(message_id);

        if tracked.nack_count >= self.config.max_retries {
            self.tracked.remove(&message_id);
            return Err(RetriesExceeded { message_id });
        }

        if let Some(last) = tracked.last_nack_at {
            if now - last < self.config.retry_interval {
                return Ok(None);
            }
        }

        let mut sorted: Vec<u16> = missing.to_vec();
        sorted.sort_unstable();

        let mut blocks = Vec::new();
        let mut i = 0;
        while i < sorted.len() && blocks.len() < self.config.max_blocks_per_nack {
            let start_index = sorted[i] - (sorted[i] % BLOCK_SPAN);
            let mut missing_bitmask = 0u16;
            while i < sorted.len() && sorted[i] < start_index + BLOCK_SPAN {
                missing_bitmask |= 1 << (sorted[i] - start_index);
                i += 1;
            }
            blocks.push(NackBlock { start_index, missing_bitmask });
        }

        let tracked = self.entry(message_id);
        tracked.nack_count += 1;
        tracked.last_nack_at = Some(now);
        tracked.pending_fragments = sorted[..i.min(sorted.len())].iter().copied().collect();

        Ok(Some(NackPayload { original_message_id: message_id, blocks }))
    }

    /// Removes `index` from the set of fragments currently pending
    /// retransmission for `message_id`, once it has arrived.
    pub fn on_fragment_received(&mut self, message_id: u32, index: u16) {
        if let Some(tracked) = self.tracked.get_mut(&message_id) {
            tracked.pending_fragments.remove(&index);
        }
    }

    /// Drops all bookkeeping for `message_id` (the message completed, or
    /// was given up on).
    pub fn forget(&mut self, message_id: u32) {
        self.tracked.remove(&message_id);
    }

    /// Number of tracked in-flight fragmented messages.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }
}
