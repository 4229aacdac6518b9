//! Randomized exponential relay backoff: broadcast-storm prevention for
//! mesh relaying.
//!
//! Each message_id gets at most one pending relay. If the same message_id
//! is heard again (relayed by someone else) while a relay is pending, the
//! pending relay is cancelled.

use std::collections::HashMap;

use bitpack_core::{BackoffConfig, Environment};

/// A scheduled-but-not-yet-fired relay.
#[derive(Debug, Clone, Copy)]
pub struct PendingRelay {
    /// Computed delay before the relay fires.
    pub delay_ms: u64,
}

/// Tracks in-flight relay timers, keyed by message_id.
pub struct RelayBackoff {
    config: BackoffConfig,
    pending: HashMap<u32, PendingRelay>,
}

impl RelayBackoff {
    /// Creates a backoff tracker from `config`.
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, pending: HashMap::new() }
    }

    /// Computes the relay delay for a packet that has traveled `hop_count`
    /// hops so far, per §4.9's formula:
    /// `base = base_ms * hop_multiplier^hop_count`,
    /// `delay = uniform(base_ms, min(base, max_ms)) * (1 + uniform(-jitter, +jitter))`,
    /// clamped to `[base_ms, max_ms]`.
    pub fn compute_delay_ms(&self, hop_count: u32, env: &impl Environment) -> u64 {
        let base_ms = self.config.base_delay_ms as f64;
        let max_ms = self.config.max_delay_ms as f64;
        let base = base_ms * self.config.hop_multiplier.powi(hop_count as i32);
        let upper = base.min(max_ms).max(base_ms);

        let mut rand_bytes = [0u8; 8];
        env.random_bytes(&mut rand_bytes);
        let unit = (u64::from_be_bytes(rand_bytes) as f64) / (u64::MAX as f64);
        let uniform_base = base_ms + unit * (upper - base_ms);

        let mut jitter_bytes = [0u8; 8];
        env.random_bytes(&mut jitter_bytes);
        let jitter_unit = (u64::from_be_bytes(jitter_bytes) as f64) / (u64::MAX as f64);
        let jitter = -self.config.jitter + jitter_unit * (2.0 * self.config.jitter);

        let delay = uniform_base * (1.0 + jitter);
        delay.clamp(self.config.base_delay_ms as f64, max_ms).round() as u64
    }

    /// Schedules a relay for `id`, overwriting any existing pending relay
    /// for the same id (the controller is expected to call
    /// [`Self::on_packet_received`] first so duplicates cancel instead).
    pub fn schedule(&mut self, id: u32, delay_ms: u64) {
        self.pending.insert(id, PendingRelay { delay_ms });
    }

    /// Called on every inbound packet, before dedup/relay decisions. If a
    /// relay for `id` is already pending (we heard this message again while
    /// waiting to relay it ourselves), cancels it and reports that it was
    /// cancelled.
    pub fn on_packet_received(&mut self, id: u32) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Whether a relay is currently pending for `id`.
    pub fn is_pending(&self, id: u32) -> bool {
        self.pending.contains_key(&id)
    }

    /// Marks a pending relay as fired (it is removed from the pending set).
    /// Returns `false` if it had already been cancelled.
    pub fn fire(&mut self, id: u32) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Number of relays currently pending.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[derive(Clone)]
    struct FixedEnv {
        byte: u8,
    }

    impl Environment for FixedEnv {
        type Instant = std::time::Instant;

        fn now(&self) -> Self::Instant {
            std::time::Instant::now()
        }

        fn unix_timestamp(&self) -> u64 {
            0
        }

        async fn sleep(&self, _duration: Duration) {}

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(self.byte);
        }
    }

    #[test]
    fn delay_respects_base_and_max_bounds() {
        let backoff = RelayBackoff::new(BackoffConfig::default());
        let env = FixedEnv { byte: 0x80 };
        for hop in 0..10 {
            let delay = backoff.compute_delay_ms(hop, &env);
            assert!(delay >= backoff.config.base_delay_ms);
            assert!(delay <= backoff.config.max_delay_ms);
        }
    }

    #[test]
    fn schedule_then_receive_again_cancels() {
        let mut backoff = RelayBackoff::new(BackoffConfig::default());
        backoff.schedule(1, 100);
        assert!(backoff.is_pending(1));
        let cancelled = backoff.on_packet_received(1);
        assert!(cancelled);
        assert!(!backoff.is_pending(1));
    }

    #[test]
    fn receiving_unrelated_id_does_not_cancel() {
        let mut backoff = RelayBackoff::new(BackoffConfig::default());
        backoff.schedule(1, 100);
        let cancelled = backoff.on_packet_received(2);
        assert!(!cancelled);
        assert!(backoff.is_pending(1));
    }

    #[test]
    fn fire_removes_pending_entry() {
        let mut backoff = RelayBackoff::new(BackoffConfig::default());
        backoff.schedule(1, 100);
        assert!(backoff.fire(1));
        assert!(!backoff.fire(1));
    }

    #[test]
    fn higher_hop_count_biases_delay_upward_at_the_floor() {
        let backoff = RelayBackoff::new(BackoffConfig::default());
        let env_low = FixedEnv { byte: 0x00 };
        let zero_hop = backoff.compute_delay_ms(0, &env_low);
        let many_hop = backoff.compute_delay_ms(5, &env_low);
        assert!(many_hop >= zero_hop);
    }

    proptest::proptest! {
        #[test]
        fn delay_always_within_configured_bounds(
            hop_count in 0u32..20,
            byte in proptest::prelude::any::<u8>(),
        ) {
            let backoff = RelayBackoff::new(BackoffConfig::default());
            let env = FixedEnv { byte };
            let delay = backoff.compute_delay_ms(hop_count, &env);
            proptest::prop_assert!(delay >= backoff.config.base_delay_ms);
            proptest::prop_assert!(delay <= backoff.config.max_delay_ms);
        }
    }
}
