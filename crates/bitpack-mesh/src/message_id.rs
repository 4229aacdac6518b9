//! Message ID generation: a coarse time window combined with CSPRNG bytes,
//! so collisions cluster into a window far smaller than the dedup cache TTL
//! instead of spreading uniformly over the birthday bound.
//!
//! Pure 16-bit IDs collide at roughly 256 in-flight messages (birthday
//! paradox over a 16-bit space). Binding the high bits to `unix_timestamp`
//! means two IDs can only collide if they were also minted in the same
//! coarse window, which also lets [`estimate_age_windows`] recover a
//! bounded lower bound on a message's age from its ID alone, for debugging.

use bitpack_core::Environment;
use bitpack_proto::{PacketBuilder, PacketMode};

/// Generates a 16-bit message ID: high 4 bits = `unix_timestamp % 16`, low
/// 12 bits = CSPRNG.
pub fn generate_compact(env: &impl Environment) -> u16 {
    let window = (env.unix_timestamp() % 16) as u16;
    let mut rand_bytes = [0u8; 2];
    env.random_bytes(&mut rand_bytes);
    let random = u16::from_be_bytes(rand_bytes) & 0x0FFF;
    (window << 12) | random
}

/// Generates a 32-bit message ID: high 16 bits = `unix_timestamp % 65536`,
/// low 16 bits = CSPRNG.
pub fn generate_standard(env: &impl Environment) -> u32 {
    let window = (env.unix_timestamp() % 65_536) as u32;
    let mut rand_bytes = [0u8; 2];
    env.random_bytes(&mut rand_bytes);
    let random = u32::from(u16::from_be_bytes(rand_bytes));
    (window << 16) | random
}

/// Generates an ID sized for `mode` and returns it widened to `u32`, the
/// common currency [`bitpack_proto::Packet::message_id`] uses.
pub fn generate(env: &impl Environment, mode: PacketMode) -> u32 {
    match mode {
        PacketMode::Compact => u32::from(generate_compact(env)),
        PacketMode::Standard => generate_standard(env),
    }
}

/// Fills in a builder's message ID per §4.8 when the caller hasn't pinned
/// one, honoring the "auto-generated when not supplied" rule from the
/// builder's own mode-selection logic.
pub fn assign_message_id(builder: PacketBuilder, env: &impl Environment) -> PacketBuilder {
    let mode = builder.determine_mode();
    builder.message_id(generate(env, mode))
}

/// Recovers a coarse lower bound, in whole coarse-windows, on how long ago a
/// message ID was minted. Returns `None` if the ID's window is in the
/// future relative to now (clock skew, or a 16-bit ID whose narrow window
/// already wrapped).
pub fn estimate_age_windows(id: u32, is_compact: bool, env: &impl Environment) -> Option<u64> {
    let now = env.unix_timestamp();
    if is_compact {
        let window = u64::from((id >> 12) & 0x0F);
        let current = now % 16;
        if current >= window { Some(current - window) } else { None }
    } else {
        let window = u64::from((id >> 16) & 0xFFFF);
        let current = now % 65_536;
        if current >= window { Some(current - window) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[derive(Clone)]
    struct FixedEnv {
        seed: u8,
        timestamp: u64,
    }

    impl Environment for FixedEnv {
        type Instant = std::time::Instant;

        fn now(&self) -> Self::Instant {
            std::time::Instant::now()
        }

        fn unix_timestamp(&self) -> u64 {
            self.timestamp
        }

        async fn sleep(&self, _duration: Duration) {}

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(self.seed);
        }
    }

    fn env(seed: u8) -> FixedEnv {
        FixedEnv { seed, timestamp: 1_800_000_037 }
    }

    #[test]
    fn compact_id_packs_window_into_high_nibble() {
        let env = env(0xAB);
        let id = generate_compact(&env);
        assert_eq!(id >> 12, (env.timestamp % 16) as u16);
    }

    #[test]
    fn standard_id_packs_window_into_high_16_bits() {
        let env = env(0xCD);
        let id = generate_standard(&env);
        assert_eq!(id >> 16, (env.timestamp % 65_536) as u32);
    }

    #[test]
    fn generate_dispatches_on_mode() {
        let env = env(1);
        let compact = generate(&env, PacketMode::Compact);
        assert!(compact <= u32::from(u16::MAX));
        let _standard = generate(&env, PacketMode::Standard);
    }

    #[test]
    fn assign_message_id_fills_in_builder() {
        use bitpack_proto::{MessageType, Payload, payloads::RawPayload};

        let env = env(7);
        let payload = Payload::Raw(RawPayload { type_code: MessageType::Ping.code(), bytes: vec![] });
        let builder = PacketBuilder::new(MessageType::Ping, payload);
        let builder = assign_message_id(builder, &env);
        let packet = builder.build().unwrap();
        assert!(packet.message_id() <= u32::from(u16::MAX));
    }

    #[test]
    fn different_seeds_produce_different_random_bits() {
        let low = env(0x00);
        let high = env(0xFF);
        assert_ne!(generate_compact(&low) & 0x0FFF, generate_compact(&high) & 0x0FFF);
    }

    #[test]
    fn estimate_age_recovers_elapsed_windows() {
        let minted_at = env(3);
        let id = generate_standard(&minted_at);
        let later = FixedEnv { timestamp: minted_at.timestamp + 5, ..minted_at.clone() };
        let age = estimate_age_windows(id, false, &later).unwrap();
        assert_eq!(age, 5);
    }
}
