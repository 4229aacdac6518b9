//! Mesh controller configuration: one `Copy`/`Clone`/`Default` struct per
//! subsystem, composed into a single [`MeshControllerConfig`].

use std::time::Duration;

/// Relay/TTL/dedup-cache sizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshConfig {
    /// Default hop TTL assigned by the builder when the caller omits one.
    pub default_ttl: u8,
    /// Maximum number of entries in the duplicate-suppression cache.
    pub cache_max_size: usize,
    /// How long a cache entry is considered live before garbage collection.
    pub cache_ttl: Duration,
    /// Maximum cumulative relative age before a packet is never relayed.
    pub max_age_minutes: u16,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            default_ttl: 15,
            cache_max_size: 10_000,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            max_age_minutes: 1440,
        }
    }
}

/// Randomized exponential relay backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// Base delay in milliseconds before the hop multiplier is applied.
    pub base_delay_ms: u64,
    /// Upper clamp on the computed delay.
    pub max_delay_ms: u64,
    /// Symmetric jitter fraction applied to the computed delay.
    pub jitter: f64,
    /// Multiplier applied per hop already traveled.
    pub hop_multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self { base_delay_ms: 50, max_delay_ms: 2000, jitter: 0.2, hop_multiplier: 1.5 }
    }
}

/// Fragmentation/reassembly sizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentationConfig {
    /// Maximum Standard packet size, including header and CRC.
    pub mtu: usize,
    /// How long an incomplete reassembly buffer is kept before eviction.
    pub reassembly_timeout: Duration,
    /// Maximum number of concurrent in-flight reassembly buffers.
    pub max_buffers: usize,
}

impl Default for FragmentationConfig {
    fn default() -> Self {
        Self { mtu: 244, reassembly_timeout: Duration::from_secs(5 * 60), max_buffers: 100 }
    }
}

/// Selective-repeat NACK retry policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectiveRepeatConfig {
    /// Maximum number of NACK rounds before giving up on a message.
    pub max_retries: u32,
    /// Minimum time between successive NACK rounds for the same message.
    pub retry_interval: Duration,
    /// Maximum NACK blocks carried in a single `NackPayload`.
    pub max_blocks_per_nack: usize,
}

impl Default for SelectiveRepeatConfig {
    fn default() -> Self {
        Self { max_retries: 3, retry_interval: Duration::from_secs(5), max_blocks_per_nack: 8 }
    }
}

/// PBKDF2/AES-GCM envelope parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CryptoConfig {
    /// PBKDF2 iteration count, clamped to `[5_000, 100_000]`.
    pub pbkdf2_iterations: u32,
    /// Derived key length in bytes: 16 (AES-128) or 32 (AES-256).
    pub key_len: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self { pbkdf2_iterations: 10_000, key_len: 16 }
    }
}

/// Optional peer-registry capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerRegistryConfig {
    /// Maximum tracked peers before the oldest sighting is evicted.
    pub max_peers: usize,
}

impl Default for PeerRegistryConfig {
    fn default() -> Self {
        Self { max_peers: 256 }
    }
}

/// Full mesh controller configuration, composed of one struct per
/// subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeshControllerConfig {
    /// Relay/TTL/dedup-cache sizing.
    pub mesh: MeshConfig,
    /// Randomized exponential relay backoff.
    pub backoff: BackoffConfig,
    /// Fragmentation/reassembly sizing.
    pub fragmentation: FragmentationConfig,
    /// Selective-repeat NACK retry policy.
    pub selective_repeat: SelectiveRepeatConfig,
    /// PBKDF2/AES-GCM envelope parameters.
    pub crypto: CryptoConfig,
    /// Optional peer-registry capacity.
    pub peer_registry: PeerRegistryConfig,
}
