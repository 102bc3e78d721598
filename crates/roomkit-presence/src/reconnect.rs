//! Exponential backoff accounting for peer reconnection.

use std::time::Duration;

use dashmap::DashMap;

use roomkit_core::config::reconnect::ReconnectConfig;
use roomkit_core::types::id::PeerId;

/// Per-peer reconnection attempt counters with exponential backoff.
///
/// The policy only does arithmetic: [`next_delay`](Self::next_delay) is a
/// pure function of the current attempt count and scheduling the actual
/// retry is the transport layer's responsibility. Counters live in memory
/// for the lifetime of the enclosing session and are never persisted.
#[derive(Debug)]
pub struct ReconnectPolicy {
    /// Peer ID → failed attempt count.
    attempts: DashMap<PeerId, u32>,
    /// Backoff configuration.
    config: ReconnectConfig,
}

impl ReconnectPolicy {
    /// Create a policy with the given backoff configuration.
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            attempts: DashMap::new(),
            config,
        }
    }

    /// Current attempt count for a peer. Unknown peers have zero attempts.
    pub fn attempts(&self, peer: &PeerId) -> u32 {
        self.attempts.get(peer).map(|r| *r.value()).unwrap_or(0)
    }

    /// Whether another reconnection attempt is allowed for this peer.
    pub fn should_reconnect(&self, peer: &PeerId) -> bool {
        self.attempts(peer) < self.config.max_attempts
    }

    /// Delay before the next attempt: `min(base * 2^attempts, max)`.
    ///
    /// Does not mutate state or schedule anything.
    pub fn next_delay(&self, peer: &PeerId) -> Duration {
        let attempts = self.attempts(peer).min(63);
        let delay = self
            .config
            .base_delay_ms
            .saturating_mul(1u64.checked_shl(attempts).unwrap_or(u64::MAX))
            .min(self.config.max_delay_ms);
        Duration::from_millis(delay)
    }

    /// Record a failed attempt and return the new count.
    pub fn record_attempt(&self, peer: &PeerId) -> u32 {
        let mut entry = self.attempts.entry(peer.clone()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Clear the counter for a peer after a successful connection.
    /// Idempotent if the peer was never seen.
    pub fn record_success(&self, peer: &PeerId) {
        self.attempts.remove(peer);
    }

    /// Clear all peers. Used on session teardown.
    pub fn reset(&self) {
        self.attempts.clear();
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(ReconnectConfig::default())
    }
}
