//! Presence publishing and liveness evaluation configuration.

use serde::{Deserialize, Serialize};

/// Presence heartbeat and liveness settings.
///
/// The heartbeat freshness window and the join grace window are independent
/// tolerances: the first bounds how stale a participant's liveness pulse may
/// be, the second covers a freshly joined participant who has not completed
/// a heartbeat cycle yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Interval between heartbeat refreshes in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Maximum age of a heartbeat pulse before a participant stops
    /// counting as active, in milliseconds.
    #[serde(default = "default_heartbeat_freshness")]
    pub heartbeat_freshness_ms: i64,
    /// Grace window after joining during which a participant counts as
    /// active regardless of heartbeat age, in milliseconds.
    #[serde(default = "default_join_grace")]
    pub join_grace_ms: i64,
    /// Interval between roster polls of the durable store in seconds.
    #[serde(default = "default_roster_poll")]
    pub roster_poll_seconds: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_seconds: default_heartbeat_interval(),
            heartbeat_freshness_ms: default_heartbeat_freshness(),
            join_grace_ms: default_join_grace(),
            roster_poll_seconds: default_roster_poll(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    15
}

fn default_heartbeat_freshness() -> i64 {
    90_000
}

fn default_join_grace() -> i64 {
    180_000
}

fn default_roster_poll() -> u64 {
    5
}
