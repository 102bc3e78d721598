//! Room lifecycle (auto-close) configuration.

use serde::{Deserialize, Serialize};

/// Room auto-close timing settings.
///
/// The two defaults are deliberately asymmetric: rooms that opt into
/// auto-close without an explicit timeout get 2 minutes, rooms that never
/// opted in fall back to a fixed 10-minute window. This mirrors observed
/// product behavior and is kept as two separate knobs pending a product
/// decision on unifying them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Inactivity timeout in minutes when `auto_close_after_inactivity` is
    /// set on the room but no explicit value is configured.
    #[serde(default = "default_inactivity_minutes")]
    pub default_inactivity_minutes: u32,
    /// Fixed close window in minutes for rooms without auto-close enabled.
    #[serde(default = "default_fallback_minutes")]
    pub fallback_close_minutes: u32,
    /// Path to navigate to after the observed room is destroyed.
    #[serde(default = "default_exit_path")]
    pub exit_path: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            default_inactivity_minutes: default_inactivity_minutes(),
            fallback_close_minutes: default_fallback_minutes(),
            exit_path: default_exit_path(),
        }
    }
}

fn default_inactivity_minutes() -> u32 {
    2
}

fn default_fallback_minutes() -> u32 {
    10
}

fn default_exit_path() -> String {
    "/".to_string()
}
