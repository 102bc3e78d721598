//! Removal detection configuration.

use serde::{Deserialize, Serialize};

/// Settings for the forced-removal detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalConfig {
    /// Delay before redirecting a removed user, in milliseconds.
    /// Gives in-flight presence state a moment to settle.
    #[serde(default = "default_redirect_delay")]
    pub redirect_delay_ms: u64,
    /// Path the removed user is redirected to.
    #[serde(default = "default_redirect_path")]
    pub redirect_path: String,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            redirect_delay_ms: default_redirect_delay(),
            redirect_path: default_redirect_path(),
        }
    }
}

fn default_redirect_delay() -> u64 {
    3_000
}

fn default_redirect_path() -> String {
    "/".to_string()
}
