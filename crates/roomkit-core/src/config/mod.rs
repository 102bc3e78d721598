//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod lifecycle;
pub mod logging;
pub mod presence;
pub mod reconnect;
pub mod removal;

use serde::{Deserialize, Serialize};

use self::lifecycle::LifecycleConfig;
use self::logging::LoggingConfig;
use self::presence::PresenceConfig;
use self::reconnect::ReconnectConfig;
use self::removal::RemovalConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Presence publishing and liveness settings.
    #[serde(default)]
    pub presence: PresenceConfig,
    /// Room lifecycle (auto-close) settings.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Peer reconnection backoff settings.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// Removal detection settings.
    #[serde(default)]
    pub removal: RemovalConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `ROOMKIT_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ROOMKIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
