//! RoomKit Server — Room Presence & Lifecycle Coordinator
//!
//! Entry point that wires the coordinator over in-memory stores and runs
//! the presence service until shutdown. Real deployments substitute their
//! own `RoomStore` / `ConnectivityChannel` implementations at the same
//! seams.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use roomkit_core::config::AppConfig;
use roomkit_core::error::AppError;
use roomkit_core::traits::{Navigator, Notification, NotificationSink};
use roomkit_core::types::id::UserId;
use roomkit_presence::coordinator::PresenceCoordinator;
use roomkit_presence::service::PresenceService;
use roomkit_presence::store::memory::{MemoryConnectivityChannel, MemoryRoomStore, StaticIdentity};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Coordinator error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("ROOMKIT_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Notification sink for headless deployments: delivery is a log line.
#[derive(Debug)]
struct LogNotifier;

#[async_trait::async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, notification: Notification) {
        tracing::info!(
            severity = notification.severity.as_str(),
            title = %notification.title,
            "{}",
            notification.message
        );
    }
}

/// Navigator for headless deployments: a redirect is a log line.
#[derive(Debug)]
struct LogNavigator;

#[async_trait::async_trait]
impl Navigator for LogNavigator {
    async fn redirect_to(&self, path: &str) {
        tracing::info!(path = %path, "Redirect requested");
    }
}

/// Main run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting RoomKit v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(MemoryRoomStore::new());
    let channel = Arc::new(MemoryConnectivityChannel::new());
    let notifier = Arc::new(LogNotifier);
    let navigator = Arc::new(LogNavigator);

    let identity_user =
        std::env::var("ROOMKIT_USER").unwrap_or_else(|_| "local-user".to_string());
    let identity = Arc::new(StaticIdentity::signed_in(UserId::new(identity_user)));

    let coordinator = Arc::new(PresenceCoordinator::new(
        store.clone(),
        channel,
        notifier,
        navigator,
        identity,
        &config,
    ));

    let service = PresenceService::new(
        coordinator.clone(),
        store,
        Duration::from_secs(config.presence.roster_poll_seconds),
    );
    service.start();

    tracing::info!("Presence service running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Signal handler failed: {e}")))?;

    tracing::info!("Shutting down");
    coordinator.deactivate().await;
    service.stop();

    Ok(())
}
