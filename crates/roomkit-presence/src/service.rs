//! Process-wide presence service with an idempotent start/stop contract.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coordinator::PresenceCoordinator;
use crate::store::RoomStore;

/// Runs the coordinator's roster polling loop.
///
/// Intended to be held as a process-wide singleton. `start()` may be called
/// from multiple entry points; the internal running flag guarantees the
/// poll loop is scheduled at most once, and `stop()` is equally idempotent.
#[derive(Debug)]
pub struct PresenceService {
    /// The coordinator driven by the poll loop.
    coordinator: Arc<PresenceCoordinator>,
    /// Durable store polled for roster snapshots.
    store: Arc<dyn RoomStore>,
    /// Poll interval.
    interval: Duration,
    /// Whether the loop is currently scheduled.
    running: AtomicBool,
    /// Cancels the running loop.
    cancel: Mutex<Option<CancellationToken>>,
}

impl PresenceService {
    /// Create a stopped service.
    pub fn new(
        coordinator: Arc<PresenceCoordinator>,
        store: Arc<dyn RoomStore>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            coordinator,
            store,
            interval: poll_interval,
            running: AtomicBool::new(false),
            cancel: Mutex::new(None),
        }
    }

    /// The coordinator this service drives.
    pub fn coordinator(&self) -> &Arc<PresenceCoordinator> {
        &self.coordinator
    }

    /// Whether the poll loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the roster poll loop.
    ///
    /// Returns `false` without scheduling anything when already running.
    pub fn start(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Presence service already running, start ignored");
            return false;
        }

        let cancel = CancellationToken::new();
        *self.cancel.lock().unwrap() = Some(cancel.clone());

        let coordinator = Arc::clone(&self.coordinator);
        let store = Arc::clone(&self.store);
        let period = self.interval;
        // First poll one full interval out, deadline fixed at start time.
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let Some(room_id) = coordinator.current_room() else {
                    continue;
                };

                match store.get(&room_id).await {
                    Ok(Some(room)) => coordinator.on_roster_update(&room).await,
                    // A missing room is nothing to evaluate, not an error.
                    Ok(None) => debug!(room_id = %room_id, "Watched room no longer exists"),
                    Err(e) => warn!(room_id = %room_id, error = %e, "Roster poll failed"),
                }
            }

            debug!("Presence service poll loop ended");
        });

        info!(interval_secs = period.as_secs(), "Presence service started");
        true
    }

    /// Stop the poll loop. Returns `false` when it was not running.
    pub fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }

        if let Some(cancel) = self.cancel.lock().unwrap().take() {
            cancel.cancel();
        }

        info!("Presence service stopped");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomkit_core::config::AppConfig;
    use roomkit_core::types::id::UserId;

    use crate::store::memory::{
        MemoryConnectivityChannel, MemoryRoomStore, RecordingNavigator, RecordingNotifier,
        StaticIdentity,
    };

    fn service() -> PresenceService {
        let store = Arc::new(MemoryRoomStore::new());
        let coordinator = Arc::new(PresenceCoordinator::new(
            store.clone(),
            Arc::new(MemoryConnectivityChannel::new()),
            Arc::new(RecordingNotifier::new()),
            Arc::new(RecordingNavigator::new()),
            Arc::new(StaticIdentity::signed_in(UserId::new("me"))),
            &AppConfig::default(),
        ));
        PresenceService::new(coordinator, store, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let service = service();
        assert!(service.start());
        assert!(!service.start());
        assert!(service.is_running());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let service = service();
        assert!(!service.stop());

        service.start();
        assert!(service.stop());
        assert!(!service.stop());
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let service = service();
        service.start();
        service.stop();
        assert!(service.start());
        assert!(service.is_running());
    }
}
