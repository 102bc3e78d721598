//! Coordinator facade tying the presence components together.

use std::sync::{Arc, Mutex};

use tracing::info;

use roomkit_core::config::removal::RemovalConfig;
use roomkit_core::config::AppConfig;
use roomkit_core::traits::{IdentityProvider, Navigator, NotificationSink};
use roomkit_core::types::id::{RoomId, UserId};
use roomkit_core::{AppError, AppResult};
use roomkit_entity::Room;

use crate::lifecycle::RoomLifecycleMonitor;
use crate::publisher::PresencePublisher;
use crate::reconnect::ReconnectPolicy;
use crate::removal::RemovalDetector;
use crate::store::{ConnectivityChannel, RoomStore};

/// Entry point for external collaborators.
///
/// Owns one publisher, one lifecycle monitor, one reconnect policy, and a
/// removal detector per seated room. [`activate`](Self::activate) and
/// [`deactivate`](Self::deactivate) bracket a seat's lifetime;
/// [`on_roster_update`](Self::on_roster_update) feeds every roster snapshot
/// into the monitor and the detector. All timers and subscriptions are torn
/// down before a new room is observed so nothing stale fires against the
/// wrong room.
#[derive(Debug)]
pub struct PresenceCoordinator {
    /// Keeps the local seat fresh.
    publisher: PresencePublisher,
    /// Arms and cancels deferred room destruction.
    monitor: RoomLifecycleMonitor,
    /// Per-peer reconnection backoff, exposed to the transport layer.
    reconnect: ReconnectPolicy,
    /// Authenticated identity.
    identity: Arc<dyn IdentityProvider>,
    /// Notification sink shared with the detector.
    notifier: Arc<dyn NotificationSink>,
    /// Navigator shared with the detector.
    navigator: Arc<dyn Navigator>,
    /// Removal configuration for detectors created per seat.
    removal_config: RemovalConfig,
    /// Detector for the currently seated room, if any.
    detector: Mutex<Option<Arc<RemovalDetector>>>,
}

impl PresenceCoordinator {
    /// Wire a coordinator over the external collaborators.
    pub fn new(
        store: Arc<dyn RoomStore>,
        channel: Arc<dyn ConnectivityChannel>,
        notifier: Arc<dyn NotificationSink>,
        navigator: Arc<dyn Navigator>,
        identity: Arc<dyn IdentityProvider>,
        config: &AppConfig,
    ) -> Self {
        let publisher = PresencePublisher::new(
            Arc::clone(&store),
            channel,
            config.presence.clone(),
        );
        let monitor = RoomLifecycleMonitor::new(
            store,
            Arc::clone(&notifier),
            Arc::clone(&navigator),
            config.presence.clone(),
            config.lifecycle.clone(),
        );

        Self {
            publisher,
            monitor,
            reconnect: ReconnectPolicy::new(config.reconnect.clone()),
            identity,
            notifier,
            navigator,
            removal_config: config.removal.clone(),
            detector: Mutex::new(None),
        }
    }

    /// The room currently seated, if any.
    pub fn current_room(&self) -> Option<RoomId> {
        self.publisher.current_seat().map(|key| key.room_id)
    }

    /// The reconnect policy, for the peer transport layer.
    pub fn reconnector(&self) -> &ReconnectPolicy {
        &self.reconnect
    }

    /// Take a seat in a room as the given user.
    pub async fn activate(&self, room_id: RoomId, user_id: UserId) -> AppResult<()> {
        // Leaving a previous seat first guarantees no stale timer or
        // subscription observes the new room.
        self.deactivate().await;

        info!(room_id = %room_id, user_id = %user_id, "Coordinator activating seat");

        *self.detector.lock().unwrap() = Some(Arc::new(RemovalDetector::new(
            user_id.clone(),
            Arc::clone(&self.notifier),
            Arc::clone(&self.navigator),
            self.removal_config.clone(),
        )));

        self.publisher.activate(room_id, user_id).await
    }

    /// Take a seat as the currently authenticated user.
    pub async fn activate_current(&self, room_id: RoomId) -> AppResult<()> {
        let user_id = self
            .identity
            .current_user()
            .ok_or_else(|| AppError::service_unavailable("no authenticated user"))?;
        self.activate(room_id, user_id).await
    }

    /// Leave the current seat cleanly. Safe to call when not seated.
    pub async fn deactivate(&self) {
        // Voluntary leave must clear membership tracking before the leave
        // write echoes back through a roster update, and an undelivered
        // removal redirect must not fire once this seat is gone.
        if let Some(detector) = self.detector.lock().unwrap().as_ref() {
            detector.mark_left();
            detector.cancel_pending_redirect();
        }

        self.publisher.deactivate().await;
        self.monitor.cancel();
        self.reconnect.reset();
        *self.detector.lock().unwrap() = None;
    }

    /// Feed a roster snapshot into the lifecycle monitor and the removal
    /// detector. Called for every roster update, from any participant.
    pub async fn on_roster_update(&self, room: &Room) {
        self.monitor.schedule(room);

        let detector = self.detector.lock().unwrap().clone();
        if let Some(detector) = detector {
            detector.observe(room).await;
        }
    }
}
