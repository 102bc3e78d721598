//! Room lifecycle monitor — deferred destruction of empty rooms.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use roomkit_core::config::lifecycle::LifecycleConfig;
use roomkit_core::config::presence::PresenceConfig;
use roomkit_core::traits::{Navigator, Notification, NotificationSink};
use roomkit_core::types::id::RoomId;
use roomkit_entity::Room;

use crate::liveness;
use crate::store::RoomStore;

/// Monitor state machine. One timer at most is ever armed.
#[derive(Debug)]
enum MonitorState {
    /// No timer scheduled.
    Idle,
    /// A destruction timer is running for the room.
    Armed {
        room_id: RoomId,
        cancel: CancellationToken,
    },
    /// The room was destroyed by this monitor. Terminal for that room.
    Destroyed { room_id: RoomId },
}

/// Schedules and cancels deferred room destruction.
///
/// Every seated client runs its own monitor instance; there is no single
/// authoritative owner. Evaluation is opportunistic and destruction is
/// idempotent (deleting an absent room is not an error), so duplicate
/// timers across clients are harmless.
#[derive(Debug)]
pub struct RoomLifecycleMonitor {
    /// Durable room store, used for the destructive delete.
    store: Arc<dyn RoomStore>,
    /// Sink for the "room closed" notification.
    notifier: Arc<dyn NotificationSink>,
    /// Navigation out of the destroyed room view.
    navigator: Arc<dyn Navigator>,
    /// Liveness windows.
    presence: PresenceConfig,
    /// Close timing configuration.
    lifecycle: LifecycleConfig,
    /// Current state, shared with the armed timer task.
    state: Arc<Mutex<MonitorState>>,
}

impl RoomLifecycleMonitor {
    /// Create a monitor.
    pub fn new(
        store: Arc<dyn RoomStore>,
        notifier: Arc<dyn NotificationSink>,
        navigator: Arc<dyn Navigator>,
        presence: PresenceConfig,
        lifecycle: LifecycleConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            navigator,
            presence,
            lifecycle,
            state: Arc::new(Mutex::new(MonitorState::Idle)),
        }
    }

    /// Whether a destruction timer is currently armed.
    pub fn is_armed(&self) -> bool {
        matches!(*self.state.lock().unwrap(), MonitorState::Armed { .. })
    }

    /// Re-evaluate a room snapshot.
    ///
    /// A non-empty active set cancels any armed timer. An empty active set
    /// arms a one-shot destruction timer unless one is already running for
    /// this room; re-arming after a cancel always starts a full window.
    pub fn schedule(&self, room: &Room) {
        let now = Utc::now();
        let active = liveness::active_participants(room, now, &self.presence);

        if !active.is_empty() {
            debug!(room_id = %room.id, active = active.len(), "Room has active participants");
            self.cancel();
            return;
        }

        let window = self.close_window(room);
        {
            let mut state = self.state.lock().unwrap();
            match &*state {
                MonitorState::Armed { room_id, .. } if *room_id == room.id => {
                    // Timer already running; never restart the window.
                    return;
                }
                MonitorState::Armed { cancel, .. } => {
                    // Armed against a stale room. Replace it.
                    cancel.cancel();
                }
                MonitorState::Destroyed { room_id } if *room_id == room.id => {
                    return;
                }
                _ => {}
            }

            let cancel = CancellationToken::new();
            *state = MonitorState::Armed {
                room_id: room.id.clone(),
                cancel: cancel.clone(),
            };
            drop(state);

            info!(
                room_id = %room.id,
                window_secs = window.as_secs(),
                "No active participants, arming destruction timer"
            );
            self.spawn_destruction_timer(room.id.clone(), window, cancel);
        }
    }

    /// Unconditionally clear any armed timer and return to idle.
    ///
    /// Must be called when this client stops observing the room so a stale
    /// timer cannot fire against a room nobody here is watching. Idempotent.
    pub fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        if let MonitorState::Armed { room_id, cancel } = &*state {
            debug!(room_id = %room_id, "Destruction timer cancelled");
            cancel.cancel();
        }
        *state = MonitorState::Idle;
    }

    /// The close window for a room: the participant-configured timeout when
    /// auto-close is enabled (2 minutes when unset), else the fixed
    /// fallback. The asymmetric defaults are deliberate; see LifecycleConfig.
    fn close_window(&self, room: &Room) -> Duration {
        let minutes = if room.auto_close_after_inactivity {
            room.inactivity_timeout_minutes
                .unwrap_or(self.lifecycle.default_inactivity_minutes)
        } else {
            self.lifecycle.fallback_close_minutes
        };
        Duration::from_secs(u64::from(minutes) * 60)
    }

    /// One-shot destruction timer. On fire, deletes the room, notifies, and
    /// leaves the room view. A failed delete returns the monitor to idle so
    /// the next roster change re-arms.
    fn spawn_destruction_timer(
        &self,
        room_id: RoomId,
        window: Duration,
        cancel: CancellationToken,
    ) {
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let navigator = Arc::clone(&self.navigator);
        let state = Arc::clone(&self.state);
        let exit_path = self.lifecycle.exit_path.clone();
        // The deadline is fixed here, not at the task's first poll.
        let deadline = tokio::time::sleep(window);

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = deadline => {}
            }

            match store.delete(&room_id).await {
                Ok(()) => {
                    info!(room_id = %room_id, "Room destroyed after inactivity window");
                    *state.lock().unwrap() = MonitorState::Destroyed {
                        room_id: room_id.clone(),
                    };
                    notifier
                        .notify(Notification::info(
                            "Session closed",
                            "The room was closed due to inactivity.",
                        ))
                        .await;
                    navigator.redirect_to(&exit_path).await;
                }
                Err(e) => {
                    warn!(room_id = %room_id, error = %e, "Room destruction failed");
                    *state.lock().unwrap() = MonitorState::Idle;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use roomkit_core::types::id::UserId;
    use roomkit_core::{AppError, AppResult};
    use roomkit_entity::{Participant, ParticipantPatch};

    use crate::store::memory::{MemoryRoomStore, RecordingNavigator, RecordingNotifier};

    /// Let spawned timer tasks observe fired deadlines.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn empty_room(id: &str) -> Room {
        Room::new(RoomId::new(id), Utc::now())
    }

    fn monitor_with(store: Arc<dyn RoomStore>) -> RoomLifecycleMonitor {
        RoomLifecycleMonitor::new(
            store,
            Arc::new(RecordingNotifier::new()),
            Arc::new(RecordingNavigator::new()),
            PresenceConfig::default(),
            LifecycleConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_room_without_auto_close_arms_ten_minutes() {
        let store = Arc::new(MemoryRoomStore::new());
        let room = empty_room("room-1");
        store.insert_room(room.clone());
        let monitor = monitor_with(store.clone());

        monitor.schedule(&room);
        assert!(monitor.is_armed());

        tokio::time::advance(Duration::from_secs(599)).await;
        settle().await;
        assert!(store.contains(&room.id));

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert!(!store.contains(&room.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_auto_close_window_is_honored() {
        let store = Arc::new(MemoryRoomStore::new());
        let mut room = empty_room("room-1");
        room.auto_close_after_inactivity = true;
        room.inactivity_timeout_minutes = Some(5);
        store.insert_room(room.clone());
        let monitor = monitor_with(store.clone());

        monitor.schedule(&room);

        tokio::time::advance(Duration::from_secs(299)).await;
        settle().await;
        assert!(store.contains(&room.id));

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert!(!store.contains(&room.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_close_without_value_defaults_to_two_minutes() {
        let store = Arc::new(MemoryRoomStore::new());
        let mut room = empty_room("room-1");
        room.auto_close_after_inactivity = true;
        store.insert_room(room.clone());
        let monitor = monitor_with(store.clone());

        monitor.schedule(&room);
        tokio::time::advance(Duration::from_secs(121)).await;
        settle().await;
        assert!(!store.contains(&room.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_regained_activity_cancels_the_timer() {
        let store = Arc::new(MemoryRoomStore::new());
        let room = empty_room("room-1");
        store.insert_room(room.clone());
        let monitor = monitor_with(store.clone());

        monitor.schedule(&room);
        assert!(monitor.is_armed());

        let mut active_room = room.clone();
        active_room
            .participants
            .push(Participant::joining(UserId::new("alice"), Utc::now()));
        monitor.schedule(&active_room);
        assert!(!monitor.is_armed());

        // Cancelling twice is safe.
        monitor.cancel();

        tokio::time::advance(Duration::from_secs(3_600)).await;
        settle().await;
        assert!(store.contains(&room.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_while_armed_does_not_restart_the_window() {
        let store = Arc::new(MemoryRoomStore::new());
        let room = empty_room("room-1");
        store.insert_room(room.clone());
        let monitor = monitor_with(store.clone());

        monitor.schedule(&room);
        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;

        // Same empty verdict halfway through; the timer keeps its deadline.
        monitor.schedule(&room);
        tokio::time::advance(Duration::from_secs(301)).await;
        settle().await;
        assert!(!store.contains(&room.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_emits_notification_and_redirect() {
        let store = Arc::new(MemoryRoomStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let room = empty_room("room-1");
        store.insert_room(room.clone());

        let monitor = RoomLifecycleMonitor::new(
            store.clone(),
            notifier.clone(),
            navigator.clone(),
            PresenceConfig::default(),
            LifecycleConfig::default(),
        );

        monitor.schedule(&room);
        tokio::time::advance(Duration::from_secs(601)).await;
        settle().await;

        let delivered = notifier.delivered();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].message.contains("inactivity"));
        assert_eq!(navigator.redirects(), vec!["/".to_string()]);
    }

    /// Store whose deletes always fail. Everything else is unreachable in
    /// these tests.
    #[derive(Debug)]
    struct DeleteFailsStore;

    #[async_trait]
    impl RoomStore for DeleteFailsStore {
        async fn get(&self, _room_id: &RoomId) -> AppResult<Option<Room>> {
            Ok(None)
        }

        async fn merge_participant(
            &self,
            _room_id: &RoomId,
            _user_id: &UserId,
            _patch: ParticipantPatch,
        ) -> AppResult<()> {
            Ok(())
        }

        async fn delete(&self, _room_id: &RoomId) -> AppResult<()> {
            Err(AppError::store("store unavailable"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_delete_returns_to_idle_and_rearms_on_next_schedule() {
        let room = empty_room("room-1");
        let monitor = monitor_with(Arc::new(DeleteFailsStore));

        monitor.schedule(&room);
        tokio::time::advance(Duration::from_secs(601)).await;
        settle().await;
        assert!(!monitor.is_armed());

        // The next roster evaluation arms a fresh timer.
        monitor.schedule(&room);
        assert!(monitor.is_armed());
    }
}
