//! Removal detector — distinguishes "I left" from "I was removed".

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use roomkit_core::config::removal::RemovalConfig;
use roomkit_core::traits::{Navigator, Notification, NotificationSink};
use roomkit_core::types::id::{RoomId, UserId};
use roomkit_entity::Room;

/// Latched per-room observation state.
#[derive(Debug, Default)]
struct DetectorState {
    /// The room the latch currently applies to.
    observed_room: Option<RoomId>,
    /// Whether the local user appeared in the previous snapshot.
    was_participant: bool,
    /// Set once a removal fires; suppresses duplicates until room change.
    has_fired: bool,
    /// Cancels a redirect still pending from a fired removal.
    redirect_cancel: CancellationToken,
}

/// Compares successive roster snapshots for the local user's own entry.
///
/// There is no authoritative removal event, so forced removal is inferred:
/// the user was in the previous snapshot, is missing from the current one,
/// and the roster still has other members. A roster that emptied out
/// entirely is a whole-room teardown and belongs to the lifecycle monitor,
/// not to this detector.
#[derive(Debug)]
pub struct RemovalDetector {
    /// The local user.
    self_id: UserId,
    /// Sink for the "removed by host" notification.
    notifier: Arc<dyn NotificationSink>,
    /// Navigation to the safe default view.
    navigator: Arc<dyn Navigator>,
    /// Redirect timing configuration.
    config: RemovalConfig,
    /// Latch state, keyed by room identity.
    state: Mutex<DetectorState>,
}

impl RemovalDetector {
    /// Create a detector for the local user.
    pub fn new(
        self_id: UserId,
        notifier: Arc<dyn NotificationSink>,
        navigator: Arc<dyn Navigator>,
        config: RemovalConfig,
    ) -> Self {
        Self {
            self_id,
            notifier,
            navigator,
            config,
            state: Mutex::new(DetectorState::default()),
        }
    }

    /// Whether a removal has fired for the currently observed room.
    pub fn has_fired(&self) -> bool {
        self.state.lock().unwrap().has_fired
    }

    /// Record a voluntary leave.
    ///
    /// Called on the same client-local path that performs the leave, before
    /// the roster update propagates back, so the echoed snapshot without
    /// our entry is not misread as a forced removal.
    pub fn mark_left(&self) {
        let mut state = self.state.lock().unwrap();
        state.was_participant = false;
    }

    /// Cancel any redirect still pending from a fired removal.
    ///
    /// Called when this detector stops representing the current seat, so a
    /// stale redirect cannot fire against a newly joined room.
    pub fn cancel_pending_redirect(&self) {
        let mut state = self.state.lock().unwrap();
        state.redirect_cancel.cancel();
        state.redirect_cancel = CancellationToken::new();
    }

    /// Observe a roster snapshot and fire at most once per room.
    pub async fn observe(&self, room: &Room) {
        let is_current = room.has_participant(&self.self_id);

        let redirect = {
            let mut state = self.state.lock().unwrap();

            // Switching rooms resets the latch and aborts any redirect
            // still pending against the previous room.
            if state.observed_room.as_ref() != Some(&room.id) {
                debug!(room_id = %room.id, "Removal detector tracking new room");
                state.redirect_cancel.cancel();
                *state = DetectorState {
                    observed_room: Some(room.id.clone()),
                    ..DetectorState::default()
                };
            }

            let fire = state.was_participant
                && !is_current
                && !room.participants.is_empty()
                && !state.has_fired;

            if fire {
                state.has_fired = true;
            }
            // Track the latest observed membership on every tick, fired or
            // not.
            state.was_participant = is_current;
            fire.then(|| state.redirect_cancel.clone())
        };

        if let Some(cancel) = redirect {
            info!(room_id = %room.id, user_id = %self.self_id, "Forced removal detected");
            self.notifier
                .notify(Notification::warning(
                    "Removed from session",
                    "The host removed you from the room.",
                ))
                .await;
            self.spawn_delayed_redirect(cancel);
        }
    }

    /// Redirect after a short delay so in-flight state can settle.
    fn spawn_delayed_redirect(&self, cancel: CancellationToken) {
        let navigator = Arc::clone(&self.navigator);
        let path = self.config.redirect_path.clone();
        // The deadline is fixed here, not at the task's first poll.
        let delay = tokio::time::sleep(Duration::from_millis(self.config.redirect_delay_ms));

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = delay => navigator.redirect_to(&path).await,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use roomkit_entity::Participant;

    use crate::store::memory::{RecordingNavigator, RecordingNotifier};

    /// Let spawned tasks observe fired timers.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn room_with(id: &str, members: &[&str]) -> Room {
        let now = Utc::now();
        let mut room = Room::new(RoomId::new(id), now);
        room.participants = members
            .iter()
            .map(|m| Participant::joining(UserId::new(*m), now))
            .collect();
        room
    }

    fn detector() -> (RemovalDetector, Arc<RecordingNotifier>, Arc<RecordingNavigator>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let detector = RemovalDetector::new(
            UserId::new("me"),
            notifier.clone(),
            navigator.clone(),
            RemovalConfig::default(),
        );
        (detector, notifier, navigator)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_when_excised_from_a_populated_roster() {
        let (detector, notifier, navigator) = detector();

        detector.observe(&room_with("room-1", &["me", "a", "b"])).await;
        let removed = room_with("room-1", &["a", "b"]);
        detector.observe(&removed).await;

        // The same snapshot delivered twice must not fire again.
        detector.observe(&removed).await;

        assert_eq!(notifier.delivered().len(), 1);
        assert_eq!(notifier.delivered()[0].title, "Removed from session");

        // Redirect happens after the settle delay, not immediately.
        assert!(navigator.redirects().is_empty());
        tokio::time::advance(Duration::from_millis(3_001)).await;
        settle().await;
        assert_eq!(navigator.redirects(), vec!["/".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_room_switch_aborts_the_pending_redirect() {
        let (detector, notifier, navigator) = detector();

        detector.observe(&room_with("room-1", &["me", "a"])).await;
        detector.observe(&room_with("room-1", &["a"])).await;
        assert_eq!(notifier.delivered().len(), 1);

        // Seated in another room before the delay elapses.
        detector.observe(&room_with("room-2", &["me", "b"])).await;
        tokio::time::advance(Duration::from_millis(3_100)).await;
        settle().await;
        assert!(navigator.redirects().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_redirect_stops_the_timer() {
        let (detector, notifier, navigator) = detector();

        detector.observe(&room_with("room-1", &["me", "a"])).await;
        detector.observe(&room_with("room-1", &["a"])).await;
        assert_eq!(notifier.delivered().len(), 1);

        detector.cancel_pending_redirect();
        tokio::time::advance(Duration::from_millis(3_100)).await;
        settle().await;
        assert!(navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_empty_roster_is_whole_room_teardown_not_removal() {
        let (detector, notifier, _) = detector();

        detector.observe(&room_with("room-1", &["me"])).await;
        detector.observe(&room_with("room-1", &[])).await;

        assert!(notifier.delivered().is_empty());
        assert!(!detector.has_fired());
    }

    #[tokio::test]
    async fn test_voluntary_leave_does_not_fire() {
        let (detector, notifier, _) = detector();

        detector.observe(&room_with("room-1", &["me", "a"])).await;
        detector.mark_left();
        detector.observe(&room_with("room-1", &["a"])).await;

        assert!(notifier.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_never_a_participant_never_fires() {
        let (detector, notifier, _) = detector();

        detector.observe(&room_with("room-1", &["a", "b"])).await;
        detector.observe(&room_with("room-1", &["a"])).await;

        assert!(notifier.delivered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_room_switch_resets_the_latch() {
        let (detector, notifier, _) = detector();

        detector.observe(&room_with("room-1", &["me", "a"])).await;
        detector.observe(&room_with("room-1", &["a"])).await;
        assert_eq!(notifier.delivered().len(), 1);

        // A fresh room gets a fresh latch: removal there fires again.
        detector.observe(&room_with("room-2", &["me", "b"])).await;
        assert!(!detector.has_fired());
        detector.observe(&room_with("room-2", &["b"])).await;
        assert_eq!(notifier.delivered().len(), 2);
    }

    #[tokio::test]
    async fn test_rejoining_after_removal_is_tracked_again() {
        let (detector, notifier, _) = detector();

        detector.observe(&room_with("room-1", &["me", "a"])).await;
        detector.observe(&room_with("room-1", &["a"])).await;
        assert_eq!(notifier.delivered().len(), 1);

        // Re-added to the same room: membership is tracked, but the latch
        // holds until a room change.
        detector.observe(&room_with("room-1", &["me", "a"])).await;
        detector.observe(&room_with("room-1", &["a"])).await;
        assert_eq!(notifier.delivered().len(), 1);
    }
}
