//! Presence publisher — keeps the local seat fresh in both stores.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use roomkit_core::config::presence::PresenceConfig;
use roomkit_core::types::id::{RoomId, UserId};
use roomkit_core::AppResult;
use roomkit_entity::{ConnectionState, ParticipantPatch, SessionKey};

use crate::store::{ConnectivityChannel, RoomStore};

/// Handle to the currently published seat.
#[derive(Debug)]
struct Seat {
    key: SessionKey,
    cancel: CancellationToken,
}

/// Maintains this client's own liveness signal while seated in a room.
///
/// While active, a periodic task merges a heartbeat patch into the local
/// roster entry, and a watcher on the ephemeral channel re-registers the
/// server-side disconnect fallback after every (re)connection so that an
/// abrupt network loss is eventually visible even without clean teardown.
///
/// Heartbeat writes are idempotent and cheap, so individual failures are
/// logged and the next cycle retries implicitly; no backoff is applied.
#[derive(Debug)]
pub struct PresencePublisher {
    /// Durable room store.
    store: Arc<dyn RoomStore>,
    /// Ephemeral connectivity channel.
    channel: Arc<dyn ConnectivityChannel>,
    /// Heartbeat timing configuration.
    config: PresenceConfig,
    /// The seat currently being published, if any.
    seat: Mutex<Option<Seat>>,
}

impl PresencePublisher {
    /// Create a publisher over the given stores.
    pub fn new(
        store: Arc<dyn RoomStore>,
        channel: Arc<dyn ConnectivityChannel>,
        config: PresenceConfig,
    ) -> Self {
        Self {
            store,
            channel,
            config,
            seat: Mutex::new(None),
        }
    }

    /// The session key currently being published, if any.
    pub fn current_seat(&self) -> Option<SessionKey> {
        self.seat.lock().unwrap().as_ref().map(|s| s.key.clone())
    }

    /// Begin publishing presence for a seat.
    ///
    /// Subscribes to the connectivity channel, writes the initial
    /// heartbeat, then starts the periodic refresh. Re-activating while
    /// already active tears the previous seat down first.
    pub async fn activate(&self, room_id: RoomId, user_id: UserId) -> AppResult<()> {
        self.deactivate().await;

        let key = SessionKey::new(room_id, user_id);
        let cancel = CancellationToken::new();

        info!(session = %key, "Presence publisher activating");

        // Subscribing is the only fallible step; it happens before any
        // write or spawned task so a failed activation leaves nothing
        // behind.
        self.spawn_connectivity_watcher(key.clone(), cancel.clone())
            .await?;

        // Initial refresh. A failure here is tolerated; the periodic cycle
        // retries within one interval.
        let now = Utc::now();
        if let Err(e) = self
            .store
            .merge_participant(&key.room_id, &key.user_id, ParticipantPatch::heartbeat(now))
            .await
        {
            warn!(session = %key, error = %e, "Initial heartbeat write failed");
        }

        self.spawn_heartbeat_loop(key.clone(), cancel.clone());

        *self.seat.lock().unwrap() = Some(Seat { key, cancel });
        Ok(())
    }

    /// Stop publishing and vacate the seat cleanly.
    ///
    /// Marks the roster entry as not-in-room without deleting it, then
    /// releases the channel subscription. Safe to call when inactive.
    pub async fn deactivate(&self) {
        let seat = self.seat.lock().unwrap().take();
        let Some(seat) = seat else {
            return;
        };

        seat.cancel.cancel();
        let now = Utc::now();

        if let Err(e) = self
            .store
            .merge_participant(
                &seat.key.room_id,
                &seat.key.user_id,
                ParticipantPatch::leaving(now),
            )
            .await
        {
            warn!(session = %seat.key, error = %e, "Leave write failed");
        }

        if let Err(e) = self
            .channel
            .set_value(&seat.key, ConnectionState::disconnected(now))
            .await
        {
            warn!(session = %seat.key, error = %e, "Channel disconnect write failed");
        }

        info!(session = %seat.key, "Presence publisher deactivated");
    }

    /// Periodic heartbeat refresh, one interval apart, until cancelled.
    fn spawn_heartbeat_loop(&self, key: SessionKey, cancel: CancellationToken) {
        let store = Arc::clone(&self.store);
        let period = Duration::from_secs(self.config.heartbeat_interval_seconds);
        // The activation write covers the current instant; the first tick
        // lands one full interval later, with the deadline fixed here
        // rather than at the task's first poll.
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let now = Utc::now();
                match store
                    .merge_participant(&key.room_id, &key.user_id, ParticipantPatch::heartbeat(now))
                    .await
                {
                    Ok(()) => debug!(session = %key, "Heartbeat refreshed"),
                    Err(e) => warn!(session = %key, error = %e, "Heartbeat write failed"),
                }
            }

            debug!(session = %key, "Heartbeat loop ended");
        });
    }

    /// Watch the channel's own liveness signal; on every (re)connection,
    /// re-register the server-side disconnect fallback and publish the
    /// connected value.
    async fn spawn_connectivity_watcher(
        &self,
        key: SessionKey,
        cancel: CancellationToken,
    ) -> AppResult<()> {
        let channel = Arc::clone(&self.channel);
        let mut events = channel.subscribe(&key).await?;

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.next() => event,
                };

                match event {
                    Some(event) if event.connected => {
                        let now = Utc::now();
                        if let Err(e) = channel
                            .register_disconnect_fallback(
                                &key,
                                ConnectionState::disconnected(now),
                            )
                            .await
                        {
                            warn!(session = %key, error = %e, "Fallback registration failed");
                        }
                        if let Err(e) = channel
                            .set_value(&key, ConnectionState::connected(now))
                            .await
                        {
                            warn!(session = %key, error = %e, "Connected write failed");
                        }
                    }
                    Some(_) => {
                        debug!(session = %key, "Transport reported down");
                    }
                    None => break,
                }
            }

            debug!(session = %key, "Connectivity watcher ended");
        });

        Ok(())
    }
}
