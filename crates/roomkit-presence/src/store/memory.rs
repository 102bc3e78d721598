//! In-memory store and channel implementations.
//!
//! Back the integration tests and single-process deployments. The room
//! store honors the entry-scoped merge contract, so it behaves like the
//! real document store under concurrent joiners.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tracing::debug;

use roomkit_core::traits::{IdentityProvider, Navigator, Notification, NotificationSink};
use roomkit_core::types::id::{RoomId, UserId};
use roomkit_core::{AppError, AppResult};
use roomkit_entity::{ConnectionState, Participant, ParticipantPatch, Room, SessionKey};

use super::{ConnectivityChannel, ConnectivityEvent, RoomStore};

/// DashMap-backed durable room store.
#[derive(Debug, Default)]
pub struct MemoryRoomStore {
    /// Room ID → room document.
    rooms: DashMap<RoomId, Room>,
    /// Successful participant merges, for observing heartbeat cadence.
    merges: std::sync::atomic::AtomicU64,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a room document. Used by the external join path.
    pub fn insert_room(&self, room: Room) {
        self.rooms.insert(room.id.clone(), room);
    }

    /// Whether a room currently exists.
    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Number of successful participant merges so far.
    pub fn merge_count(&self) -> u64 {
        self.merges.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn get(&self, room_id: &RoomId) -> AppResult<Option<Room>> {
        Ok(self.rooms.get(room_id).map(|r| r.value().clone()))
    }

    async fn merge_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        patch: ParticipantPatch,
    ) -> AppResult<()> {
        let mut room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| AppError::not_found(format!("room {room_id} does not exist")))?;

        // Entry-scoped merge: touch only the addressed seat.
        match room.participants.iter_mut().find(|p| &p.id == user_id) {
            Some(existing) => existing.apply(&patch),
            None => {
                let mut joined = Participant::joining(user_id.clone(), Utc::now());
                joined.apply(&patch);
                room.participants.push(joined);
            }
        }
        room.last_activity = Utc::now();
        self.merges
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, room_id: &RoomId) -> AppResult<()> {
        if self.rooms.remove(room_id).is_none() {
            debug!(room_id = %room_id, "Delete of absent room ignored");
        }
        Ok(())
    }
}

/// In-memory ephemeral connectivity channel.
///
/// Holds last-writer-wins values, registered disconnect fallbacks, and
/// per-key subscriber lists. [`drop_transport`](Self::drop_transport)
/// simulates the server applying a fallback after an unclean transport
/// loss.
#[derive(Debug, Default)]
pub struct MemoryConnectivityChannel {
    /// Session key → current connectivity value.
    values: DashMap<SessionKey, ConnectionState>,
    /// Session key → value the server writes on transport loss.
    fallbacks: DashMap<SessionKey, ConnectionState>,
    /// Session key → live subscriber senders.
    subscribers: DashMap<SessionKey, Vec<mpsc::UnboundedSender<ConnectivityEvent>>>,
}

impl MemoryConnectivityChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current connectivity value for a key, if any.
    pub fn value(&self, key: &SessionKey) -> Option<ConnectionState> {
        self.values.get(key).map(|v| *v.value())
    }

    /// Registered disconnect fallback for a key, if any.
    pub fn fallback(&self, key: &SessionKey) -> Option<ConnectionState> {
        self.fallbacks.get(key).map(|v| *v.value())
    }

    /// Emit a connectivity event to all subscribers of a key.
    pub fn emit(&self, key: &SessionKey, connected: bool) {
        if let Some(mut senders) = self.subscribers.get_mut(key) {
            senders.retain(|tx| tx.send(ConnectivityEvent { connected }).is_ok());
        }
    }

    /// Simulate an unclean transport loss: the server applies the
    /// registered fallback value and subscribers observe a disconnect.
    pub fn drop_transport(&self, key: &SessionKey) {
        if let Some(fallback) = self.fallback(key) {
            self.values.insert(key.clone(), fallback);
        }
        self.emit(key, false);
    }
}

#[async_trait]
impl ConnectivityChannel for MemoryConnectivityChannel {
    async fn subscribe(
        &self,
        key: &SessionKey,
    ) -> AppResult<BoxStream<'static, ConnectivityEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        // New subscribers observe the current transport state immediately.
        let _ = tx.send(ConnectivityEvent { connected: true });
        self.subscribers.entry(key.clone()).or_default().push(tx);

        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })))
    }

    async fn register_disconnect_fallback(
        &self,
        key: &SessionKey,
        value_on_disconnect: ConnectionState,
    ) -> AppResult<()> {
        self.fallbacks.insert(key.clone(), value_on_disconnect);
        Ok(())
    }

    async fn set_value(&self, key: &SessionKey, value: ConnectionState) -> AppResult<()> {
        self.values.insert(key.clone(), value);
        Ok(())
    }
}

/// Notification sink that records everything it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications delivered so far.
    pub fn delivered(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

/// Navigator that records requested redirects.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All redirect paths requested so far.
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn redirect_to(&self, path: &str) {
        self.redirects.lock().unwrap().push(path.to_string());
    }
}

/// Identity provider backed by a fixed user.
#[derive(Debug)]
pub struct StaticIdentity {
    user: Option<UserId>,
}

impl StaticIdentity {
    /// An identity provider for a signed-in user.
    pub fn signed_in(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    /// An identity provider with nobody signed in.
    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }
}
