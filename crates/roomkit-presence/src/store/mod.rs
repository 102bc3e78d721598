//! Store-facing trait seams.
//!
//! The coordinator reconciles two independently failing sources: a durable
//! record store holding the room document and an ephemeral channel tracking
//! transport connectivity. Both are consumed through these traits; the
//! in-memory implementations in [`memory`] back tests and single-process
//! deployments.

pub mod memory;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use roomkit_core::types::id::{RoomId, UserId};
use roomkit_core::AppResult;
use roomkit_entity::{ConnectionState, ParticipantPatch, Room, SessionKey};

/// Durable record storage for room and roster state.
#[async_trait]
pub trait RoomStore: Send + Sync + std::fmt::Debug {
    /// Fetch a room snapshot, or `None` when it does not exist.
    async fn get(&self, room_id: &RoomId) -> AppResult<Option<Room>>;

    /// Merge a patch into one participant's roster entry.
    ///
    /// Implementations must scope the write to the addressed entry and
    /// never overwrite the rest of the roster; concurrent writers each
    /// mutate only their own seat.
    async fn merge_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        patch: ParticipantPatch,
    ) -> AppResult<()>;

    /// Delete a room. Deleting an absent room is not an error.
    async fn delete(&self, room_id: &RoomId) -> AppResult<()>;
}

/// A connectivity change observed on the ephemeral channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityEvent {
    /// Whether the transport is currently up.
    pub connected: bool,
}

/// Low-latency, server-assisted connectivity signaling.
///
/// Not a durable record of history: values are last-writer-wins and the
/// server applies registered disconnect fallbacks when a transport drops
/// without a clean teardown.
#[async_trait]
pub trait ConnectivityChannel: Send + Sync + std::fmt::Debug {
    /// Subscribe to connectivity changes for a session key.
    async fn subscribe(
        &self,
        key: &SessionKey,
    ) -> AppResult<BoxStream<'static, ConnectivityEvent>>;

    /// Register the value the server writes if the transport drops without
    /// an explicit disconnect. Must be re-registered after each reconnect.
    async fn register_disconnect_fallback(
        &self,
        key: &SessionKey,
        value_on_disconnect: ConnectionState,
    ) -> AppResult<()>;

    /// Write a connectivity value for a session key.
    async fn set_value(&self, key: &SessionKey, value: ConnectionState) -> AppResult<()>;
}
