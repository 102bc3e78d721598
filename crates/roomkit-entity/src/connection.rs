//! Ephemeral connectivity records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roomkit_core::types::id::{RoomId, UserId};

/// Transport-level connectivity, as seen by the ephemeral channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnState {
    /// Transport is up.
    Connected,
    /// Transport is down, either cleanly or via the server-side fallback.
    Disconnected,
}

/// Per-(room, user) connectivity record.
///
/// Owned by the ephemeral channel's consistency model (last-writer-wins,
/// server-assigned disconnect on transport loss). Not guaranteed to agree
/// with the durable room record at any instant; reconciling the two is the
/// presence publisher's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    /// Current transport state.
    pub state: ConnState,
    /// When the state last changed.
    pub last_changed: DateTime<Utc>,
}

impl ConnectionState {
    /// A connected record stamped now.
    pub fn connected(now: DateTime<Utc>) -> Self {
        Self {
            state: ConnState::Connected,
            last_changed: now,
        }
    }

    /// A disconnected record stamped now.
    pub fn disconnected(now: DateTime<Utc>) -> Self {
        Self {
            state: ConnState::Disconnected,
            last_changed: now,
        }
    }
}

/// Key addressing one seat's connectivity record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// The room the seat belongs to.
    pub room_id: RoomId,
    /// The seated user.
    pub user_id: UserId,
}

impl SessionKey {
    /// Create a session key.
    pub fn new(room_id: RoomId, user_id: UserId) -> Self {
        Self { room_id, user_id }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.room_id, self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::new(RoomId::new("room-1"), UserId::new("alice"));
        assert_eq!(key.to_string(), "room-1/alice");
    }

    #[test]
    fn test_connection_state_constructors() {
        let now = Utc::now();
        assert_eq!(ConnectionState::connected(now).state, ConnState::Connected);
        assert_eq!(
            ConnectionState::disconnected(now).state,
            ConnState::Disconnected
        );
    }
}
