//! Room entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roomkit_core::types::id::{RoomId, UserId};

use crate::participant::Participant;

/// A collaborative session and its roster.
///
/// Rooms are created externally when a user starts a session. They are
/// destroyed by the lifecycle monitor once liveness criteria are unmet for
/// the configured window, or by explicit host action outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Opaque unique identifier.
    pub id: RoomId,
    /// Ordered roster of seats.
    pub participants: Vec<Participant>,
    /// Whether the room opts into participant-configured auto-close.
    pub auto_close_after_inactivity: bool,
    /// Auto-close window in minutes; meaningful only when the flag is set.
    pub inactivity_timeout_minutes: Option<u32>,
    /// Updated on any presence refresh.
    pub last_activity: DateTime<Utc>,
}

impl Room {
    /// Create an empty room.
    pub fn new(id: RoomId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            participants: Vec::new(),
            auto_close_after_inactivity: false,
            inactivity_timeout_minutes: None,
            last_activity: now,
        }
    }

    /// Look up a roster entry by user id.
    pub fn participant(&self, user_id: &UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == user_id)
    }

    /// Whether the roster contains an entry for the given user.
    pub fn has_participant(&self, user_id: &UserId) -> bool {
        self.participant(user_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_lookup() {
        let now = Utc::now();
        let mut room = Room::new(RoomId::new("room-1"), now);
        room.participants
            .push(Participant::joining(UserId::new("alice"), now));

        assert!(room.has_participant(&UserId::new("alice")));
        assert!(!room.has_participant(&UserId::new("bob")));
    }
}
