//! Participant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roomkit_core::types::id::UserId;

/// Coarse, externally settable participant status. Distinct from liveness:
/// a participant can be `Active` here and still be unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Participating normally.
    Active,
    /// Explicitly marked inactive.
    Inactive,
}

/// One seat in a room's roster.
///
/// A roster entry is inserted on join by the external join path and from
/// then on mutated only by the occupying client's own presence publisher.
/// `is_in_room` and `heartbeat_timestamp` are optional because an entry
/// may be observed before the publisher's first refresh has landed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Identity of the occupying user.
    pub id: UserId,
    /// Coarse status flag.
    pub status: ParticipantStatus,
    /// Explicit "present" flag set by the presence publisher.
    pub is_in_room: Option<bool>,
    /// When the participant first entered the room.
    pub joined_at: DateTime<Utc>,
    /// Most recent presence refresh.
    pub last_seen: DateTime<Utc>,
    /// Epoch milliseconds of the most recent liveness pulse. Kept separate
    /// from `last_seen` to tolerate clock-format skew between writers.
    pub heartbeat_timestamp: Option<i64>,
}

impl Participant {
    /// Create a roster entry for a user joining now.
    pub fn joining(id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            status: ParticipantStatus::Active,
            is_in_room: None,
            joined_at: now,
            last_seen: now,
            heartbeat_timestamp: None,
        }
    }

    /// Apply a targeted patch to this entry. Only populated fields change.
    pub fn apply(&mut self, patch: &ParticipantPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(is_in_room) = patch.is_in_room {
            self.is_in_room = Some(is_in_room);
        }
        if let Some(last_seen) = patch.last_seen {
            self.last_seen = last_seen;
        }
        if let Some(heartbeat) = patch.heartbeat_timestamp {
            self.heartbeat_timestamp = Some(heartbeat);
        }
    }
}

/// A targeted, field-wise patch for a single roster entry.
///
/// The roster lives in a single document-like record, so every mutation
/// must merge only the occupying client's own entry. Writers never send a
/// whole roster; they send one of these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantPatch {
    /// New status, if changing.
    pub status: Option<ParticipantStatus>,
    /// New presence flag, if changing.
    pub is_in_room: Option<bool>,
    /// New last-seen timestamp, if changing.
    pub last_seen: Option<DateTime<Utc>>,
    /// New heartbeat pulse, if changing.
    pub heartbeat_timestamp: Option<i64>,
}

impl ParticipantPatch {
    /// The full heartbeat refresh written on activation and every cycle.
    pub fn heartbeat(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(ParticipantStatus::Active),
            is_in_room: Some(true),
            last_seen: Some(now),
            heartbeat_timestamp: Some(now.timestamp_millis()),
        }
    }

    /// The clean-leave patch: marks the seat vacated without deleting it.
    pub fn leaving(now: DateTime<Utc>) -> Self {
        Self {
            status: None,
            is_in_room: Some(false),
            last_seen: Some(now),
            heartbeat_timestamp: None,
        }
    }
}
