//! Pure liveness evaluation over room snapshots.

use chrono::{DateTime, Utc};

use roomkit_core::config::presence::PresenceConfig;
use roomkit_entity::{Participant, ParticipantStatus, Room};

/// Whether a single participant counts as truly active at `now`.
///
/// Truly active means all of:
/// - `status` is `Active`
/// - `is_in_room` is not explicitly `false`
/// - the heartbeat pulse is fresh, or the participant joined recently
///   enough that a first heartbeat cannot be expected yet
///
/// The heartbeat freshness and join grace windows are independent
/// tolerances, not one derived from the other.
pub fn is_active(participant: &Participant, now: DateTime<Utc>, config: &PresenceConfig) -> bool {
    if participant.status != ParticipantStatus::Active {
        return false;
    }
    if participant.is_in_room == Some(false) {
        return false;
    }

    let fresh_heartbeat = participant
        .heartbeat_timestamp
        .map(|hb| now.timestamp_millis() - hb < config.heartbeat_freshness_ms)
        .unwrap_or(false);

    let within_join_grace =
        (now - participant.joined_at).num_milliseconds() < config.join_grace_ms;

    fresh_heartbeat || within_join_grace
}

/// The subset of the roster that counts as truly active at `now`.
pub fn active_participants<'a>(
    room: &'a Room,
    now: DateTime<Utc>,
    config: &PresenceConfig,
) -> Vec<&'a Participant> {
    room.participants
        .iter()
        .filter(|p| is_active(p, now, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use roomkit_core::types::id::{RoomId, UserId};

    fn participant(heartbeat_age_secs: Option<i64>, joined_age_secs: i64) -> Participant {
        let now = Utc::now();
        Participant {
            id: UserId::new("alice"),
            status: ParticipantStatus::Active,
            is_in_room: Some(true),
            joined_at: now - Duration::seconds(joined_age_secs),
            last_seen: now,
            heartbeat_timestamp: heartbeat_age_secs
                .map(|age| (now - Duration::seconds(age)).timestamp_millis()),
        }
    }

    fn config() -> PresenceConfig {
        PresenceConfig::default()
    }

    #[test]
    fn test_stale_heartbeat_and_old_join_is_excluded() {
        let p = participant(Some(91), 200);
        assert!(!is_active(&p, Utc::now(), &config()));
    }

    #[test]
    fn test_stale_heartbeat_within_join_grace_is_included() {
        let p = participant(Some(91), 100);
        assert!(is_active(&p, Utc::now(), &config()));
    }

    #[test]
    fn test_fresh_heartbeat_is_included() {
        let p = participant(Some(10), 1_000);
        assert!(is_active(&p, Utc::now(), &config()));
    }

    #[test]
    fn test_missing_heartbeat_relies_on_join_grace() {
        assert!(is_active(&participant(None, 30), Utc::now(), &config()));
        assert!(!is_active(&participant(None, 181), Utc::now(), &config()));
    }

    #[test]
    fn test_inactive_status_is_excluded_even_with_fresh_heartbeat() {
        let mut p = participant(Some(1), 10);
        p.status = ParticipantStatus::Inactive;
        assert!(!is_active(&p, Utc::now(), &config()));
    }

    #[test]
    fn test_explicitly_absent_is_excluded() {
        let mut p = participant(Some(1), 10);
        p.is_in_room = Some(false);
        assert!(!is_active(&p, Utc::now(), &config()));
    }

    #[test]
    fn test_unset_presence_flag_is_not_absence() {
        let mut p = participant(Some(1), 10);
        p.is_in_room = None;
        assert!(is_active(&p, Utc::now(), &config()));
    }

    #[test]
    fn test_active_participants_filters_the_roster() {
        let now = Utc::now();
        let mut room = Room::new(RoomId::new("room-1"), now);
        let mut stale = participant(Some(120), 400);
        stale.id = UserId::new("stale");
        let mut fresh = participant(Some(5), 400);
        fresh.id = UserId::new("fresh");
        room.participants = vec![stale, fresh];

        let active = active_participants(&room, now, &config());
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, UserId::new("fresh"));
    }
}
