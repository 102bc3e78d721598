//! Domain entity models for RoomKit.
//!
//! Rooms, their participant rosters, and the ephemeral connectivity
//! records are defined here. Models are plain serde-serializable data;
//! the coordination logic lives in `roomkit-presence`.

pub mod connection;
pub mod participant;
pub mod room;

pub use connection::{ConnState, ConnectionState, SessionKey};
pub use participant::{Participant, ParticipantPatch, ParticipantStatus};
pub use room::Room;
