//! Room presence and lifecycle coordination for RoomKit.
//!
//! This crate tracks which participants of a shared session are actually
//! alive, reconciles that information across the durable room store and the
//! ephemeral connectivity channel, evicts a room once nobody remains,
//! detects forced removal of the local user, and computes backoff for lost
//! peer connections.
//!
//! The pieces, leaf to root:
//! - [`reconnect::ReconnectPolicy`] — per-peer retry accounting
//! - [`liveness`] — pure evaluation of who counts as truly active
//! - [`publisher::PresencePublisher`] — keeps the local seat fresh
//! - [`lifecycle::RoomLifecycleMonitor`] — deferred room destruction
//! - [`removal::RemovalDetector`] — "I left" vs "I was removed"
//! - [`coordinator::PresenceCoordinator`] — the facade tying them together
//! - [`service::PresenceService`] — process-wide start/stop wrapper

pub mod coordinator;
pub mod lifecycle;
pub mod liveness;
pub mod publisher;
pub mod reconnect;
pub mod removal;
pub mod service;
pub mod store;

pub use coordinator::PresenceCoordinator;
pub use reconnect::ReconnectPolicy;
pub use service::PresenceService;
