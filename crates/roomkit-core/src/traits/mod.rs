//! Outward-facing trait seams.
//!
//! These traits describe the external collaborators the coordinator calls
//! into but does not implement: user-visible notifications, view
//! navigation, and the authenticated identity. Store-facing traits live in
//! `roomkit-presence` next to their consumers.

pub mod identity;
pub mod navigation;
pub mod notify;

pub use identity::IdentityProvider;
pub use navigation::Navigator;
pub use notify::{Notification, NotificationSink, Severity};
