//! Authenticated identity seam.

use crate::types::id::UserId;

/// Provides the currently authenticated user, if any.
///
/// Authentication mechanics are out of scope; the coordinator only needs a
/// stable identifier for the seated user.
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// The current authenticated user id, or `None` when signed out.
    fn current_user(&self) -> Option<UserId>;
}
