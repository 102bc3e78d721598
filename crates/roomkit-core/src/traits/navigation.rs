//! View navigation seam.

use async_trait::async_trait;

/// Fire-and-forget navigation to another view.
#[async_trait]
pub trait Navigator: Send + Sync + std::fmt::Debug {
    /// Redirect the current user to the given path.
    async fn redirect_to(&self, path: &str);
}
