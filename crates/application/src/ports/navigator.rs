//! Navigator port
//!
//! Abstracts the addressable location (path + query) of the view the
//! filters belong to, e.g. a browser history or a TUI route stack.

use async_trait::async_trait;
use fintrack_domain::Location;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors returned by a navigator write.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavigationError {
    /// The navigation was refused.
    #[error("navigation rejected: {0}")]
    Rejected(String),

    /// The navigator is no longer available.
    #[error("navigator closed")]
    Closed,
}

/// Port for reading and rewriting the current location.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Returns the current location.
    fn location(&self) -> Location;

    /// Replaces the current history entry; resolves once navigation has
    /// settled.
    ///
    /// Implementations notify subscribers of the new location, including
    /// for writes made through this method.
    ///
    /// # Errors
    ///
    /// Returns an error if the navigation was refused.
    async fn replace(&self, location: Location) -> Result<(), NavigationError>;

    /// Subscribes to location changes.
    fn subscribe(&self) -> broadcast::Receiver<Location>;
}
