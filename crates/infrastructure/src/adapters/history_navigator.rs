//! In-process navigation history.
//!
//! Models a browser-style history stack: `push` adds an entry, `back` and
//! `forward` move through it, and `replace` rewrites the current entry.
//! Every change is broadcast to subscribers, whoever caused it.

use std::time::Duration;

use async_trait::async_trait;
use fintrack_application::{NavigationError, Navigator};
use fintrack_domain::Location;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug)]
struct History {
    entries: Vec<Location>,
    index: usize,
}

impl History {
    fn current(&self) -> Location {
        self.entries[self.index].clone()
    }
}

/// History stack implementing the [`Navigator`] port.
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<History>,
    events: broadcast::Sender<Location>,
    settle_delay: Duration,
}

impl HistoryNavigator {
    /// Creates a history with a single entry.
    #[must_use]
    pub fn new(initial: Location) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            history: Mutex::new(History {
                entries: vec![initial],
                index: 0,
            }),
            events,
            settle_delay: Duration::ZERO,
        }
    }

    /// Delays every `replace` by `delay` before it takes effect, to model a
    /// slow router.
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Navigates to a new entry, discarding any forward entries.
    pub fn push(&self, location: Location) {
        {
            let mut history = self.history.lock();
            let keep = history.index + 1;
            history.entries.truncate(keep);
            history.entries.push(location.clone());
            history.index = keep;
        }
        self.emit(location);
    }

    /// Moves one entry back. Returns the new location, or `None` at the
    /// start of the history.
    pub fn back(&self) -> Option<Location> {
        let location = {
            let mut history = self.history.lock();
            history.index = history.index.checked_sub(1)?;
            history.current()
        };
        self.emit(location.clone());
        Some(location)
    }

    /// Moves one entry forward. Returns the new location, or `None` at the
    /// end of the history.
    pub fn forward(&self) -> Option<Location> {
        let location = {
            let mut history = self.history.lock();
            if history.index + 1 >= history.entries.len() {
                return None;
            }
            history.index += 1;
            history.current()
        };
        self.emit(location.clone());
        Some(location)
    }

    /// Returns every entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<Location> {
        self.history.lock().entries.clone()
    }

    fn emit(&self, location: Location) {
        debug!(%location, "navigated");
        // No subscribers is fine.
        let _ = self.events.send(location);
    }
}

#[async_trait]
impl Navigator for HistoryNavigator {
    fn location(&self) -> Location {
        self.history.lock().current()
    }

    async fn replace(&self, location: Location) -> Result<(), NavigationError> {
        if !location.path.starts_with('/') {
            return Err(NavigationError::Rejected(format!(
                "path must be absolute: {location}"
            )));
        }
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        {
            let mut history = self.history.lock();
            let index = history.index;
            history.entries[index] = location.clone();
        }
        self.emit(location);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Location> {
        self.events.subscribe()
    }
}
