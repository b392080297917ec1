//! Bidirectional filter state / URL synchronizer.

use std::sync::{Arc, Weak};
use std::time::Duration;

use fintrack_domain::{FilterState, FilterUpdate, Location};
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::guard::{SyncGuard, WriteTicket};
use crate::ports::Navigator;
use crate::timing::{Debouncer, Throttler};

/// Quiet period before a local edit is written to the URL.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
/// Notification rate limit.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(500);
/// How long navigation events are still absorbed after a write resolves.
pub const DEFAULT_GUARD_COOLDOWN: Duration = Duration::from_millis(100);

/// Synchronizer timing and mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Skip all URL reads and writes.
    pub disable_url_sync: bool,
    /// URL write debounce.
    pub debounce: Duration,
    /// Notification window used by [`FilterStateSynchronizer::with_callback`].
    pub throttle: Duration,
    /// Guard cooldown after each URL write.
    pub guard_cooldown: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            disable_url_sync: false,
            debounce: DEFAULT_DEBOUNCE,
            throttle: DEFAULT_THROTTLE,
            guard_cooldown: DEFAULT_GUARD_COOLDOWN,
        }
    }
}

struct SyncInner {
    state: Mutex<FilterState>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Throttler<FilterState>,
    writer: Debouncer<FilterState>,
    guard: SyncGuard,
}

/// Keeps a [`FilterState`] and the current location's query in step.
///
/// Local edits are applied synchronously, then announced through the
/// throttled notifier and written to the URL after a debounce. Navigation
/// events that are not echoes of our own writes are parsed back into the
/// state.
///
/// The in-memory state is the source of truth: a failed URL write is
/// logged and otherwise ignored.
pub struct FilterStateSynchronizer {
    inner: Arc<SyncInner>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl FilterStateSynchronizer {
    /// Mounts the synchronizer on `navigator`.
    ///
    /// The initial state is parsed from the current location and announced
    /// through `notifier`. With `disable_url_sync` the navigator is never
    /// touched and the state starts empty.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn mount(
        navigator: Arc<dyn Navigator>,
        notifier: Throttler<FilterState>,
        options: SyncOptions,
    ) -> Self {
        let navigator = (!options.disable_url_sync).then_some(navigator);
        Self::start(navigator, notifier, options)
    }

    /// Mounts a synchronizer with no addressable location.
    #[must_use]
    pub fn mount_detached(notifier: Throttler<FilterState>, options: SyncOptions) -> Self {
        Self::start(None, notifier, options)
    }

    /// Mounts with a plain callback, throttled by `options.throttle`.
    ///
    /// Pass `None` to run without URL sync.
    #[must_use]
    pub fn with_callback<F>(
        navigator: Option<Arc<dyn Navigator>>,
        options: SyncOptions,
        on_filters_change: F,
    ) -> Self
    where
        F: Fn(FilterState) + Send + Sync + 'static,
    {
        let notifier = Throttler::new(options.throttle, on_filters_change);
        match navigator {
            Some(navigator) => Self::mount(navigator, notifier, options),
            None => Self::mount_detached(notifier, options),
        }
    }

    fn start(
        navigator: Option<Arc<dyn Navigator>>,
        notifier: Throttler<FilterState>,
        options: SyncOptions,
    ) -> Self {
        let initial = navigator
            .as_ref()
            .map(|nav| FilterState::from_query(&nav.location().query))
            .unwrap_or_default();
        let events = navigator.as_ref().map(|nav| nav.subscribe());

        let inner = Arc::new_cyclic(|weak: &Weak<SyncInner>| {
            let weak = weak.clone();
            let writer = Debouncer::new(options.debounce, move |state: FilterState| {
                if let Some(inner) = weak.upgrade() {
                    inner.schedule_write(&state);
                }
            });
            SyncInner {
                state: Mutex::new(initial.clone()),
                navigator,
                notifier,
                writer,
                guard: SyncGuard::new(options.guard_cooldown),
            }
        });

        let listener = events.map(|events| tokio::spawn(listen(Arc::downgrade(&inner), events)));

        debug!(
            filters = %initial.to_query_string(),
            url_sync = inner.navigator.is_some(),
            "filter synchronizer mounted"
        );
        inner.notifier.call(initial);

        Self {
            inner,
            listener: Mutex::new(listener),
        }
    }

    /// Returns a snapshot of the current filters.
    #[must_use]
    pub fn filters(&self) -> FilterState {
        self.inner.state.lock().clone()
    }

    /// Returns the selected category IDs in selection order.
    #[must_use]
    pub fn selected_categories(&self) -> Vec<String> {
        self.inner.state.lock().categories.clone()
    }

    /// Number of active filter fields, e.g. for a badge.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        self.inner.state.lock().active_count()
    }

    /// Returns true if any filter field is set.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        !self.inner.state.lock().is_empty()
    }

    /// Applies one field edit.
    pub fn update_filter(&self, update: FilterUpdate) {
        self.update_filters([update]);
    }

    /// Applies several field edits as one state change.
    pub fn update_filters<I>(&self, updates: I)
    where
        I: IntoIterator<Item = FilterUpdate>,
    {
        self.inner.edit(|state| {
            for update in updates {
                state.apply(update);
            }
        });
    }

    /// Adds `id` to the category selection, or removes it if present.
    pub fn toggle_category(&self, id: &str) {
        self.inner.edit(|state| state.toggle_category(id));
    }

    /// Clears every filter and writes the bare path right away.
    ///
    /// Resolves once the navigation has settled.
    pub async fn reset_filters(&self) {
        *self.inner.state.lock() = FilterState::default();
        self.inner.writer.cancel();
        self.inner.notifier.call(FilterState::default());

        let Some(navigator) = &self.inner.navigator else {
            return;
        };
        let location = navigator.location().bare();
        let ticket = self.inner.guard.begin_write();
        self.inner.write_url(location, ticket).await;
    }

    /// Stops listening for navigation events and drops pending timers.
    pub fn shutdown(&self) {
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.abort();
            debug!("filter synchronizer stopped");
        }
        self.inner.writer.cancel();
        self.inner.notifier.cancel();
        self.inner.guard.shutdown();
    }
}

impl Drop for FilterStateSynchronizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for FilterStateSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStateSynchronizer")
            .field("filters", &self.filters())
            .field("url_sync", &self.inner.navigator.is_some())
            .field("guard", &self.inner.guard)
            .finish_non_exhaustive()
    }
}

impl SyncInner {
    /// Mutates the state and schedules the side effects if it changed.
    fn edit(&self, mutate: impl FnOnce(&mut FilterState)) {
        let snapshot = {
            let mut state = self.state.lock();
            let before = state.clone();
            mutate(&mut *state);
            if *state == before {
                return;
            }
            state.clone()
        };

        if self.navigator.is_some() {
            self.writer.call(snapshot.clone());
        }
        self.notifier.call(snapshot);
    }

    /// Runs when the debounce elapses. Arms the guard before yielding so
    /// no navigation event can slip in between.
    fn schedule_write(self: Arc<Self>, state: &FilterState) {
        let Some(navigator) = &self.navigator else {
            return;
        };

        let current = navigator.location();
        let query = state.cleaned().to_query_string();
        if current.query == query {
            debug!(%current, "URL already up to date");
            return;
        }

        let location = current.with_query(query);
        let ticket = self.guard.begin_write();
        tokio::spawn(async move {
            self.write_url(location, ticket).await;
        });
    }

    async fn write_url(&self, location: Location, ticket: WriteTicket) {
        let Some(navigator) = &self.navigator else {
            self.guard.finish_write(ticket);
            return;
        };

        debug!(%location, "writing filters to URL");
        let result = navigator.replace(location).await;
        self.guard.finish_write(ticket);

        if let Err(e) = result {
            warn!(error = %e, "failed to write filters to URL");
        }
    }

    fn on_external(&self, location: &Location) {
        if self.guard.is_active() {
            debug!(%location, "ignoring navigation caused by our own write");
            return;
        }

        let incoming = FilterState::from_query(&location.query);
        let write_pending = self.writer.is_pending();
        let snapshot = {
            let mut state = self.state.lock();
            let before = state.clone();
            if write_pending {
                state.merge_from(&incoming);
            } else {
                *state = incoming;
            }
            if *state == before {
                return;
            }
            state.clone()
        };

        debug!(%location, merged = write_pending, "reconciled external URL change");
        if write_pending {
            self.writer.call(snapshot.clone());
        }
        self.notifier.call(snapshot);
    }
}

async fn listen(inner: Weak<SyncInner>, mut events: broadcast::Receiver<Location>) {
    loop {
        let location = match events.recv().await {
            Ok(location) => location,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "navigation events lagged, resyncing from current location");
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                match &inner.navigator {
                    Some(navigator) => navigator.location(),
                    None => break,
                }
            }
            Err(RecvError::Closed) => break,
        };

        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.on_external(&location);
    }
}
