//! Trailing-edge debounce.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::Callback;

struct DebounceState<T> {
    generation: u64,
    pending: Option<T>,
    timer: Option<JoinHandle<()>>,
}

struct DebounceInner<T> {
    delay: Duration,
    callback: Callback<T>,
    state: Mutex<DebounceState<T>>,
}

impl<T> Drop for DebounceInner<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().timer.take() {
            timer.abort();
        }
    }
}

/// Runs the callback once, `delay` after the last call, with that call's
/// arguments.
///
/// Cloning yields another handle to the same timer. Dropping the last
/// handle discards any pending call.
pub struct Debouncer<T> {
    inner: Arc<DebounceInner<T>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Creates a debouncer around `callback`.
    pub fn new<F>(delay: Duration, callback: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(DebounceInner {
                delay,
                callback: Arc::new(callback),
                state: Mutex::new(DebounceState {
                    generation: 0,
                    pending: None,
                    timer: None,
                }),
            }),
        }
    }

    /// Returns the quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Schedules `args`, replacing any pending call and restarting the timer.
    pub fn call(&self, args: T) {
        let mut state = self.inner.state.lock();
        state.generation = state.generation.wrapping_add(1);
        state.pending = Some(args);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let generation = state.generation;
        let delay = self.inner.delay;
        let weak = Arc::downgrade(&self.inner);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire(&weak, generation);
        }));
    }

    /// Drops the pending call, if any.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.generation = state.generation.wrapping_add(1);
        state.pending = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// Runs the pending call now instead of waiting for the timer.
    ///
    /// Returns true if a call was pending.
    pub fn flush(&self) -> bool {
        let pending = {
            let mut state = self.inner.state.lock();
            state.generation = state.generation.wrapping_add(1);
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.pending.take()
        };

        pending.is_some_and(|args| {
            (self.inner.callback)(args);
            true
        })
    }

    /// Returns true while a call is waiting for its quiet period.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().pending.is_some()
    }
}

fn fire<T>(weak: &Weak<DebounceInner<T>>, generation: u64) {
    let Some(inner) = weak.upgrade() else {
        return;
    };

    let pending = {
        let mut state = inner.state.lock();
        if state.generation != generation {
            return;
        }
        state.timer = None;
        state.pending.take()
    };

    if let Some(args) = pending {
        (inner.callback)(args);
    }
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Debouncer")
            .field("delay", &self.inner.delay)
            .field("pending", &state.pending.is_some())
            .finish_non_exhaustive()
    }
}
