//! Leading-edge throttle with a trailing flush.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::Callback;

struct ThrottleState<T> {
    in_window: bool,
    trailing: Option<T>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct ThrottleInner<T> {
    window: Duration,
    callback: Callback<T>,
    state: Mutex<ThrottleState<T>>,
}

impl<T> Drop for ThrottleInner<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().timer.take() {
            timer.abort();
        }
    }
}

/// Runs the callback at most once per `window`.
///
/// The first call in a quiet period runs immediately. Calls made while the
/// window is open are coalesced; when it closes, the latest of them runs
/// once and the throttler is quiet again.
pub struct Throttler<T> {
    inner: Arc<ThrottleInner<T>>,
}

impl<T: Send + 'static> Throttler<T> {
    /// Creates a throttler around `callback`.
    pub fn new<F>(window: Duration, callback: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ThrottleInner {
                window,
                callback: Arc::new(callback),
                state: Mutex::new(ThrottleState {
                    in_window: false,
                    trailing: None,
                    generation: 0,
                    timer: None,
                }),
            }),
        }
    }

    /// Returns the window length.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.inner.window
    }

    /// Runs `args` now, or remembers them for the trailing flush.
    pub fn call(&self, args: T) {
        {
            let mut state = self.inner.state.lock();
            if state.in_window {
                state.trailing = Some(args);
                return;
            }

            state.in_window = true;
            state.generation = state.generation.wrapping_add(1);
            let generation = state.generation;
            let window = self.inner.window;
            let weak = Arc::downgrade(&self.inner);
            state.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(window).await;
                close_window(&weak, generation);
            }));
        }

        (self.inner.callback)(args);
    }

    /// Drops the trailing call and closes the current window.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.generation = state.generation.wrapping_add(1);
        state.in_window = false;
        state.trailing = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }
}

fn close_window<T>(weak: &Weak<ThrottleInner<T>>, generation: u64) {
    let Some(inner) = weak.upgrade() else {
        return;
    };

    let trailing = {
        let mut state = inner.state.lock();
        if state.generation != generation {
            return;
        }
        state.in_window = false;
        state.timer = None;
        state.trailing.take()
    };

    if let Some(args) = trailing {
        (inner.callback)(args);
    }
}

impl<T> Clone for Throttler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Throttler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Throttler")
            .field("window", &self.inner.window)
            .field("in_window", &state.in_window)
            .field("trailing", &state.trailing.is_some())
            .finish_non_exhaustive()
    }
}
