//! Self-write guard.
//!
//! Every URL write made by the synchronizer comes back as a navigation
//! event. The guard tells those echoes apart from genuine external changes.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;

/// Guard phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// No self-induced write in flight; navigation events are external.
    Idle,
    /// A write has been issued and has not resolved yet.
    WritePending,
    /// The write resolved; late echoes are still absorbed until the
    /// cooldown elapses.
    CooldownPending,
}

/// Proof that a write was started, handed back on completion.
#[derive(Debug)]
#[must_use = "a write ticket must be passed to `finish_write`"]
pub struct WriteTicket {
    generation: u64,
}

struct GuardInner {
    state: GuardState,
    generation: u64,
    cooldown_timer: Option<JoinHandle<()>>,
}

/// `Idle → WritePending → CooldownPending → Idle`, restarted by each write.
#[derive(Clone)]
pub struct SyncGuard {
    cooldown: Duration,
    inner: Arc<Mutex<GuardInner>>,
}

impl SyncGuard {
    /// Creates an idle guard.
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            inner: Arc::new(Mutex::new(GuardInner {
                state: GuardState::Idle,
                generation: 0,
                cooldown_timer: None,
            })),
        }
    }

    /// Enters `WritePending`. Call immediately before issuing the write.
    pub fn begin_write(&self) -> WriteTicket {
        let mut inner = self.inner.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.state = GuardState::WritePending;
        if let Some(timer) = inner.cooldown_timer.take() {
            timer.abort();
        }
        trace!(generation = inner.generation, "guard armed");
        WriteTicket {
            generation: inner.generation,
        }
    }

    /// Starts the cooldown once the write has resolved, successfully or not.
    ///
    /// A ticket from a superseded write is ignored: the newer write owns
    /// the guard.
    pub fn finish_write(&self, ticket: WriteTicket) {
        let mut inner = self.inner.lock();
        if inner.generation != ticket.generation {
            return;
        }
        inner.state = GuardState::CooldownPending;

        let guard = Arc::clone(&self.inner);
        let cooldown = self.cooldown;
        let generation = ticket.generation;
        inner.cooldown_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            let mut inner = guard.lock();
            if inner.generation == generation && inner.state == GuardState::CooldownPending {
                inner.state = GuardState::Idle;
                inner.cooldown_timer = None;
                trace!(generation, "guard released");
            }
        }));
    }

    /// Returns true while navigation events should be treated as echoes.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() != GuardState::Idle
    }

    /// Returns the current phase.
    #[must_use]
    pub fn state(&self) -> GuardState {
        self.inner.lock().state
    }

    /// Stops the cooldown timer without changing the phase.
    pub(crate) fn shutdown(&self) {
        if let Some(timer) = self.inner.lock().cooldown_timer.take() {
            timer.abort();
        }
    }
}

impl std::fmt::Debug for SyncGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncGuard")
            .field("cooldown", &self.cooldown)
            .field("state", &self.state())
            .finish()
    }
}
