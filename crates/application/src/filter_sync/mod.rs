//! Filter state / URL synchronization

mod guard;
mod synchronizer;

pub use guard::{GuardState, SyncGuard, WriteTicket};
pub use synchronizer::{
    DEFAULT_DEBOUNCE, DEFAULT_GUARD_COOLDOWN, DEFAULT_THROTTLE, FilterStateSynchronizer,
    SyncOptions,
};
