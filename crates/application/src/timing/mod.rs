//! Timer-based call-rate limiters
//!
//! Both primitives spawn their timers on the ambient tokio runtime, so
//! `call` must be invoked from within a runtime context.

mod debounce;
mod throttle;

use std::sync::Arc;

pub use debounce::Debouncer;
pub use throttle::Throttler;

/// Shared callback invoked by the rate limiters.
pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;
