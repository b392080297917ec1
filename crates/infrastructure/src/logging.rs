//! Tracing bootstrap.

use std::env;

use tracing_subscriber::EnvFilter;

/// Application-specific filter variable, consulted after `RUST_LOG`.
pub const LOG_ENV: &str = "FINTRACK_LOG";

const DEFAULT_FILTER: &str = "info,fintrack=debug";

/// Initialize the global tracing subscriber.
///
/// Precedence:
/// 1) `RUST_LOG`
/// 2) `FINTRACK_LOG`
/// 3) internal default filter
///
/// Calling it more than once is harmless.
pub fn init() {
    // Fails only when a global subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(filter_from_env())
        .try_init();
}

fn filter_from_env() -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    filter_from(env::var(LOG_ENV).ok().as_deref())
}

fn filter_from(value: Option<&str>) -> EnvFilter {
    if let Some(value) = value.filter(|v| !v.trim().is_empty())
        && let Ok(filter) = EnvFilter::try_new(value)
    {
        return filter;
    }

    EnvFilter::new(DEFAULT_FILTER)
}
