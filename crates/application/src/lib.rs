//! Fintrack Application - Request client and filter synchronization
//!
//! This crate defines the application layer with:
//! - Port traits (HTTP transport, navigation)
//! - The resilient request executor
//! - Debounce/throttle primitives
//! - The filter state / URL synchronizer

pub mod client;
pub mod config;
pub mod filter_sync;
pub mod ports;
pub mod timing;

pub use client::{Payload, RequestExecutor, RequestOptions, RetryConfig};
pub use config::ClientConfig;
pub use filter_sync::{FilterStateSynchronizer, SyncOptions};
pub use ports::{
    CancellationReceiver, CancellationToken, HttpClient, HttpClientError, NavigationError,
    Navigator,
};
pub use timing::{Debouncer, Throttler};
