//! Resilient request client
//!
//! - [`RequestExecutor`] runs one logical call as a series of attempts
//! - [`classify`] maps every failure onto the closed error taxonomy
//! - [`RetryConfig`] decides whether and when to try again
//! - [`normalize`] turns a successful response into a [`Payload`]

mod classify;
mod executor;
mod normalize;
mod options;
mod retry;

pub use classify::{CancelReason, Failure, classify};
pub use executor::RequestExecutor;
pub use normalize::{Payload, is_json_content_type, normalize};
pub use options::RequestOptions;
pub use retry::{RetryCondition, RetryConfig, TRANSIENT_STATUSES, is_transient};
