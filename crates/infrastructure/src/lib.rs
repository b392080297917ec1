//! Fintrack Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus the tracing bootstrap.

pub mod adapters;
pub mod http;
pub mod logging;

pub use adapters::{HistoryNavigator, ReqwestHttpClient};
pub use http::{BodyBuildError, BuiltBody, build_body};
