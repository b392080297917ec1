//! HTTP infrastructure utilities.
//!
//! This module provides body building for text and multipart payloads.

mod body_builder;

pub use body_builder::{BodyBuildError, BuiltBody, build_body};
