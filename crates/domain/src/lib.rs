//! Fintrack Domain - Core value types
//!
//! This crate defines the value types shared by the request client and the
//! filter synchronizer. All types here are pure Rust with no I/O.

pub mod error;
pub mod filter;
pub mod location;
pub mod request;
pub mod response;

pub use error::{ClassifiedError, DomainError, DomainResult, ErrorCause, ErrorKind};
pub use filter::{FilterState, FilterUpdate, Period};
pub use location::Location;
pub use request::{
    EncodedBody, FormData, FormField, Header, Headers, HttpMethod, HttpRequest, RequestBody,
};
pub use response::ResponseSpec;
