//! HTTP request domain types

mod body;
mod header;
mod method;
mod spec;

pub use body::{EncodedBody, FormData, FormField, RequestBody};
pub use header::{Header, Headers, names};
pub use method::HttpMethod;
pub use spec::HttpRequest;
