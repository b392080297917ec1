//! Filter criteria and their query-string representation

mod query;
mod state;

pub use query::{build_query, build_url_params, keys, parse_from_url};
pub use state::{FilterState, FilterUpdate, Period};
