//! Addressable view location (path + query)

use std::fmt;

/// Path and query string of the current view.
///
/// The query is stored without the leading `?`; a fragment, if present in
/// the parsed input, is discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location {
    /// Path component, e.g. `/transactions`.
    pub path: String,
    /// Query component without `?`, possibly empty.
    pub query: String,
}

impl Location {
    /// Creates a location from its parts.
    #[must_use]
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            path: path.into(),
            query: query.strip_prefix('?').map_or(query.clone(), str::to_string),
        }
    }

    /// Parses `path?query#fragment`.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let without_fragment = input.split_once('#').map_or(input, |(head, _)| head);
        match without_fragment.split_once('?') {
            Some((path, query)) => Self::new(path, query),
            None => Self::new(without_fragment, ""),
        }
    }

    /// Returns the same path with a different query.
    #[must_use]
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self::new(self.path.clone(), query)
    }

    /// Returns the bare path with no query.
    #[must_use]
    pub fn bare(&self) -> Self {
        Self::new(self.path.clone(), "")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.query.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}?{}", self.path, self.query)
        }
    }
}
