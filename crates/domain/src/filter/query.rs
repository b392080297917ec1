//! Query-string codec for [`FilterState`]
//!
//! One key per non-empty field; `categories` is a comma-joined list; numbers
//! are plain decimal text. Reading is lenient: unknown keys and malformed
//! values are dropped so a corrupted URL degrades to "no filter".

use chrono::NaiveDate;

use super::state::FilterState;

/// Query keys understood by the codec.
pub mod keys {
    /// Period preset key.
    pub const PERIOD: &str = "period";
    /// Range start key.
    pub const START_DATE: &str = "startDate";
    /// Range end key.
    pub const END_DATE: &str = "endDate";
    /// Category list key.
    pub const CATEGORIES: &str = "categories";
    /// Lower amount bound key.
    pub const MIN_AMOUNT: &str = "minAmount";
    /// Upper amount bound key.
    pub const MAX_AMOUNT: &str = "maxAmount";
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Returns the ordered key/value pairs for a cleaned copy of `state`.
#[must_use]
pub fn build_url_params(state: &FilterState) -> Vec<(&'static str, String)> {
    let state = state.cleaned();
    let mut params = Vec::new();

    if let Some(period) = state.period {
        params.push((keys::PERIOD, period.as_str().to_string()));
    }
    if let Some(date) = state.start_date {
        params.push((keys::START_DATE, date.format(DATE_FORMAT).to_string()));
    }
    if let Some(date) = state.end_date {
        params.push((keys::END_DATE, date.format(DATE_FORMAT).to_string()));
    }
    if !state.categories.is_empty() {
        params.push((keys::CATEGORIES, state.categories.join(",")));
    }
    if let Some(amount) = state.min_amount {
        params.push((keys::MIN_AMOUNT, amount.to_string()));
    }
    if let Some(amount) = state.max_amount {
        params.push((keys::MAX_AMOUNT, amount.to_string()));
    }

    params
}

/// Encodes `state` as an `application/x-www-form-urlencoded` query string
/// (without a leading `?`). An empty state encodes to an empty string.
#[must_use]
pub fn build_query(state: &FilterState) -> String {
    // Encoding a list of string pairs cannot fail.
    serde_urlencoded::to_string(build_url_params(state)).unwrap_or_default()
}

/// Parses a query string (with or without a leading `?`) into a filter
/// state. Never fails; offending fields are dropped.
#[must_use]
pub fn parse_from_url(query: &str) -> FilterState {
    let query = query.strip_prefix('?').unwrap_or(query);
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();

    let mut state = FilterState::default();
    let mut seen: Vec<&str> = Vec::new();

    for (key, value) in &pairs {
        // First occurrence wins, later repeats are ignored.
        if seen.contains(&key.as_str()) {
            continue;
        }
        seen.push(key);

        let value = value.trim();
        match key.as_str() {
            keys::PERIOD => state.period = value.parse().ok(),
            keys::START_DATE => state.start_date = parse_date(value),
            keys::END_DATE => state.end_date = parse_date(value),
            keys::CATEGORIES => state.set_categories(value.split(',').map(str::trim)),
            keys::MIN_AMOUNT => state.min_amount = parse_amount(value),
            keys::MAX_AMOUNT => state.max_amount = parse_amount(value),
            _ => {}
        }
    }

    state
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Non-negative decimal integers only; signs, fractions and overflow drop.
fn parse_amount(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

impl FilterState {
    /// Encodes this state as a query string, see [`build_query`].
    #[must_use]
    pub fn to_query_string(&self) -> String {
        build_query(self)
    }

    /// Parses a query string, see [`parse_from_url`].
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        parse_from_url(query)
    }
}
