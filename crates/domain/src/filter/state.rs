//! Filter state for narrowing the displayed record list

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Reporting period preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    /// Current calendar month.
    ThisMonth,
    /// Previous calendar month.
    LastMonth,
    /// Current calendar year.
    ThisYear,
    /// Explicit `start_date`/`end_date` range.
    Custom,
}

impl Period {
    /// Returns the query-string spelling of the period.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThisMonth => "thisMonth",
            Self::LastMonth => "lastMonth",
            Self::ThisYear => "thisYear",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "thisMonth" => Ok(Self::ThisMonth),
            "lastMonth" => Ok(Self::LastMonth),
            "thisYear" => Ok(Self::ThisYear),
            "custom" => Ok(Self::Custom),
            other => Err(DomainError::UnknownPeriod(other.to_string())),
        }
    }
}

/// Client-local filter criteria.
///
/// `categories` keeps selection order and never holds duplicates or empty
/// IDs; an empty list means "no category filter". Amounts are in minor
/// currency units. No ordering between `min_amount` and `max_amount` is
/// enforced here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Period preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    /// Range start, meaningful with [`Period::Custom`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Range end, meaningful with [`Period::Custom`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Selected category IDs in selection order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Lower amount bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<u64>,
    /// Upper amount bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<u64>,
}

/// A single-field edit applied through the synchronizer.
///
/// `None` / an empty list clears the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    /// Set or clear the period.
    Period(Option<Period>),
    /// Set or clear the range start.
    StartDate(Option<NaiveDate>),
    /// Set or clear the range end.
    EndDate(Option<NaiveDate>),
    /// Replace the category selection.
    Categories(Vec<String>),
    /// Set or clear the lower amount bound.
    MinAmount(Option<u64>),
    /// Set or clear the upper amount bound.
    MaxAmount(Option<u64>),
}

impl FilterState {
    /// Creates an empty filter state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one field edit.
    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Period(period) => self.period = period,
            FilterUpdate::StartDate(date) => self.start_date = date,
            FilterUpdate::EndDate(date) => self.end_date = date,
            FilterUpdate::Categories(ids) => self.set_categories(ids),
            FilterUpdate::MinAmount(amount) => self.min_amount = amount,
            FilterUpdate::MaxAmount(amount) => self.max_amount = amount,
        }
    }

    /// Replaces the category selection.
    ///
    /// IDs are trimmed; empty, repeated and comma-bearing IDs are dropped so
    /// the selection always survives the comma-joined query encoding.
    pub fn set_categories<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.clear();
        for id in ids {
            let id = id.into();
            if let Some(id) = normalize_category(&id)
                && !self.categories.iter().any(|c| c == id)
            {
                self.categories.push(id.to_string());
            }
        }
    }

    /// Removes `id` if selected, appends it otherwise. IDs rejected by
    /// [`set_categories`](Self::set_categories) are ignored.
    pub fn toggle_category(&mut self, id: &str) {
        let Some(id) = normalize_category(id) else {
            return;
        };
        if let Some(pos) = self.categories.iter().position(|c| c == id) {
            self.categories.remove(pos);
        } else {
            self.categories.push(id.to_string());
        }
    }

    /// Returns a copy with noise removed, see
    /// [`set_categories`](Self::set_categories).
    #[must_use]
    pub fn cleaned(&self) -> Self {
        let mut cleaned = self.clone();
        let categories = std::mem::take(&mut cleaned.categories);
        cleaned.set_categories(categories);
        cleaned
    }

    /// Overlays every field set in `other` onto `self`.
    ///
    /// Fields absent from `other` keep their current value.
    pub fn merge_from(&mut self, other: &Self) {
        if other.period.is_some() {
            self.period = other.period;
        }
        if other.start_date.is_some() {
            self.start_date = other.start_date;
        }
        if other.end_date.is_some() {
            self.end_date = other.end_date;
        }
        if !other.categories.is_empty() {
            self.categories.clone_from(&other.categories);
        }
        if other.min_amount.is_some() {
            self.min_amount = other.min_amount;
        }
        if other.max_amount.is_some() {
            self.max_amount = other.max_amount;
        }
    }

    /// Number of fields currently narrowing the list.
    #[must_use]
    pub fn active_count(&self) -> usize {
        [
            self.period.is_some(),
            self.start_date.is_some(),
            self.end_date.is_some(),
            !self.categories.is_empty(),
            self.min_amount.is_some(),
            self.max_amount.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }
}

/// Trimmed category ID, or `None` when it cannot be stored.
fn normalize_category(id: &str) -> Option<&str> {
    let id = id.trim();
    (!id.is_empty() && !id.contains(',')).then_some(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_period_round_trips_through_str() {
        for period in [
            Period::ThisMonth,
            Period::LastMonth,
            Period::ThisYear,
            Period::Custom,
        ] {
            assert_eq!(period.as_str().parse::<Period>().unwrap(), period);
        }
        assert!("ThisMonth".parse::<Period>().is_err());
    }

    #[test]
    fn test_toggle_twice_restores_selection() {
        let mut state = FilterState::new();
        state.set_categories(["food", "rent"]);
        let before = state.categories.clone();

        state.toggle_category("travel");
        assert_eq!(state.categories, vec!["food", "rent", "travel"]);
        state.toggle_category("travel");

        assert_eq!(state.categories, before);
        assert_eq!(state.categories.len(), 2);
    }

    #[test]
    fn test_toggle_existing_removes_it() {
        let mut state = FilterState::new();
        state.set_categories(["food", "rent"]);
        state.toggle_category("food");
        assert_eq!(state.categories, vec!["rent"]);
    }

    #[test]
    fn test_set_categories_drops_duplicates_and_empties() {
        let mut state = FilterState::new();
        state.set_categories(["food", "", "rent", "food"]);
        assert_eq!(state.categories, vec!["food", "rent"]);
    }

    #[test]
    fn test_set_categories_trims_and_rejects_commas() {
        let mut state = FilterState::new();
        state.set_categories([" food ", "a,b", "food", "  "]);
        assert_eq!(state.categories, vec!["food"]);
    }

    #[test]
    fn test_toggle_ignores_unstorable_ids() {
        let mut state = FilterState::new();
        state.toggle_category("a,b");
        state.toggle_category(" ");
        assert!(state.categories.is_empty());

        state.toggle_category(" rent");
        assert_eq!(state.categories, vec!["rent"]);
        state.toggle_category("rent ");
        assert!(state.categories.is_empty());
    }

    #[test]
    fn test_cleaned_normalizes_raw_categories() {
        let state = FilterState {
            categories: vec![" food".into(), "a,b".into(), "food".into()],
            ..FilterState::default()
        };
        assert_eq!(state.cleaned().categories, vec!["food"]);
    }

    #[test]
    fn test_merge_from_keeps_unset_fields() {
        let mut local = FilterState {
            min_amount: Some(500),
            ..FilterState::default()
        };
        let external = FilterState {
            period: Some(Period::LastMonth),
            ..FilterState::default()
        };
        local.merge_from(&external);
        assert_eq!(local.period, Some(Period::LastMonth));
        assert_eq!(local.min_amount, Some(500));
    }

    #[test]
    fn test_active_count() {
        let mut state = FilterState::new();
        assert!(state.is_empty());
        state.apply(FilterUpdate::Period(Some(Period::ThisYear)));
        state.apply(FilterUpdate::Categories(vec!["food".into()]));
        assert_eq!(state.active_count(), 2);
        state.apply(FilterUpdate::Categories(Vec::new()));
        assert_eq!(state.active_count(), 1);
    }

    #[test]
    fn test_serializes_camel_case_without_empty_fields() {
        let state = FilterState {
            period: Some(Period::ThisMonth),
            min_amount: Some(10_000),
            ..FilterState::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"period": "thisMonth", "minAmount": 10000})
        );
    }
}
