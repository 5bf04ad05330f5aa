use crate::structs::{Period, RegistrationRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The user's filter selections as an immutable value.
///
/// A dimension that is `None` or holds an empty set is unrestricted.
/// Dates are matched at month granularity: both bounds are inclusive of the
/// month they fall in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub vehicle_categories: Option<BTreeSet<String>>,
    pub manufacturers: Option<BTreeSet<String>>,
    /// State codes, not display names.
    pub states: Option<BTreeSet<String>>,
}

fn to_set<I, S>(values: I) -> Option<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
    if set.is_empty() { None } else { Some(set) }
}

fn allows(set: &Option<BTreeSet<String>>, value: &str) -> bool {
    match set {
        Some(values) if !values.is_empty() => values.contains(value),
        _ => true,
    }
}

impl FilterSpec {
    /// A filter that restricts nothing.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_date_range(self, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
            ..self
        }
    }

    pub fn with_categories<I, S>(self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vehicle_categories: to_set(categories),
            ..self
        }
    }

    pub fn with_manufacturers<I, S>(self, manufacturers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            manufacturers: to_set(manufacturers),
            ..self
        }
    }

    pub fn with_states<I, S>(self, state_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            states: to_set(state_codes),
            ..self
        }
    }

    /// Inclusive period bounds implied by the date range.
    pub fn period_bounds(&self) -> (Option<Period>, Option<Period>) {
        (
            self.start_date.map(Period::from_date),
            self.end_date.map(Period::from_date),
        )
    }

    /// In-memory equivalent of the storage-side query.
    pub fn matches(&self, record: &RegistrationRecord) -> bool {
        let period = record.period();
        let (start, end) = self.period_bounds();
        if start.is_some_and(|s| period < s) || end.is_some_and(|e| period > e) {
            return false;
        }
        allows(&self.vehicle_categories, &record.vehicle_category)
            && allows(&self.manufacturers, &record.manufacturer)
            && allows(&self.states, &record.state_code)
    }

    /// Applies the filter to an in-memory table, keeping input order.
    pub fn apply(&self, records: &[RegistrationRecord]) -> Vec<RegistrationRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, month: u32, category: &str, manufacturer: &str, state: &str) -> RegistrationRecord {
        RegistrationRecord {
            year,
            month,
            vehicle_category: category.into(),
            manufacturer: manufacturer.into(),
            state_code: state.into(),
            state_name: format!("{} state", state),
            registrations: 10,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = FilterSpec::all();
        assert!(filter.matches(&record(1999, 1, "Car", "Acme", "KA")));
    }

    #[test]
    fn empty_sets_mean_no_restriction() {
        let filter = FilterSpec::all().with_categories(Vec::<String>::new());
        assert_eq!(filter.vehicle_categories, None);
        let explicit = FilterSpec {
            manufacturers: Some(BTreeSet::new()),
            ..FilterSpec::default()
        };
        assert!(explicit.matches(&record(2024, 1, "Car", "Acme", "KA")));
    }

    #[test]
    fn date_bounds_are_inclusive_at_month_granularity() {
        let filter = FilterSpec::all().with_date_range(
            NaiveDate::from_ymd_opt(2023, 3, 15),
            NaiveDate::from_ymd_opt(2023, 6, 1),
        );
        assert!(!filter.matches(&record(2023, 2, "Car", "Acme", "KA")));
        assert!(filter.matches(&record(2023, 3, "Car", "Acme", "KA")));
        assert!(filter.matches(&record(2023, 6, "Car", "Acme", "KA")));
        assert!(!filter.matches(&record(2023, 7, "Car", "Acme", "KA")));
    }

    #[test]
    fn dimensions_combine_with_and() {
        let filter = FilterSpec::all()
            .with_categories(["Car"])
            .with_manufacturers(["Acme", "Beta"])
            .with_states(["KA"]);
        let rows = vec![
            record(2024, 1, "Car", "Acme", "KA"),
            record(2024, 1, "Truck", "Acme", "KA"),
            record(2024, 1, "Car", "Gamma", "KA"),
            record(2024, 1, "Car", "Beta", "MH"),
            record(2024, 1, "Car", "Beta", "KA"),
        ];
        let kept = filter.apply(&rows);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].manufacturer, "Acme");
        assert_eq!(kept[1].manufacturer, "Beta");
    }
}
