use crate::error::AnalyticsError;
use crate::report::{MarketShareRow, QoQGrowthRow, YoYGrowthRow};
use core_types::{Period, Quarter, RegistrationRecord};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A stateless calculator for deriving growth and market-share metrics from
/// registration records.
///
/// Every call works on its own input slice and returns freshly allocated rows,
/// so a single deriver can be shared freely across threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsDeriver {}

/// Sums registrations into one accumulator per key.
///
/// `BTreeMap` keeps the keys ordered, which gives every derived table its
/// chronological order for free.
pub(crate) fn sum_by<K, F>(records: &[RegistrationRecord], key: F) -> BTreeMap<K, u64>
where
    K: Ord,
    F: Fn(&RegistrationRecord) -> K,
{
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(key(record)).or_insert(0) += record.registrations;
    }
    totals
}

/// Percentage change from `prior` to `current`. Undefined for a missing or zero prior.
pub(crate) fn growth_percent(current: u64, prior: Option<u64>) -> Option<Decimal> {
    let prior = prior.filter(|p| *p > 0)?;
    let prior = Decimal::from(prior);
    Some((Decimal::from(current) - prior) / prior * Decimal::ONE_HUNDRED)
}

/// Descending by share with undefined shares last.
fn compare_share(a: &Option<Decimal>, b: &Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl MetricsDeriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects rows the aggregations cannot place: a month outside 1..=12, or
    /// a blank grouping column.
    pub(crate) fn validate(
        &self,
        records: &[RegistrationRecord],
        needs_manufacturer: bool,
    ) -> Result<(), AnalyticsError> {
        for (row, record) in records.iter().enumerate() {
            if !(1..=12).contains(&record.month) {
                return Err(AnalyticsError::Validation {
                    row,
                    reason: format!("month {} is outside 1..=12", record.month),
                });
            }
            if record.vehicle_category.trim().is_empty() {
                return Err(AnalyticsError::Validation {
                    row,
                    reason: "vehicle_category is empty".to_string(),
                });
            }
            if needs_manufacturer && record.manufacturer.trim().is_empty() {
                return Err(AnalyticsError::Validation {
                    row,
                    reason: "manufacturer is empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Year-over-year growth per (period, category).
    ///
    /// Each period is compared with the same month one year earlier. Rows with
    /// no prior-year data, or a prior-year total of zero, carry `None`.
    /// Output is ordered by period, then category.
    pub fn calculate_yoy_growth(
        &self,
        records: &[RegistrationRecord],
    ) -> Result<Vec<YoYGrowthRow>, AnalyticsError> {
        self.validate(records, false)?;

        let totals: BTreeMap<(Period, String), u64> =
            sum_by(records, |r| (r.period(), r.vehicle_category.clone()));

        let rows: Vec<YoYGrowthRow> = totals
            .iter()
            .map(|((period, category), &current)| {
                let prior = totals
                    .get(&(period.months_before(12), category.clone()))
                    .copied();
                YoYGrowthRow {
                    period: *period,
                    vehicle_category: category.clone(),
                    registrations: current,
                    yoy_growth_percent: growth_percent(current, prior),
                }
            })
            .collect();

        tracing::debug!(input = records.len(), rows = rows.len(), "Calculated YoY growth.");
        Ok(rows)
    }

    /// Quarter-over-quarter growth per (calendar quarter, category).
    ///
    /// Monthly rows are first rolled up into quarterly totals. A quarter whose
    /// immediately preceding quarter has no data (or a zero total) carries `None`.
    pub fn calculate_qoq_growth(
        &self,
        records: &[RegistrationRecord],
    ) -> Result<Vec<QoQGrowthRow>, AnalyticsError> {
        self.validate(records, false)?;

        let totals: BTreeMap<(Quarter, String), u64> =
            sum_by(records, |r| (r.period().quarter(), r.vehicle_category.clone()));

        let rows: Vec<QoQGrowthRow> = totals
            .iter()
            .map(|((quarter, category), &current)| {
                let prior = totals.get(&(quarter.previous(), category.clone())).copied();
                QoQGrowthRow {
                    quarter: *quarter,
                    vehicle_category: category.clone(),
                    registrations: current,
                    qoq_growth_percent: growth_percent(current, prior),
                }
            })
            .collect();

        tracing::debug!(input = records.len(), rows = rows.len(), "Calculated QoQ growth.");
        Ok(rows)
    }

    /// Each manufacturer's share of its category's registrations per period.
    ///
    /// When a (period, category) totals zero, its manufacturers are still listed
    /// but with an undefined share. Output is ordered by period, category,
    /// descending share, then manufacturer name.
    pub fn calculate_market_share(
        &self,
        records: &[RegistrationRecord],
    ) -> Result<Vec<MarketShareRow>, AnalyticsError> {
        self.validate(records, true)?;

        let by_manufacturer: BTreeMap<(Period, String, String), u64> = sum_by(records, |r| {
            (
                r.period(),
                r.vehicle_category.clone(),
                r.manufacturer.clone(),
            )
        });
        let by_category: BTreeMap<(Period, String), u64> =
            sum_by(records, |r| (r.period(), r.vehicle_category.clone()));

        let mut rows: Vec<MarketShareRow> = by_manufacturer
            .into_iter()
            .map(|((period, category, manufacturer), total)| {
                let category_total = by_category
                    .get(&(period, category.clone()))
                    .copied()
                    .unwrap_or(0);
                let share = if category_total > 0 {
                    Some(
                        Decimal::from(total) / Decimal::from(category_total)
                            * Decimal::ONE_HUNDRED,
                    )
                } else {
                    None
                };
                MarketShareRow {
                    period,
                    vehicle_category: category,
                    manufacturer,
                    registrations: total,
                    market_share_percent: share,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            a.period
                .cmp(&b.period)
                .then_with(|| a.vehicle_category.cmp(&b.vehicle_category))
                .then_with(|| compare_share(&a.market_share_percent, &b.market_share_percent))
                .then_with(|| a.manufacturer.cmp(&b.manufacturer))
        });

        tracing::debug!(input = records.len(), rows = rows.len(), "Calculated market share.");
        Ok(rows)
    }
}
