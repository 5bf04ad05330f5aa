//! Secondary views for the dashboard: headline figures, trend series, and
//! rankings built on top of the core growth and market-share tables.

use crate::engine::{sum_by, MetricsDeriver};
use crate::error::AnalyticsError;
use crate::report::{
    CategorySummary, KeyMetrics, LatestGrowth, MarketShareRow, QoQGrowthRow, ShareLeader,
    StateSummary, TrendPoint, YoYGrowthRow,
};
use core_types::{Period, RegistrationRecord};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Names ordered by total descending, ties by name ascending.
fn rank_by_total(totals: BTreeMap<String, u64>) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

impl MetricsDeriver {
    pub fn key_metrics(&self, records: &[RegistrationRecord]) -> Result<KeyMetrics, AnalyticsError> {
        self.validate(records, false)?;

        let monthly: BTreeMap<Period, u64> = sum_by(records, |r| r.period());
        let total_registrations: u64 = monthly.values().sum();
        let active_manufacturers = records
            .iter()
            .map(|r| r.manufacturer.as_str())
            .collect::<HashSet<_>>()
            .len();

        let average_monthly_registrations = if monthly.is_empty() {
            None
        } else {
            Some(Decimal::from(total_registrations) / Decimal::from(monthly.len() as u64))
        };
        let latest = monthly.iter().next_back();

        Ok(KeyMetrics {
            total_registrations,
            active_manufacturers,
            average_monthly_registrations,
            latest_period: latest.map(|(p, _)| *p),
            latest_period_registrations: latest.map(|(_, v)| *v),
        })
    }

    /// Monthly totals per vehicle category.
    pub fn category_trends(&self, records: &[RegistrationRecord]) -> Result<Vec<TrendPoint>, AnalyticsError> {
        self.validate(records, false)?;
        Ok(sum_by(records, |r| (r.period(), r.vehicle_category.clone()))
            .into_iter()
            .map(|((period, series), registrations)| TrendPoint {
                period,
                series,
                registrations,
            })
            .collect())
    }

    /// Monthly totals for the `top_n` manufacturers by overall registrations.
    pub fn manufacturer_trends(
        &self,
        records: &[RegistrationRecord],
        top_n: usize,
    ) -> Result<Vec<TrendPoint>, AnalyticsError> {
        self.validate(records, true)?;

        let top: BTreeSet<String> = rank_by_total(sum_by(records, |r| r.manufacturer.clone()))
            .into_iter()
            .take(top_n)
            .map(|(name, _)| name)
            .collect();

        let selected: Vec<RegistrationRecord> = records
            .iter()
            .filter(|r| top.contains(&r.manufacturer))
            .cloned()
            .collect();

        Ok(sum_by(&selected, |r| (r.period(), r.manufacturer.clone()))
            .into_iter()
            .map(|((period, series), registrations)| TrendPoint {
                period,
                series,
                registrations,
            })
            .collect())
    }

    pub fn category_summary(&self, records: &[RegistrationRecord]) -> Result<Vec<CategorySummary>, AnalyticsError> {
        self.validate(records, false)?;

        let mut counts: BTreeMap<String, (u64, usize)> = BTreeMap::new();
        for record in records {
            let entry = counts.entry(record.vehicle_category.clone()).or_insert((0, 0));
            entry.0 += record.registrations;
            entry.1 += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(vehicle_category, (total, count))| CategorySummary {
                vehicle_category,
                total,
                average: (Decimal::from(total) / Decimal::from(count as u64)).round_dp(2),
                records: count,
            })
            .collect())
    }

    /// The `top_n` states by total registrations.
    pub fn state_summary(&self, records: &[RegistrationRecord], top_n: usize) -> Vec<StateSummary> {
        rank_by_total(sum_by(records, |r| r.state_name.clone()))
            .into_iter()
            .take(top_n)
            .map(|(state_name, total_registrations)| StateSummary {
                state_name,
                total_registrations,
            })
            .collect()
    }
}

/// Keeps the last defined value per category from rows already in chronological order.
fn last_defined<'a, I>(rows: I) -> Vec<LatestGrowth>
where
    I: Iterator<Item = (&'a str, String, Option<Decimal>)>,
{
    let mut latest: BTreeMap<String, LatestGrowth> = BTreeMap::new();
    for (category, as_of, growth) in rows {
        if let Some(growth_percent) = growth {
            latest.insert(
                category.to_string(),
                LatestGrowth {
                    vehicle_category: category.to_string(),
                    as_of,
                    growth_percent,
                },
            );
        }
    }
    latest.into_values().collect()
}

/// The most recent defined YoY growth per category.
pub fn latest_yoy_by_category(rows: &[YoYGrowthRow]) -> Vec<LatestGrowth> {
    last_defined(
        rows.iter()
            .map(|r| (r.vehicle_category.as_str(), r.period.to_string(), r.yoy_growth_percent)),
    )
}

/// The most recent defined QoQ growth per category.
pub fn latest_qoq_by_category(rows: &[QoQGrowthRow]) -> Vec<LatestGrowth> {
    last_defined(
        rows.iter()
            .map(|r| (r.vehicle_category.as_str(), r.quarter.to_string(), r.qoq_growth_percent)),
    )
}

/// Rows of the latest period, keeping the `top_n` manufacturers per category.
///
/// Expects the ordering produced by `calculate_market_share`.
pub fn latest_market_share(rows: &[MarketShareRow], top_n: usize) -> Vec<MarketShareRow> {
    let Some(latest) = rows.iter().map(|r| r.period).max() else {
        return Vec::new();
    };

    let mut taken: BTreeMap<&str, usize> = BTreeMap::new();
    rows.iter()
        .filter(|r| r.period == latest)
        .filter(|r| {
            let count = taken.entry(r.vehicle_category.as_str()).or_insert(0);
            *count += 1;
            *count <= top_n
        })
        .cloned()
        .collect()
}

/// The `top_n` manufacturers per category by mean defined share across periods.
pub fn leading_manufacturers(rows: &[MarketShareRow], top_n: usize) -> Vec<ShareLeader> {
    let mut sums: BTreeMap<(String, String), (Decimal, u64)> = BTreeMap::new();
    for row in rows {
        if let Some(share) = row.market_share_percent {
            let entry = sums
                .entry((row.vehicle_category.clone(), row.manufacturer.clone()))
                .or_insert((Decimal::ZERO, 0));
            entry.0 += share;
            entry.1 += 1;
        }
    }

    let mut leaders: Vec<ShareLeader> = sums
        .into_iter()
        .map(|((vehicle_category, manufacturer), (sum, n))| ShareLeader {
            vehicle_category,
            manufacturer,
            mean_share_percent: sum / Decimal::from(n),
        })
        .collect();
    leaders.sort_by(|a, b| {
        a.vehicle_category
            .cmp(&b.vehicle_category)
            .then_with(|| b.mean_share_percent.cmp(&a.mean_share_percent))
            .then_with(|| a.manufacturer.cmp(&b.manufacturer))
    });

    let mut taken: BTreeMap<String, usize> = BTreeMap::new();
    leaders.retain(|leader| {
        let count = taken.entry(leader.vehicle_category.clone()).or_insert(0);
        *count += 1;
        *count <= top_n
    });
    leaders
}

/// The share history of the given leaders, in the input row order.
pub fn leader_share_trends(rows: &[MarketShareRow], leaders: &[ShareLeader]) -> Vec<MarketShareRow> {
    let wanted: HashSet<(&str, &str)> = leaders
        .iter()
        .map(|l| (l.vehicle_category.as_str(), l.manufacturer.as_str()))
        .collect();
    rows.iter()
        .filter(|r| wanted.contains(&(r.vehicle_category.as_str(), r.manufacturer.as_str())))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, month: u32, category: &str, manufacturer: &str, state: &str, registrations: u64) -> RegistrationRecord {
        RegistrationRecord {
            year,
            month,
            vehicle_category: category.to_string(),
            manufacturer: manufacturer.to_string(),
            state_code: state[..2].to_uppercase(),
            state_name: state.to_string(),
            registrations,
        }
    }

    fn sample() -> Vec<RegistrationRecord> {
        vec![
            record(2024, 1, "Car", "Acme", "Karnataka", 100),
            record(2024, 1, "Car", "Beta", "Kerala", 50),
            record(2024, 2, "Car", "Acme", "Karnataka", 80),
            record(2024, 2, "Truck", "Gamma", "Goa", 20),
            record(2024, 2, "Truck", "Beta", "Kerala", 30),
        ]
    }

    #[test]
    fn key_metrics_summarise_the_selection() {
        let metrics = MetricsDeriver::new().key_metrics(&sample()).unwrap();
        assert_eq!(metrics.total_registrations, 280);
        assert_eq!(metrics.active_manufacturers, 3);
        assert_eq!(metrics.average_monthly_registrations, Some(Decimal::from(140)));
        assert_eq!(metrics.latest_period, Some(Period::new(2024, 2).unwrap()));
        assert_eq!(metrics.latest_period_registrations, Some(130));
    }

    #[test]
    fn key_metrics_on_empty_input_have_no_averages() {
        let metrics = MetricsDeriver::new().key_metrics(&[]).unwrap();
        assert_eq!(metrics, KeyMetrics::default());
    }

    #[test]
    fn manufacturer_trends_keep_only_the_top_n() {
        let points = MetricsDeriver::new().manufacturer_trends(&sample(), 2).unwrap();
        let series: BTreeSet<&str> = points.iter().map(|p| p.series.as_str()).collect();
        assert_eq!(series, BTreeSet::from(["Acme", "Beta"]));
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn category_summary_rounds_the_average() {
        let mut records = sample();
        records.push(record(2024, 3, "Truck", "Gamma", "Goa", 1));
        let summary = MetricsDeriver::new().category_summary(&records).unwrap();
        assert_eq!(summary[0].vehicle_category, "Car");
        assert_eq!(summary[0].total, 230);
        assert_eq!(summary[0].records, 3);
        assert_eq!(summary[0].average, Decimal::new(7667, 2));
        assert_eq!(summary[1].average, Decimal::from(17));
    }

    #[test]
    fn state_summary_ranks_descending() {
        let states = MetricsDeriver::new().state_summary(&sample(), 2);
        assert_eq!(states[0].state_name, "Karnataka");
        assert_eq!(states[0].total_registrations, 180);
        assert_eq!(states[1].state_name, "Kerala");
        assert_eq!(states.len(), 2);
    }

    #[test]
    fn latest_growth_skips_trailing_undefined_values() {
        let p = |m| Period::new(2024, m).unwrap();
        let rows = vec![
            YoYGrowthRow {
                period: p(1),
                vehicle_category: "Car".into(),
                registrations: 10,
                yoy_growth_percent: Some(Decimal::from(5)),
            },
            YoYGrowthRow {
                period: p(2),
                vehicle_category: "Car".into(),
                registrations: 10,
                yoy_growth_percent: None,
            },
            YoYGrowthRow {
                period: p(2),
                vehicle_category: "Truck".into(),
                registrations: 10,
                yoy_growth_percent: None,
            },
        ];
        let latest = latest_yoy_by_category(&rows);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].as_of, "2024-01");
        assert_eq!(latest[0].growth_percent, Decimal::from(5));
    }

    #[test]
    fn latest_market_share_limits_per_category() {
        let deriver = MetricsDeriver::new();
        let rows = deriver.calculate_market_share(&sample()).unwrap();
        let latest = latest_market_share(&rows, 1);
        assert_eq!(latest.len(), 2);
        assert!(latest.iter().all(|r| r.period == Period::new(2024, 2).unwrap()));
        assert_eq!(latest[0].manufacturer, "Acme");
        assert_eq!(latest[1].manufacturer, "Beta");
    }

    #[test]
    fn leaders_rank_by_mean_share() {
        let rows = MetricsDeriver::new().calculate_market_share(&sample()).unwrap();
        let leaders = leading_manufacturers(&rows, 1);
        assert_eq!(leaders.len(), 2);
        assert_eq!(leaders[0].manufacturer, "Acme");
        assert_eq!(leaders[1].vehicle_category, "Truck");
        assert_eq!(leaders[1].manufacturer, "Beta");

        let trends = leader_share_trends(&rows, &leaders);
        assert_eq!(trends.len(), 3);
    }
}
