use core_types::{Period, Quarter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Year-over-year growth for one category in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoYGrowthRow {
    pub period: Period,
    pub vehicle_category: String,
    /// Summed registrations for this period and category.
    pub registrations: u64,
    pub yoy_growth_percent: Option<Decimal>, // None when there is no usable prior-year total
}

/// Quarter-over-quarter growth for one category in one calendar quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QoQGrowthRow {
    pub quarter: Quarter,
    pub vehicle_category: String,
    pub registrations: u64,
    pub qoq_growth_percent: Option<Decimal>, // None when the preceding quarter is missing or zero
}

/// A manufacturer's share of its category in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketShareRow {
    pub period: Period,
    pub vehicle_category: String,
    pub manufacturer: String,
    pub registrations: u64,
    pub market_share_percent: Option<Decimal>, // None when the category total is zero
}

/// Headline figures for the current filter selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub total_registrations: u64,
    pub active_manufacturers: usize,
    pub average_monthly_registrations: Option<Decimal>,
    pub latest_period: Option<Period>,
    pub latest_period_registrations: Option<u64>,
}

/// One point of a monthly registration series (a category or a manufacturer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: Period,
    pub series: String,
    pub registrations: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub vehicle_category: String,
    pub total: u64,
    /// Mean registrations per record, rounded to 2 decimal places.
    pub average: Decimal,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    pub state_name: String,
    pub total_registrations: u64,
}

/// The most recent defined growth value for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestGrowth {
    pub vehicle_category: String,
    /// Label of the period or quarter the value belongs to.
    pub as_of: String,
    pub growth_percent: Decimal,
}

/// A manufacturer ranked by its mean market share across periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLeader {
    pub vehicle_category: String,
    pub manufacturer: String,
    pub mean_share_percent: Decimal,
}
