//! # Registration Analytics
//!
//! This crate turns raw vehicle-registration records into the derived tables
//! the dashboard charts: year-over-year growth, quarter-over-quarter growth,
//! and manufacturer market share, plus a handful of summary views.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No knowledge of storage or HTTP. It depends only on `core-types`.
//! - **Stateless Calculation:** `MetricsDeriver` takes a slice of records and returns
//!   freshly allocated rows. The same input always yields the same output.
//! - **Undefined, not zero:** A growth rate or share that cannot be computed is `None`
//!   on an otherwise valid row. Only malformed input is an error.
//!
//! ## Public API
//!
//! - `MetricsDeriver`: the calculator.
//! - `YoYGrowthRow`, `QoQGrowthRow`, `MarketShareRow` and the summary rows in `report`.
//! - `export`: the CSV format for raw records.
//! - `AnalyticsError`, `ExportError`.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod export;
pub mod report;
pub mod summary;
pub mod table;

use core_types::{RawRecord, RegistrationRecord};

// Re-export the key components to create a clean, public-facing API.
pub use engine::MetricsDeriver;
pub use error::{AnalyticsError, ExportError};
pub use report::{
    CategorySummary, KeyMetrics, LatestGrowth, MarketShareRow, QoQGrowthRow, ShareLeader,
    StateSummary, TrendPoint, YoYGrowthRow,
};
pub use summary::{
    latest_market_share, latest_qoq_by_category, latest_yoy_by_category, leader_share_trends,
    leading_manufacturers,
};
pub use table::{detail_table, search_records, sort_for_display};

/// Converts loosely-typed rows into records, stopping at the first bad row.
pub fn validate_records(raw: Vec<RawRecord>) -> Result<Vec<RegistrationRecord>, AnalyticsError> {
    raw.into_iter()
        .enumerate()
        .map(|(row, r)| {
            RegistrationRecord::try_from(r).map_err(|source| AnalyticsError::InvalidRecord { row, source })
        })
        .collect()
}
