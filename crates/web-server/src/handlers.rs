use crate::{error::AppError, AppState};
use analytics::{
    detail_table, export, latest_market_share, latest_qoq_by_category, latest_yoy_by_category,
    leader_share_trends, leading_manufacturers, CategorySummary, KeyMetrics, LatestGrowth,
    MarketShareRow, QoQGrowthRow, ShareLeader, StateSummary, TrendPoint, YoYGrowthRow,
};
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use core_types::{Dimension, FilterSpec, RegistrationRecord};
use database::DateRange;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Filter selections as they arrive on the query string.
///
/// List parameters are comma-separated; `states` holds display names.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub categories: Option<String>,
    pub manufacturers: Option<String>,
    pub states: Option<String>,
    pub search: Option<String>,
}

pub(crate) fn split_list(value: &Option<String>) -> Vec<String> {
    value
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Turns the query string into a `FilterSpec` plus the state names still to resolve.
pub(crate) fn filter_from_query(query: &FilterQuery) -> Result<(FilterSpec, Vec<String>), AppError> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(AppError::BadRequest(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }
    }
    let filter = FilterSpec::all()
        .with_date_range(query.start_date, query.end_date)
        .with_categories(split_list(&query.categories))
        .with_manufacturers(split_list(&query.manufacturers));
    Ok((filter, split_list(&query.states)))
}

/// Loads the records selected by the query, after checking the database has data at all.
async fn load_records(state: &AppState, query: &FilterQuery) -> Result<Vec<RegistrationRecord>, AppError> {
    let stats = state.db_repo.get_summary_stats().await?;
    if stats.total_records == 0 {
        return Err(AppError::NoData);
    }

    let (filter, state_names) = filter_from_query(query)?;
    let filter = if state_names.is_empty() {
        filter
    } else {
        let codes = state.db_repo.resolve_state_codes(&state_names).await?;
        if codes.is_empty() {
            // Every requested state is unknown, so nothing can match.
            return Ok(Vec::new());
        }
        filter.with_states(codes)
    };

    Ok(state.db_repo.get_filtered_records(&filter).await?)
}

/// # GET /api/health
pub async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DefaultSelection {
    pub vehicle_categories: Vec<String>,
    pub manufacturers: Vec<String>,
    pub states: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterOptions {
    pub date_range: DateRange,
    pub vehicle_categories: Vec<String>,
    pub manufacturers: Vec<String>,
    pub states: Vec<String>,
    pub defaults: DefaultSelection,
}

/// # GET /api/filters
/// Everything the filter panel needs: available values and the preselection.
pub async fn get_filter_options(State(state): State<Arc<AppState>>) -> Result<Json<FilterOptions>, AppError> {
    let repo = &state.db_repo;
    let date_range = repo.get_date_range().await?;
    let vehicle_categories = repo.get_unique_values(Dimension::VehicleCategory).await?;
    let manufacturers = repo.get_unique_values(Dimension::Manufacturer).await?;
    let states = repo.get_unique_values(Dimension::StateName).await?;

    let defaults = DefaultSelection {
        vehicle_categories: vehicle_categories.clone(),
        manufacturers: manufacturers
            .iter()
            .take(state.dashboard.default_manufacturers)
            .cloned()
            .collect(),
        states: states.iter().take(state.dashboard.default_states).cloned().collect(),
    };

    Ok(Json(FilterOptions {
        date_range,
        vehicle_categories,
        manufacturers,
        states,
        defaults,
    }))
}

/// # GET /api/metrics/summary
pub async fn get_key_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<KeyMetrics>, AppError> {
    let records = load_records(&state, &query).await?;
    Ok(Json(state.deriver.key_metrics(&records)?))
}

/// # GET /api/metrics/yoy
pub async fn get_yoy_growth(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<YoYGrowthRow>>, AppError> {
    let records = load_records(&state, &query).await?;
    Ok(Json(state.deriver.calculate_yoy_growth(&records)?))
}

/// # GET /api/metrics/qoq
pub async fn get_qoq_growth(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<QoQGrowthRow>>, AppError> {
    let records = load_records(&state, &query).await?;
    Ok(Json(state.deriver.calculate_qoq_growth(&records)?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LatestGrowthResponse {
    pub yoy: Vec<LatestGrowth>,
    pub qoq: Vec<LatestGrowth>,
}

/// # GET /api/metrics/growth/latest
/// The most recent defined YoY and QoQ rate per category.
pub async fn get_latest_growth(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<LatestGrowthResponse>, AppError> {
    let records = load_records(&state, &query).await?;
    let yoy = state.deriver.calculate_yoy_growth(&records)?;
    let qoq = state.deriver.calculate_qoq_growth(&records)?;
    Ok(Json(LatestGrowthResponse {
        yoy: latest_yoy_by_category(&yoy),
        qoq: latest_qoq_by_category(&qoq),
    }))
}

/// # GET /api/metrics/market-share
pub async fn get_market_share(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<MarketShareRow>>, AppError> {
    let records = load_records(&state, &query).await?;
    Ok(Json(state.deriver.calculate_market_share(&records)?))
}

/// # GET /api/metrics/market-share/latest
pub async fn get_latest_market_share(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<MarketShareRow>>, AppError> {
    let records = load_records(&state, &query).await?;
    let rows = state.deriver.calculate_market_share(&records)?;
    Ok(Json(latest_market_share(&rows, state.dashboard.market_share_top_n)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareLeadersResponse {
    pub leaders: Vec<ShareLeader>,
    pub trends: Vec<MarketShareRow>,
}

/// # GET /api/metrics/market-share/leaders
pub async fn get_share_leaders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ShareLeadersResponse>, AppError> {
    let records = load_records(&state, &query).await?;
    let rows = state.deriver.calculate_market_share(&records)?;
    let leaders = leading_manufacturers(&rows, state.dashboard.trend_top_n);
    let trends = leader_share_trends(&rows, &leaders);
    Ok(Json(ShareLeadersResponse { leaders, trends }))
}

/// # GET /api/trends/categories
pub async fn get_category_trends(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<TrendPoint>>, AppError> {
    let records = load_records(&state, &query).await?;
    Ok(Json(state.deriver.category_trends(&records)?))
}

/// # GET /api/trends/manufacturers
pub async fn get_manufacturer_trends(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<TrendPoint>>, AppError> {
    let records = load_records(&state, &query).await?;
    Ok(Json(
        state
            .deriver
            .manufacturer_trends(&records, state.dashboard.top_manufacturers)?,
    ))
}

/// # GET /api/summary/categories
pub async fn get_category_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<CategorySummary>>, AppError> {
    let records = load_records(&state, &query).await?;
    Ok(Json(state.deriver.category_summary(&records)?))
}

/// # GET /api/summary/states
pub async fn get_state_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<StateSummary>>, AppError> {
    let records = load_records(&state, &query).await?;
    Ok(Json(state.deriver.state_summary(&records, state.dashboard.top_states)))
}

/// # GET /api/records
/// The searchable detail table.
pub async fn get_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<RegistrationRecord>>, AppError> {
    let records = load_records(&state, &query).await?;
    Ok(Json(detail_table(&records, query.search.as_deref())))
}

/// # GET /api/records/export
/// The detail table as a CSV download.
pub async fn export_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let records = load_records(&state, &query).await?;
    let rows = detail_table(&records, query.search.as_deref());
    let body = export::to_csv_string(&rows)?;
    let file_name = export::export_file_name(Utc::now().date_naive());
    tracing::info!(rows = rows.len(), file = %file_name, "Exported registrations.");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    ))
}
