use crate::DbError;
use chrono::NaiveDate;
use core_types::{Dimension, FilterSpec, Period, RegistrationRecord};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::{FromRow, QueryBuilder, Transaction};
use std::collections::{BTreeSet, HashMap};

/// The `DbRepository` provides a high-level, application-specific interface
/// to the registrations table. It encapsulates all SQL and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
}

/// Earliest and latest calendar days covered by the stored data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

/// Row counts of a committed import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub removed: u64,
    pub inserted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_records: u64,
    pub total_registrations: u64,
}

// This struct represents a row fetched from the vehicle_registrations table.
#[derive(FromRow, Debug, Clone)]
struct DbRegistration {
    year: i64,
    month: i64,
    vehicle_category: String,
    manufacturer: String,
    state_code: String,
    state_name: String,
    registrations: i64,
}

impl TryFrom<DbRegistration> for RegistrationRecord {
    type Error = DbError;

    fn try_from(row: DbRegistration) -> Result<Self, Self::Error> {
        let year = i32::try_from(row.year)
            .map_err(|_| DbError::InvalidRow(format!("year {} out of range", row.year)))?;
        let month = u32::try_from(row.month)
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| DbError::InvalidRow(format!("month {} out of range", row.month)))?;
        let registrations = u64::try_from(row.registrations).map_err(|_| {
            DbError::InvalidRow(format!("negative registrations {}", row.registrations))
        })?;
        Ok(RegistrationRecord {
            year,
            month,
            vehicle_category: row.vehicle_category,
            manufacturer: row.manufacturer,
            state_code: row.state_code,
            state_name: row.state_name,
            registrations,
        })
    }
}

/// Encodes a period as a single sortable integer, e.g. 2024-03 -> 202403.
fn period_key(period: Period) -> i64 {
    i64::from(period.year()) * 100 + i64::from(period.month())
}

fn period_from_key(key: i64) -> Result<Period, DbError> {
    let year = i32::try_from(key.div_euclid(100))
        .map_err(|_| DbError::InvalidRow(format!("period key {} out of range", key)))?;
    Period::new(year, key.rem_euclid(100) as u32).map_err(|e| DbError::InvalidRow(e.to_string()))
}

/// Appends `AND column IN (...)` for a non-empty restriction set.
fn push_in_filter<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    column: &'static str,
    values: &Option<BTreeSet<String>>,
) {
    let Some(values) = values.as_ref().filter(|v| !v.is_empty()) else {
        return;
    };
    builder.push(" AND ").push(column).push(" IN (");
    let mut separated = builder.separated(", ");
    for value in values {
        separated.push_bind(value.clone());
    }
    separated.push_unseparated(")");
}

async fn insert_rows(
    tx: &mut Transaction<'_, Sqlite>,
    records: &[RegistrationRecord],
) -> Result<u64, DbError> {
    for record in records {
        let registrations = i64::try_from(record.registrations).map_err(|_| {
            DbError::InvalidRecord(format!("registrations {} too large", record.registrations))
        })?;
        sqlx::query(
            r#"
            INSERT INTO vehicle_registrations (
                year, month, vehicle_category, manufacturer, state_code, state_name, registrations
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(i64::from(record.year))
        .bind(i64::from(record.month))
        .bind(&record.vehicle_category)
        .bind(&record.manufacturer)
        .bind(&record.state_code)
        .bind(&record.state_name)
        .bind(registrations)
        .execute(&mut **tx) // Note: must run on the transaction, not the pool
        .await?;
    }
    Ok(records.len() as u64)
}

const RECORD_COLUMNS: &str =
    "year, month, vehicle_category, manufacturer, state_code, state_name, registrations";

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetches the records matching `filter`, in display order.
    #[tracing::instrument(skip(self))]
    pub async fn get_filtered_records(
        &self,
        filter: &FilterSpec,
    ) -> Result<Vec<RegistrationRecord>, DbError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM vehicle_registrations WHERE 1 = 1",
            RECORD_COLUMNS
        ));

        let (start, end) = filter.period_bounds();
        if let Some(start) = start {
            builder.push(" AND (year * 100 + month) >= ").push_bind(period_key(start));
        }
        if let Some(end) = end {
            builder.push(" AND (year * 100 + month) <= ").push_bind(period_key(end));
        }
        push_in_filter(&mut builder, "vehicle_category", &filter.vehicle_categories);
        push_in_filter(&mut builder, "manufacturer", &filter.manufacturers);
        push_in_filter(&mut builder, "state_code", &filter.states);
        builder.push(" ORDER BY year, month, state_name, vehicle_category, manufacturer, id");

        let rows: Vec<DbRegistration> = builder.build_query_as().fetch_all(&self.pool).await?;
        let records = rows
            .into_iter()
            .map(RegistrationRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(rows = records.len(), "Loaded filtered registrations.");
        Ok(records)
    }

    /// Returns the first day of the earliest period and the last day of the latest one.
    pub async fn get_date_range(&self) -> Result<DateRange, DbError> {
        let (min_key, max_key): (Option<i64>, Option<i64>) = sqlx::query_as(
            "SELECT MIN(year * 100 + month), MAX(year * 100 + month) FROM vehicle_registrations",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DateRange {
            min_date: min_key.map(period_from_key).transpose()?.and_then(|p| p.first_day()),
            max_date: max_key.map(period_from_key).transpose()?.and_then(|p| p.last_day()),
        })
    }

    /// Sorted distinct values of one dimension.
    pub async fn get_unique_values(&self, dimension: Dimension) -> Result<Vec<String>, DbError> {
        // The column name comes from a fixed enum, never from user input.
        let column = dimension.column();
        let sql = format!(
            "SELECT DISTINCT {column} FROM vehicle_registrations ORDER BY {column}"
        );
        let values: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        Ok(values)
    }

    /// Maps state display names to their codes. Unknown names are dropped.
    pub async fn resolve_state_codes(&self, names: &[String]) -> Result<Vec<String>, DbError> {
        let pairs: Vec<(String, String)> =
            sqlx::query_as("SELECT DISTINCT state_name, state_code FROM vehicle_registrations")
                .fetch_all(&self.pool)
                .await?;
        let lookup: HashMap<String, String> = pairs.into_iter().collect();

        let codes: Vec<String> = names
            .iter()
            .filter_map(|name| lookup.get(name).cloned())
            .collect();
        if codes.len() < names.len() {
            tracing::warn!(
                requested = names.len(),
                resolved = codes.len(),
                "Some state names did not match any stored state."
            );
        }
        Ok(codes)
    }

    pub async fn get_summary_stats(&self) -> Result<SummaryStats, DbError> {
        let (total_records, total_registrations): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(registrations), 0) FROM vehicle_registrations",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(SummaryStats {
            total_records: total_records.max(0) as u64,
            total_registrations: total_registrations.max(0) as u64,
        })
    }

    /// Saves a batch of records within a single transaction for atomicity.
    #[tracing::instrument(skip(self, records), fields(count = records.len()))]
    pub async fn insert_records(&self, records: &[RegistrationRecord]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;
        let inserted = insert_rows(&mut tx, records).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    /// Loads a whole import in one transaction, optionally clearing the table first.
    ///
    /// `on_batch` is called with the size of each batch once it is written. Nothing
    /// is committed unless every batch succeeds, so a failed import leaves the
    /// table exactly as it was.
    #[tracing::instrument(skip(self, records, on_batch), fields(count = records.len()))]
    pub async fn import_records<F>(
        &self,
        records: &[RegistrationRecord],
        replace: bool,
        batch_size: usize,
        mut on_batch: F,
    ) -> Result<ImportSummary, DbError>
    where
        F: FnMut(usize),
    {
        let mut tx = self.pool.begin().await?;

        let removed = if replace {
            sqlx::query("DELETE FROM vehicle_registrations")
                .execute(&mut *tx)
                .await?
                .rows_affected()
        } else {
            0
        };

        let mut inserted = 0;
        for batch in records.chunks(batch_size.max(1)) {
            inserted += insert_rows(&mut tx, batch).await?;
            on_batch(batch.len());
        }

        tx.commit().await?;
        tracing::info!(removed, inserted, "Import committed.");
        Ok(ImportSummary { removed, inserted })
    }
}
