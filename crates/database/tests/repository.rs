use chrono::NaiveDate;
use core_types::{Dimension, FilterSpec, RegistrationRecord};
use database::{connect_in_memory, run_migrations, DateRange, DbError, DbRepository, ImportSummary};

fn record(year: i32, month: u32, category: &str, manufacturer: &str, state: (&str, &str), registrations: u64) -> RegistrationRecord {
    RegistrationRecord {
        year,
        month,
        vehicle_category: category.to_string(),
        manufacturer: manufacturer.to_string(),
        state_code: state.0.to_string(),
        state_name: state.1.to_string(),
        registrations,
    }
}

const KA: (&str, &str) = ("KA", "Karnataka");
const MH: (&str, &str) = ("MH", "Maharashtra");

fn sample() -> Vec<RegistrationRecord> {
    vec![
        record(2023, 11, "Car", "Acme", KA, 100),
        record(2023, 12, "Car", "Beta", MH, 50),
        record(2024, 1, "Truck", "Acme", KA, 30),
        record(2024, 2, "Car", "Acme", MH, 70),
        record(2024, 2, "Two Wheeler", "Gamma", KA, 400),
    ]
}

async fn seeded_repo() -> DbRepository {
    let pool = connect_in_memory().await.unwrap();
    run_migrations(&pool).await.unwrap();
    let repo = DbRepository::new(pool);
    repo.insert_records(&sample()).await.unwrap();
    repo
}

#[tokio::test]
async fn unrestricted_filter_returns_everything_in_display_order() {
    let repo = seeded_repo().await;
    let records = repo.get_filtered_records(&FilterSpec::all()).await.unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].period().to_string(), "2023-11");
    assert_eq!(records[4].period().to_string(), "2024-02");
    // Same period: Karnataka sorts before Maharashtra.
    assert_eq!(records[3].state_name, "Karnataka");
}

#[tokio::test]
async fn sql_filter_agrees_with_in_memory_filter() {
    let repo = seeded_repo().await;
    let filters = vec![
        FilterSpec::all().with_date_range(NaiveDate::from_ymd_opt(2023, 12, 20), None),
        FilterSpec::all().with_date_range(None, NaiveDate::from_ymd_opt(2024, 1, 1)),
        FilterSpec::all().with_categories(["Car"]).with_states(["MH"]),
        FilterSpec::all().with_manufacturers(["Acme", "Gamma"]).with_date_range(
            NaiveDate::from_ymd_opt(2024, 1, 1),
            NaiveDate::from_ymd_opt(2024, 2, 29),
        ),
        FilterSpec::all().with_categories(["Bus"]),
    ];

    for filter in filters {
        let from_db = repo.get_filtered_records(&filter).await.unwrap();
        let mut in_memory = filter.apply(&sample());
        analytics_order(&mut in_memory);
        assert_eq!(from_db, in_memory, "filter {:?}", filter);
    }
}

fn analytics_order(records: &mut [RegistrationRecord]) {
    records.sort_by(|a, b| {
        a.period()
            .cmp(&b.period())
            .then_with(|| a.state_name.cmp(&b.state_name))
            .then_with(|| a.vehicle_category.cmp(&b.vehicle_category))
            .then_with(|| a.manufacturer.cmp(&b.manufacturer))
    });
}

#[tokio::test]
async fn date_range_spans_whole_months() {
    let repo = seeded_repo().await;
    let range = repo.get_date_range().await.unwrap();
    assert_eq!(range.min_date, NaiveDate::from_ymd_opt(2023, 11, 1));
    assert_eq!(range.max_date, NaiveDate::from_ymd_opt(2024, 2, 29));
}

#[tokio::test]
async fn empty_database_reports_no_data() {
    let pool = connect_in_memory().await.unwrap();
    run_migrations(&pool).await.unwrap();
    let repo = DbRepository::new(pool);

    assert_eq!(repo.get_date_range().await.unwrap(), DateRange::default());
    let stats = repo.get_summary_stats().await.unwrap();
    assert_eq!(stats.total_records, 0);
    assert_eq!(stats.total_registrations, 0);
    assert!(repo.get_filtered_records(&FilterSpec::all()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unique_values_are_sorted_and_distinct() {
    let repo = seeded_repo().await;
    assert_eq!(
        repo.get_unique_values(Dimension::VehicleCategory).await.unwrap(),
        vec!["Car", "Truck", "Two Wheeler"]
    );
    assert_eq!(
        repo.get_unique_values(Dimension::StateName).await.unwrap(),
        vec!["Karnataka", "Maharashtra"]
    );
}

#[tokio::test]
async fn state_names_resolve_to_codes() {
    let repo = seeded_repo().await;
    let codes = repo
        .resolve_state_codes(&["Maharashtra".to_string(), "Atlantis".to_string()])
        .await
        .unwrap();
    assert_eq!(codes, vec!["MH"]);
}

#[tokio::test]
async fn summary_counts_rows_and_registrations() {
    let repo = seeded_repo().await;
    let stats = repo.get_summary_stats().await.unwrap();
    assert_eq!(stats.total_records, 5);
    assert_eq!(stats.total_registrations, 650);
}

#[tokio::test]
async fn import_with_replace_swaps_the_table_contents() {
    let repo = seeded_repo().await;
    let incoming = vec![
        record(2024, 3, "Car", "Acme", KA, 10),
        record(2024, 3, "Car", "Beta", KA, 20),
        record(2024, 4, "Car", "Acme", MH, 30),
    ];

    let mut batches = Vec::new();
    let summary = repo
        .import_records(&incoming, true, 2, |n| batches.push(n))
        .await
        .unwrap();

    assert_eq!(summary, ImportSummary { removed: 5, inserted: 3 });
    assert_eq!(batches, vec![2, 1]);
    let stats = repo.get_summary_stats().await.unwrap();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.total_registrations, 60);
}

#[tokio::test]
async fn failed_import_leaves_the_table_untouched() {
    let repo = seeded_repo().await;
    let incoming = vec![
        record(2024, 3, "Car", "Acme", KA, 10),
        record(2024, 3, "Car", "Beta", KA, 20),
        // Too large for an SQLite INTEGER, rejected in the second batch.
        record(2024, 4, "Car", "Acme", MH, u64::MAX),
    ];

    let result = repo.import_records(&incoming, true, 2, |_| {}).await;
    assert!(matches!(result, Err(DbError::InvalidRecord(_))));

    let stats = repo.get_summary_stats().await.unwrap();
    assert_eq!(stats.total_records, 5);
    assert_eq!(stats.total_registrations, 650);
}
