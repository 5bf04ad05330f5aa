use analytics::{validate_records, AnalyticsError, MetricsDeriver};
use core_types::{CoreError, Period, RawRecord, RegistrationRecord};
use rust_decimal_macros::dec;

fn record(year: i32, month: u32, category: &str, manufacturer: &str, registrations: u64) -> RegistrationRecord {
    RegistrationRecord {
        year,
        month,
        vehicle_category: category.to_string(),
        manufacturer: manufacturer.to_string(),
        state_code: "MH".to_string(),
        state_name: "Maharashtra".to_string(),
        registrations,
    }
}

#[test]
fn two_equal_manufacturers_split_the_market_evenly() {
    let records = vec![record(2023, 1, "Car", "Acme", 500), record(2023, 1, "Car", "Beta", 500)];
    let rows = MetricsDeriver::new().calculate_market_share(&records).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].manufacturer, "Acme");
    assert_eq!(rows[1].manufacturer, "Beta");
    for row in &rows {
        assert_eq!(row.market_share_percent, Some(dec!(50.0)));
    }
}

#[test]
fn yoy_growth_compares_with_the_same_month_last_year() {
    let records = vec![record(2023, 1, "Car", "Acme", 100), record(2024, 1, "Car", "Acme", 150)];
    let rows = MetricsDeriver::new().calculate_yoy_growth(&records).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].period, Period::new(2023, 1).unwrap());
    assert_eq!(rows[0].yoy_growth_percent, None);
    assert_eq!(rows[1].period, Period::new(2024, 1).unwrap());
    assert_eq!(rows[1].vehicle_category, "Car");
    assert_eq!(rows[1].yoy_growth_percent, Some(dec!(50.0)));
}

#[test]
fn yoy_growth_is_undefined_against_a_zero_prior_year() {
    let records = vec![record(2023, 6, "Bus", "Acme", 0), record(2024, 6, "Bus", "Acme", 10)];
    let rows = MetricsDeriver::new().calculate_yoy_growth(&records).unwrap();
    assert!(rows.iter().all(|r| r.yoy_growth_percent.is_none()));
}

#[test]
fn a_zero_total_category_gets_no_defined_share() {
    let records = vec![
        record(2024, 2, "Tractor", "Acme", 0),
        record(2024, 2, "Tractor", "Beta", 0),
        record(2024, 2, "Car", "Acme", 10),
    ];
    let rows = MetricsDeriver::new().calculate_market_share(&records).unwrap();

    let tractor: Vec<_> = rows.iter().filter(|r| r.vehicle_category == "Tractor").collect();
    assert_eq!(tractor.len(), 2);
    assert!(tractor.iter().all(|r| r.market_share_percent.is_none()));

    let car: Vec<_> = rows.iter().filter(|r| r.vehicle_category == "Car").collect();
    assert_eq!(car[0].market_share_percent, Some(dec!(100)));
}

#[test]
fn growth_crosses_the_year_boundary() {
    let records = vec![
        record(2022, 12, "Car", "Acme", 200),
        record(2023, 12, "Car", "Acme", 150),
        record(2023, 10, "Car", "Acme", 100),
    ];
    let deriver = MetricsDeriver::new();

    let yoy = deriver.calculate_yoy_growth(&records).unwrap();
    let dec_2023 = yoy
        .iter()
        .find(|r| r.period == Period::new(2023, 12).unwrap())
        .unwrap();
    assert_eq!(dec_2023.yoy_growth_percent, Some(dec!(-25)));

    let qoq = deriver.calculate_qoq_growth(&records).unwrap();
    assert_eq!(qoq.len(), 2);
    assert_eq!(qoq[0].quarter.to_string(), "2022-Q4");
    assert_eq!(qoq[1].quarter.to_string(), "2023-Q4");
    assert_eq!(qoq[1].registrations, 250);
    assert_eq!(qoq[1].qoq_growth_percent, None);
}

#[test]
fn raw_rows_with_bad_values_are_rejected_with_their_position() {
    let good = RawRecord {
        year: Some("2024".into()),
        month: Some("1".into()),
        vehicle_category: Some("Car".into()),
        manufacturer: Some("Acme".into()),
        state_code: Some("MH".into()),
        state_name: Some("Maharashtra".into()),
        registrations: Some("7".into()),
    };
    let bad = RawRecord {
        registrations: Some("seven".into()),
        ..good.clone()
    };

    let records = validate_records(vec![good.clone()]).unwrap();
    assert_eq!(records[0].registrations, 7);

    let err = validate_records(vec![good, bad]).unwrap_err();
    match err {
        AnalyticsError::InvalidRecord { row, source } => {
            assert_eq!(row, 1);
            assert!(matches!(source, CoreError::InvalidInput("registrations", _)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn derived_rows_serialize_undefined_values_as_null() {
    let records = vec![record(2024, 1, "Car", "Acme", 10)];
    let rows = MetricsDeriver::new().calculate_yoy_growth(&records).unwrap();
    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(json[0]["period"], "2024-01");
    assert!(json[0]["yoy_growth_percent"].is_null());
}
