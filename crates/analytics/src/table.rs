use core_types::RegistrationRecord;

/// Case-insensitive substring match over manufacturer, state name, and category.
///
/// A blank term matches everything.
pub fn search_records(records: &[RegistrationRecord], term: &str) -> Vec<RegistrationRecord> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| {
            r.manufacturer.to_lowercase().contains(&needle)
                || r.state_name.to_lowercase().contains(&needle)
                || r.vehicle_category.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Sorts rows the way the detail table shows them: period, state, category, manufacturer.
pub fn sort_for_display(records: &mut [RegistrationRecord]) {
    records.sort_by(|a, b| {
        a.period()
            .cmp(&b.period())
            .then_with(|| a.state_name.cmp(&b.state_name))
            .then_with(|| a.vehicle_category.cmp(&b.vehicle_category))
            .then_with(|| a.manufacturer.cmp(&b.manufacturer))
    });
}

/// Search plus display ordering in one step.
pub fn detail_table(records: &[RegistrationRecord], search: Option<&str>) -> Vec<RegistrationRecord> {
    let mut rows = match search {
        Some(term) => search_records(records, term),
        None => records.to_vec(),
    };
    sort_for_display(&mut rows);
    rows
}
