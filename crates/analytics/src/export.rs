use crate::error::ExportError;
use chrono::NaiveDate;
use core_types::{RawRecord, RegistrationRecord};
use std::io::{Read, Write};

/// Column header of the raw-record CSV format, in field order.
pub const CSV_HEADER: [&str; 7] = [
    "year",
    "month",
    "vehicle_category",
    "manufacturer",
    "state_code",
    "state_name",
    "registrations",
];

/// Writes records as UTF-8 CSV with a header row, one record per line.
///
/// The header is written even when there are no records.
pub fn write_csv<W: Write>(writer: W, records: &[RegistrationRecord]) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_csv_string(records: &[RegistrationRecord]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, records)?;
    Ok(String::from_utf8(buf)?)
}

/// Reads CSV in the export format, validating every row.
///
/// Leading and trailing whitespace is trimmed from every field, so a value
/// exported with surrounding spaces does not read back byte-for-byte.
/// Row numbers in errors are 1-based and do not count the header.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RegistrationRecord>, ExportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, raw) in rdr.deserialize::<RawRecord>().enumerate() {
        let raw = raw?;
        let record = RegistrationRecord::try_from(raw)
            .map_err(|source| ExportError::InvalidRow { row: index + 1, source })?;
        records.push(record);
    }
    Ok(records)
}

/// File name offered for a download made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("vehicle_registrations_{}.csv", date.format("%Y%m%d"))
}
