use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid record at row {row}: {source}")]
    InvalidRecord {
        row: usize,
        #[source]
        source: CoreError,
    },

    #[error("Validation failed at row {row}: {reason}")]
    Validation { row: usize, reason: String },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error while writing CSV: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid CSV row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: CoreError,
    },
}
