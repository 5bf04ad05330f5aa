use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidInput(&'static str, String),

    #[error("Invalid period '{0}': expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("Invalid quarter '{0}': expected YYYY-Qn")]
    InvalidQuarter(String),
}
