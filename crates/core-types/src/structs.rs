use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of summed vehicle registrations for a year, month, category,
/// manufacturer, and state.
///
/// The field order is the column order of the CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub year: i32,
    pub month: u32,
    pub vehicle_category: String,
    pub manufacturer: String,
    pub state_code: String,
    pub state_name: String,
    pub registrations: u64,
}

impl RegistrationRecord {
    /// The chronological bucket this record falls into.
    ///
    /// No range check is done here; callers that need one validate `month` first.
    pub fn period(&self) -> Period {
        Period {
            year: self.year,
            month: self.month,
        }
    }
}

/// A loosely-typed registration row, as read from a CSV file or any other
/// source that has not been validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub vehicle_category: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub state_name: Option<String>,
    #[serde(default)]
    pub registrations: Option<String>,
}

fn required(field: &'static str, value: Option<String>) -> Result<String, CoreError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(CoreError::MissingField(field)),
    }
}

fn numeric<T: FromStr>(field: &'static str, value: Option<String>) -> Result<T, CoreError> {
    let raw = required(field, value)?;
    raw.parse::<T>()
        .map_err(|_| CoreError::InvalidInput(field, format!("'{}' is not a valid number", raw)))
}

impl TryFrom<RawRecord> for RegistrationRecord {
    type Error = CoreError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let year: i32 = numeric("year", raw.year)?;
        let month: u32 = numeric("month", raw.month)?;
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidInput(
                "month",
                format!("{} is outside 1..=12", month),
            ));
        }

        // Parse as signed first so a negative count gets a precise message.
        let registrations: i64 = numeric("registrations", raw.registrations)?;
        let registrations = u64::try_from(registrations).map_err(|_| {
            CoreError::InvalidInput(
                "registrations",
                format!("{} is negative", registrations),
            )
        })?;

        Ok(Self {
            year,
            month,
            vehicle_category: required("vehicle_category", raw.vehicle_category)?,
            manufacturer: required("manufacturer", raw.manufacturer)?,
            state_code: required("state_code", raw.state_code)?,
            state_name: required("state_name", raw.state_name)?,
            registrations,
        })
    }
}

/// A (year, month) point on the chronological axis.
///
/// Ordering is by year, then month. It never depends on the label format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidPeriod(format!("{}-{}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    fn index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn from_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// The period `months` months earlier, crossing year boundaries as needed.
    pub fn months_before(&self, months: u32) -> Self {
        Self::from_index(self.index() - i64::from(months))
    }

    pub fn quarter(&self) -> Quarter {
        Quarter {
            year: self.year,
            quarter: (self.month - 1) / 3 + 1,
        }
    }

    /// The first calendar day of this period.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// The last calendar day of this period.
    pub fn last_day(&self) -> Option<NaiveDate> {
        let next = Self::from_index(self.index() + 1);
        next.first_day()?.pred_opt()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidPeriod(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Period::new(year, month).map_err(|_| invalid())
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A calendar quarter: Q1 is January to March, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Quarter {
    year: i32,
    quarter: u32,
}

impl Quarter {
    pub fn new(year: i32, quarter: u32) -> Result<Self, CoreError> {
        if !(1..=4).contains(&quarter) {
            return Err(CoreError::InvalidQuarter(format!("{}-Q{}", year, quarter)));
        }
        Ok(Self { year, quarter })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u32 {
        self.quarter
    }

    /// The immediately preceding calendar quarter (Q1 rolls back to Q4 of the prior year).
    pub fn previous(&self) -> Self {
        if self.quarter == 1 {
            Self {
                year: self.year - 1,
                quarter: 4,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter - 1,
            }
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-Q{}", self.year, self.quarter)
    }
}

impl FromStr for Quarter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidQuarter(s.to_string());
        let (year, quarter) = s.split_once("-Q").ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let quarter = quarter.parse::<u32>().map_err(|_| invalid())?;
        Quarter::new(year, quarter).map_err(|_| invalid())
    }
}

impl From<Quarter> for String {
    fn from(quarter: Quarter) -> Self {
        quarter.to_string()
    }
}

impl TryFrom<String> for Quarter {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
