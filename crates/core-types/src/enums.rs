use serde::{Deserialize, Serialize};

/// A filterable column of the registration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    VehicleCategory,
    Manufacturer,
    StateCode,
    StateName,
}

impl Dimension {
    /// The column name backing this dimension in storage and CSV headers.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::VehicleCategory => "vehicle_category",
            Dimension::Manufacturer => "manufacturer",
            Dimension::StateCode => "state_code",
            Dimension::StateName => "state_name",
        }
    }
}
