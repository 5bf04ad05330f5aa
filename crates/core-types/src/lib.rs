pub mod enums;
pub mod error;
pub mod filter;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::Dimension;
pub use error::CoreError;
pub use filter::FilterSpec;
pub use structs::{Period, Quarter, RawRecord, RegistrationRecord};
