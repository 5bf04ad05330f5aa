//! # Registration Database Crate
//!
//! This crate is the data source of the dashboard: a thin, application-specific
//! interface to the local SQLite file holding the `vehicle_registrations` table.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the application sees typed
//!   `RegistrationRecord`s and an immutable `FilterSpec`, never rows or columns.
//! - **Explicit filters:** Every query takes its filter as an argument. There is no
//!   session or global selection state.
//! - **Asynchronous & Pooled:** All operations are async over an `SqlitePool`.
//!
//! ## Public API
//!
//! - `connect` / `connect_in_memory`: open the connection pool.
//! - `run_migrations`: apply the embedded schema.
//! - `DbRepository`: filtered loads, filter-panel lookups, and transactional imports.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, connect_in_memory, run_migrations};
pub use error::DbError;
pub use repository::{DateRange, DbRepository, ImportSummary, SummaryStats};
