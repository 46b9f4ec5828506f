//! Error types for driver operations.
//!
//! Provides a unified error type covering database access, value
//! conversion, registration, migration, and configuration failures.

use sqlite_driver_core::{ValidationError, ValueError};
use thiserror::Error;

/// Errors that can occur while opening a driver or running an operation.
#[derive(Debug, Error)]
pub enum DriverError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// A typed operation named a record type that was never registered.
    #[error("table not registered for record type {0}")]
    TableNotRegistered(&'static str),

    /// Two declarations map to the same table or record type.
    #[error("table '{0}' is declared more than once")]
    DuplicateTable(String),

    /// A record declaration failed validation.
    #[error("invalid record for table '{table}': {}", format_validation(.errors))]
    InvalidRecord {
        /// Declared table name.
        table: String,
        /// Every problem found.
        errors: Vec<ValidationError>,
    },

    /// A filter or update referenced a column the table does not map.
    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Requested column.
        column: String,
    },

    /// A stored cell could not be decoded under its column's category.
    #[error("conversion error: {0}")]
    ConversionError(String),

    /// A mapped column has no matching field on the record type.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Creating or altering a table failed.
    #[error("migration error on table '{table}': {source}")]
    MigrationError {
        /// Table being migrated.
        table: String,
        /// Underlying database error.
        #[source]
        source: rusqlite::Error,
    },

    /// Field value conversion failure.
    #[error("value error: {0}")]
    ValueError(#[from] ValueError),

    /// Configuration file could not be parsed or written.
    #[error("config error: {0}")]
    ConfigError(#[from] serde_yaml::Error),

    /// Configuration file could not be read or written.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`DriverError`].
pub type Result<T> = std::result::Result<T, DriverError>;
