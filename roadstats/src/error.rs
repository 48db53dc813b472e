//! Error types for the road statistics report.
//!
//! One enum per stage of the run, plus a top-level [`StatsError`]:
//!
//! - [`ConnectionError`] - Opening or closing the statistics database
//! - [`SchemaError`] - Discovering the road class columns
//! - [`AggregationError`] - Reading and parsing the per-country rows
//! - [`ReportError`] - Building and writing the JSON report
//! - [`StatsError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Connection Errors
// =============================================================================

/// Errors while acquiring or releasing the database connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The database file could not be opened.
    #[error("Opening DB '{}' failed: {message}", path.display())]
    Open { path: PathBuf, message: String },

    /// The engine refused to close the connection.
    #[error("Closing DB failed: {0}")]
    Close(String),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors while deriving the road class labels.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema query could not run. Carries the engine message verbatim.
    #[error("SQL error: {0}")]
    QueryFailed(String),

    /// The query returned no columns at all.
    #[error("Table '{0}' returned no columns")]
    NoColumns(String),

    /// The first column is not the configured country code column.
    #[error("Expected key column '{expected}' first, found '{found}'")]
    KeyColumnMismatch { expected: String, found: String },

    /// A class column uses the name of the synthetic sum label.
    #[error("Column '{0}' clashes with the computed total; rename it in the source table")]
    ReservedColumn(String),
}

// =============================================================================
// Aggregation Errors
// =============================================================================

/// Errors while turning rows into country records.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// The data query could not run. Carries the engine message verbatim.
    #[error("SQL error: {0}")]
    QueryFailed(String),

    /// A row does not carry one value per road class.
    #[error("Row {row} ({country}): expected {expected} class values, found {found}")]
    FieldCount {
        row: usize,
        country: String,
        expected: usize,
        found: usize,
    },

    /// A class value is not a finite number.
    #[error("Row {row} ({country}), column '{column}' (value '{value}'): not a number")]
    InvalidValue {
        row: usize,
        country: String,
        column: String,
        value: String,
    },
}

// =============================================================================
// Report Errors
// =============================================================================

/// Errors while building or writing the report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The same country code appeared twice and duplicates are rejected.
    #[error("Duplicate country code '{code}' (entries {first} and {second})")]
    DuplicateCountry {
        code: String,
        first: usize,
        second: usize,
    },

    /// Failed to write the document.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Top-level Errors
// =============================================================================

/// Top-level errors returned by [`crate::pipeline`].
///
/// Every variant is fatal: the run stops and no report is written.
#[derive(Debug, Error)]
pub enum StatsError {
    /// No input database was given.
    #[error("No input file specified. Usage: roadstats report statistics.sqlite")]
    Usage,

    /// Invalid configuration value.
    #[error("Invalid configuration for {key}: '{value}'")]
    Config { key: String, value: String },

    /// Connection error.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Schema error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Aggregation error.
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    /// Report error.
    #[error(transparent)]
    Report(#[from] ReportError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for aggregation operations.
pub type AggregationResult<T> = Result<T, AggregationError>;

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for whole runs.
pub type StatsResult<T> = Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let schema_err = SchemaError::QueryFailed("no such table: countrydata".into());
        let stats_err: StatsError = schema_err.into();
        assert_eq!(stats_err.to_string(), "SQL error: no such table: countrydata");

        let report_err = ReportError::DuplicateCountry {
            code: "US".into(),
            first: 1,
            second: 3,
        };
        let stats_err: StatsError = report_err.into();
        assert!(stats_err.to_string().contains("'US'"));
    }

    #[test]
    fn test_reserved_column_format() {
        let err = SchemaError::ReservedColumn("total".into());
        assert!(err.to_string().contains("Column 'total'"));
    }

    #[test]
    fn test_invalid_value_format() {
        let err = AggregationError::InvalidValue {
            row: 4,
            country: "FR".into(),
            column: "motorway".into(),
            value: "abc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 4"));
        assert!(msg.contains("column 'motorway'"));
        assert!(msg.contains("value 'abc'"));
    }

    #[test]
    fn test_open_error_names_path() {
        let err = ConnectionError::Open {
            path: PathBuf::from("/tmp/missing.sqlite"),
            message: "unable to open database file".into(),
        };
        assert_eq!(
            err.to_string(),
            "Opening DB '/tmp/missing.sqlite' failed: unable to open database file"
        );
    }
}
