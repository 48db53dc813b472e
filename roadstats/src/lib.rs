//! # Roadstats - road length per country, from SQLite to JSON
//!
//! Reads the per-country table of a road statistics database and writes a
//! JSON report of road length by class, with a computed total per country.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   SQLite    │────▶│   Schema    │────▶│  Aggregate  │────▶│ JSON report │
//! │ countrydata │     │  (classes)  │     │ (+ totals)  │     │ (per code)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roadstats::{run, ReportConfig};
//!
//! let mut config = ReportConfig::default();
//! config.source.database = Some("statistics.sqlite".into());
//! let summary = run(&config).unwrap();
//! println!("Wrote {} countries", summary.countries);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Defaults, environment overrides, policies
//! - [`store`] - Read-only SQLite access
//! - [`schema`] - Road class discovery
//! - [`aggregate`] - Per-country records and totals
//! - [`report`] - Report construction, JSON layout, output
//! - [`pipeline`] - End-to-end runs

// Core modules
pub mod config;
pub mod error;

// Storage
pub mod store;

// Core logic
pub mod aggregate;
pub mod report;
pub mod schema;

// Orchestration
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AggregationError, ConnectionError, ReportError, SchemaError, StatsError, StatsResult,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{DuplicatePolicy, OutputTarget, ParsePolicy, ReportConfig, SourceConfig};

// =============================================================================
// Re-exports - Core
// =============================================================================

pub use aggregate::{aggregate, read_countries, Aggregation, CountryRecord, ParseDegradation};
pub use report::{build_report, format_value, serialize, write_report, CountryEntry, Report};
pub use schema::{derive_class_labels, introspect, ClassLabels, TOTAL_LABEL};
pub use store::{CellValue, QueryResult, Row, StatsStore};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{
    generate_from_store, generate_report, list_classes, run, ReportOutcome, RunSummary,
};
