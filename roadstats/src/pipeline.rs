//! High-level API: database in, report out.
//!
//! # Example
//!
//! ```rust,ignore
//! use roadstats::{run, ReportConfig};
//!
//! let mut config = ReportConfig::from_env()?;
//! config.source.database = Some("statistics.sqlite".into());
//! let summary = run(&config)?;
//! println!("{} countries", summary.countries);
//! ```
//!
//! The store is opened once and closed on every path out of the read /
//! aggregate / serialize sequence. The report is written only after that
//! sequence succeeded.

use serde::Serialize;
use tracing::info;

use crate::aggregate::{read_countries, ParseDegradation};
use crate::config::{ReportConfig, SourceConfig};
use crate::error::StatsResult;
use crate::report::{build_report, write_report, Report};
use crate::schema::{introspect, ClassLabels};
use crate::store::StatsStore;

/// Everything a run produced, before writing
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub labels: ClassLabels,
    pub report: Report,
    /// Rendered JSON document (no trailing newline)
    pub document: String,
    /// Country rows aggregated (duplicates included)
    pub rows_aggregated: usize,
    /// Rows without a country code
    pub skipped_rows: usize,
    pub degradations: Vec<ParseDegradation>,
}

/// What a run did, for the user and for logs
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub classes: ClassLabels,
    pub rows_aggregated: usize,
    pub countries: usize,
    pub skipped_rows: usize,
    pub duplicates: usize,
    pub degradations: Vec<ParseDegradation>,
    pub output: String,
}

impl ReportOutcome {
    fn summary(&self, output: String) -> RunSummary {
        RunSummary {
            classes: self.labels.clone(),
            rows_aggregated: self.rows_aggregated,
            countries: self.report.len(),
            skipped_rows: self.skipped_rows,
            duplicates: self.report.duplicates,
            degradations: self.degradations.clone(),
            output,
        }
    }
}

/// Build the report and write it to the configured output.
pub fn run(config: &ReportConfig) -> StatsResult<RunSummary> {
    let outcome = generate_report(config)?;
    write_report(&outcome.document, &config.output)?;
    Ok(outcome.summary(config.output.to_string()))
}

/// Open the configured database, build the report, close the database.
pub fn generate_report(config: &ReportConfig) -> StatsResult<ReportOutcome> {
    let store = StatsStore::open(config.source.require_database()?)?;
    let result = generate_from_store(&store, config);
    let closed = store.close();

    let outcome = result?;
    closed?;
    Ok(outcome)
}

/// Build the report from an already open store.
pub fn generate_from_store(store: &StatsStore, config: &ReportConfig) -> StatsResult<ReportOutcome> {
    let labels = introspect(store, &config.source)?;
    let aggregation = read_countries(store, &config.source, &labels, config.parse_policy)?;
    let report = build_report(
        &aggregation.codes,
        &aggregation.records,
        &labels,
        config.duplicate_policy,
    )?;
    let document = report.to_json();

    info!(countries = report.len(), duplicates = report.duplicates, "report built");

    Ok(ReportOutcome {
        labels,
        report,
        document,
        rows_aggregated: aggregation.len(),
        skipped_rows: aggregation.skipped_rows,
        degradations: aggregation.degradations,
    })
}

/// Class labels of the configured table.
pub fn list_classes(source: &SourceConfig) -> StatsResult<ClassLabels> {
    let store = StatsStore::open(source.require_database()?)?;
    let result = introspect(&store, source);
    let closed = store.close();

    let labels = result?;
    closed?;
    Ok(labels)
}
