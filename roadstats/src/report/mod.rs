//! Report construction, JSON rendering and output.
//!
//! # Architecture
//!
//! ```text
//! codes   [US, CA, US]          Report
//! records [[..], [..], [..]]  → ┌──────────────────────────────┐
//! labels  [motorway, total]     │ US → {name, records} (last)  │
//!                               │ CA → {name, records}         │
//!                               └──────────────────────────────┘
//! ```
//!
//! - [`build_report`] pairs codes, records and labels and collapses
//!   duplicate codes per [`DuplicatePolicy`]
//! - [`json`] renders the document layout
//! - [`write`] puts the document on disk (atomically) or on stdout

pub mod json;
pub mod write;

use std::collections::HashMap;
use tracing::warn;

use crate::aggregate::CountryRecord;
use crate::config::DuplicatePolicy;
use crate::error::{ReportError, ReportResult};
use crate::schema::ClassLabels;

pub use json::{format_value, to_json};
pub use write::write_report;

/// One country of the report
#[derive(Debug, Clone, PartialEq)]
pub struct CountryEntry {
    pub name: String,
    /// (class label, value), in label order
    pub records: Vec<(String, f64)>,
}

impl CountryEntry {
    /// Pair labels with values up to the shorter of the two.
    fn new(code: &str, labels: &ClassLabels, record: &CountryRecord) -> Self {
        let records = labels
            .iter()
            .zip(record.iter())
            .map(|(label, value)| (label.clone(), *value))
            .collect();
        Self {
            name: code.to_string(),
            records,
        }
    }

    /// Value for `label`, if the record reached that far.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.records
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }
}

/// Countries in first-seen order, one entry per code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub entries: Vec<CountryEntry>,
    /// Entries replaced by a later row with the same code
    pub duplicates: usize,
}

impl Report {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a country code, after duplicate collapsing.
    pub fn get(&self, code: &str) -> Option<&CountryEntry> {
        self.entries.iter().find(|e| e.name == code)
    }

    /// Render the JSON document.
    pub fn to_json(&self) -> String {
        json::to_json(self)
    }
}

/// Build the report from the aggregator's parallel arrays.
///
/// With [`DuplicatePolicy::LastWins`] a repeated code keeps its first
/// position and takes the later record.
pub fn build_report(
    codes: &[String],
    records: &[CountryRecord],
    labels: &ClassLabels,
    policy: DuplicatePolicy,
) -> ReportResult<Report> {
    let mut report = Report::default();
    // code -> (position in entries, 1-based entry number of first sighting)
    let mut seen: HashMap<&str, (usize, usize)> = HashMap::with_capacity(codes.len());

    for (i, (code, record)) in codes.iter().zip(records).enumerate() {
        let entry = CountryEntry::new(code, labels, record);

        match seen.get(code.as_str()) {
            None => {
                seen.insert(code.as_str(), (report.entries.len(), i + 1));
                report.entries.push(entry);
            }
            Some(&(pos, first)) => match policy {
                DuplicatePolicy::LastWins => {
                    warn!(code = %code, first, replaced_by = i + 1, "duplicate country code, keeping last");
                    report.entries[pos] = entry;
                    report.duplicates += 1;
                }
                DuplicatePolicy::Reject => {
                    return Err(ReportError::DuplicateCountry {
                        code: code.clone(),
                        first,
                        second: i + 1,
                    });
                }
            },
        }
    }

    Ok(report)
}

/// Build and render in one go.
pub fn serialize(
    codes: &[String],
    records: &[CountryRecord],
    labels: &ClassLabels,
    policy: DuplicatePolicy,
) -> ReportResult<String> {
    Ok(build_report(codes, records, labels, policy)?.to_json())
}
