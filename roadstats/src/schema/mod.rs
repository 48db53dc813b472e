//! Road class discovery.
//!
//! The class list is not fixed: every column after the country code key is
//! a road class, in table order, and a synthetic `total` class closes the
//! list.
//!
//! ```text
//! isocode | motorway | trunk | primary      →   [motorway, trunk, primary, total]
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::error::{SchemaError, SchemaResult};
use crate::store::{quote_identifier, StatsStore};

/// Label of the synthetic sum column
pub const TOTAL_LABEL: &str = "total";

/// Ordered road class labels, `total` always last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassLabels(Vec<String>);

impl ClassLabels {
    /// All labels including `total`.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Labels of the real road classes (without `total`).
    pub fn classes(&self) -> &[String] {
        &self.0[..self.0.len() - 1]
    }

    /// Number of labels including `total`.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true: `total` is always present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

/// Build the labels from a column list whose first entry is the key column.
///
/// A class column named `total` would repeat a key in every record and is
/// rejected.
pub fn derive_class_labels(columns: &[String]) -> SchemaResult<ClassLabels> {
    let mut labels: Vec<String> = columns.iter().skip(1).cloned().collect();

    if let Some(clash) = labels.iter().find(|l| l.as_str() == TOTAL_LABEL) {
        return Err(SchemaError::ReservedColumn(clash.clone()));
    }

    labels.push(TOTAL_LABEL.to_string());
    Ok(ClassLabels(labels))
}

/// Read the column list of the configured table and derive its labels.
///
/// Works on an empty table: names come from statement metadata.
pub fn introspect(store: &StatsStore, source: &SourceConfig) -> SchemaResult<ClassLabels> {
    let sql = format!("SELECT * FROM {} LIMIT 1", quote_identifier(&source.table));
    let columns = store
        .columns(&sql)
        .map_err(|e| SchemaError::QueryFailed(e.to_string()))?;

    let first = columns
        .first()
        .ok_or_else(|| SchemaError::NoColumns(source.table.clone()))?;

    if !first.eq_ignore_ascii_case(&source.key_column) {
        return Err(SchemaError::KeyColumnMismatch {
            expected: source.key_column.clone(),
            found: first.clone(),
        });
    }

    for column in columns.iter().skip(1) {
        debug!(column = %column, "road class");
    }

    let labels = derive_class_labels(&columns)?;
    info!(table = %source.table, classes = labels.len() - 1, "derived road classes");
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn store(setup: &str) -> StatsStore {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(setup).unwrap();
        StatsStore::from_connection(conn)
    }

    #[test]
    fn test_key_column_skipped_total_appended() {
        let labels = derive_class_labels(&strings(&["isocode", "Motorway", "Trunk"])).unwrap();
        assert_eq!(labels.as_slice(), strings(&["Motorway", "Trunk", "total"]).as_slice());
        assert_eq!(labels.classes(), strings(&["Motorway", "Trunk"]).as_slice());
    }

    #[test]
    fn test_key_only_table() {
        let labels = derive_class_labels(&strings(&["isocode"])).unwrap();
        assert_eq!(labels.as_slice(), strings(&["total"]).as_slice());
        assert!(labels.classes().is_empty());
    }

    #[test]
    fn test_total_column_rejected() {
        let err = derive_class_labels(&strings(&["isocode", "motorway", "total"])).unwrap_err();
        assert!(matches!(err, SchemaError::ReservedColumn(ref c) if c == "total"));

        // Other spellings are distinct JSON keys
        let labels = derive_class_labels(&strings(&["isocode", "Total"])).unwrap();
        assert_eq!(labels.as_slice(), strings(&["Total", "total"]).as_slice());
    }

    #[test]
    fn test_introspect_rejects_total_column() {
        let store = store(
            "CREATE TABLE countrydata (isocode TEXT, motorway REAL, total REAL);
             INSERT INTO countrydata VALUES ('US', 1.0, 5.0);",
        );
        let err = introspect(&store, &SourceConfig::default()).unwrap_err();
        assert!(matches!(err, SchemaError::ReservedColumn(_)));
    }

    #[test]
    fn test_introspect_empty_table() {
        let store = store("CREATE TABLE countrydata (isocode TEXT, motorway REAL, trunk REAL, primary_road REAL);");
        let labels = introspect(&store, &SourceConfig::default()).unwrap();
        assert_eq!(
            labels.as_slice(),
            strings(&["motorway", "trunk", "primary_road", "total"]).as_slice()
        );
    }

    #[test]
    fn test_introspect_missing_table() {
        let store = store("");
        let err = introspect(&store, &SourceConfig::default()).unwrap_err();
        match err {
            SchemaError::QueryFailed(msg) => assert!(msg.contains("no such table")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_introspect_key_column_mismatch() {
        let store = store("CREATE TABLE countrydata (motorway REAL, isocode TEXT);");
        let err = introspect(&store, &SourceConfig::default()).unwrap_err();
        assert!(matches!(err, SchemaError::KeyColumnMismatch { .. }));
    }

    #[test]
    fn test_introspect_custom_table() {
        let store = store("CREATE TABLE \"road stats\" (ISOCODE TEXT, track REAL);");
        let source = SourceConfig {
            table: "road stats".to_string(),
            ..SourceConfig::default()
        };
        let labels = introspect(&store, &source).unwrap();
        assert_eq!(labels.as_slice(), strings(&["track", "total"]).as_slice());
    }

    #[test]
    fn test_labels_serialize_as_array() {
        let labels = derive_class_labels(&strings(&["isocode", "Motorway"])).unwrap();
        assert_eq!(serde_json::to_string(&labels).unwrap(), r#"["Motorway","total"]"#);
    }
}
