//! Per-country aggregation.
//!
//! Turns each country row into a numeric record aligned with the class
//! labels, with the row total appended last:
//!
//! ```text
//! US | 1200.5 | 34.0      →   code "US", record [1200.5, 34.0, 1234.5]
//! ```
//!
//! Rows keep the order the query returned them in. Codes are not
//! deduplicated here; see [`crate::report::build_report`].

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ParsePolicy, SourceConfig};
use crate::error::{AggregationError, AggregationResult};
use crate::schema::ClassLabels;
use crate::store::{quote_identifier, CellValue, Row, StatsStore};

/// Class values of one country, `total` last
pub type CountryRecord = Vec<f64>;

/// A field the lenient parser dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseDegradation {
    /// 1-based row number in the query result
    pub row: usize,
    pub country: String,
    pub column: Option<String>,
    /// Offending text (empty for NULL / empty fields)
    pub value: String,
}

/// Parallel arrays of codes and records, plus what was dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub codes: Vec<String>,
    pub records: Vec<CountryRecord>,
    pub degradations: Vec<ParseDegradation>,
    /// Rows without a country code
    pub skipped_rows: usize,
}

impl Aggregation {
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Run the data query and aggregate its rows.
pub fn read_countries(
    store: &StatsStore,
    source: &SourceConfig,
    labels: &ClassLabels,
    policy: ParsePolicy,
) -> AggregationResult<Aggregation> {
    let sql = format!(
        "SELECT * FROM {} WHERE {} IS NOT ''",
        quote_identifier(&source.table),
        quote_identifier(&source.key_column)
    );
    let result = store
        .query(&sql)
        .map_err(|e| AggregationError::QueryFailed(e.to_string()))?;

    let aggregation = aggregate(&result.rows, labels, policy)?;
    info!(
        countries = aggregation.len(),
        skipped = aggregation.skipped_rows,
        degraded = aggregation.degradations.len(),
        "aggregated country rows"
    );
    Ok(aggregation)
}

/// Aggregate rows whose first cell is the country code.
///
/// Rows with a NULL or empty code are skipped.
pub fn aggregate(
    rows: &[Row],
    labels: &ClassLabels,
    policy: ParsePolicy,
) -> AggregationResult<Aggregation> {
    let mut out = Aggregation::default();

    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx + 1;
        let Some(code) = row.first().and_then(country_code) else {
            out.skipped_rows += 1;
            continue;
        };
        let fields = &row[1..];

        let mut record = match policy {
            ParsePolicy::Strict => parse_strict(row_num, &code, fields, labels)?,
            ParsePolicy::Lenient => parse_lenient(row_num, &code, fields, labels, &mut out.degradations),
        };

        let total: f64 = record.iter().sum();
        record.push(total);

        out.codes.push(code);
        out.records.push(record);
    }

    Ok(out)
}

fn country_code(cell: &CellValue) -> Option<String> {
    if matches!(cell, CellValue::Null) {
        return None;
    }
    let code = cell.as_text();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// One finite number per class column, or an error naming the culprit.
fn parse_strict(
    row: usize,
    country: &str,
    fields: &[CellValue],
    labels: &ClassLabels,
) -> AggregationResult<CountryRecord> {
    let classes = labels.classes();
    if fields.len() != classes.len() {
        return Err(AggregationError::FieldCount {
            row,
            country: country.to_string(),
            expected: classes.len(),
            found: fields.len(),
        });
    }

    fields
        .iter()
        .zip(classes)
        .map(|(cell, column)| {
            strict_value(cell).ok_or_else(|| AggregationError::InvalidValue {
                row,
                country: country.to_string(),
                column: column.clone(),
                value: cell.as_text(),
            })
        })
        .collect()
}

fn strict_value(cell: &CellValue) -> Option<f64> {
    let value = match cell {
        CellValue::Integer(v) => *v as f64,
        CellValue::Real(v) => *v,
        CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        CellValue::Null | CellValue::Blob(_) => return None,
    };
    value.is_finite().then_some(value)
}

/// Whitespace-tokenize every field and keep the tokens that parse.
///
/// The record can come out shorter (or longer) than the class list.
fn parse_lenient(
    row: usize,
    country: &str,
    fields: &[CellValue],
    labels: &ClassLabels,
    degradations: &mut Vec<ParseDegradation>,
) -> CountryRecord {
    let mut record = Vec::with_capacity(fields.len());

    for (i, cell) in fields.iter().enumerate() {
        let column = labels.classes().get(i).cloned();
        let text = cell.as_text();
        let mut degrade = |value: &str| {
            warn!(
                row,
                country,
                column = column.as_deref().unwrap_or("?"),
                value,
                "dropping unparsable class value"
            );
            degradations.push(ParseDegradation {
                row,
                country: country.to_string(),
                column: column.clone(),
                value: value.to_string(),
            });
        };

        let mut tokens = text.split_whitespace().peekable();
        if tokens.peek().is_none() {
            degrade(&text);
            continue;
        }
        for token in tokens {
            match token.parse::<f64>() {
                Ok(v) if v.is_finite() => record.push(v),
                _ => degrade(token),
            }
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::derive_class_labels;
    use rusqlite::Connection;

    fn labels(classes: &[&str]) -> ClassLabels {
        let mut columns = vec!["isocode".to_string()];
        columns.extend(classes.iter().map(|s| s.to_string()));
        derive_class_labels(&columns).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_total_appended() {
        let rows = vec![
            vec![text("US"), CellValue::Real(1200.5), CellValue::Integer(34)],
            vec![text("CA"), CellValue::Real(987.65), CellValue::Real(0.0)],
        ];
        let agg = aggregate(&rows, &labels(&["motorway", "trunk"]), ParsePolicy::Strict).unwrap();

        assert_eq!(agg.codes, vec!["US", "CA"]);
        assert_eq!(agg.records[0], vec![1200.5, 34.0, 1234.5]);
        assert_eq!(agg.records[1], vec![987.65, 0.0, 987.65]);
        assert!(agg.degradations.is_empty());
    }

    #[test]
    fn test_empty_and_null_codes_skipped() {
        let rows = vec![
            vec![text(""), CellValue::Real(1.0)],
            vec![CellValue::Null, CellValue::Real(2.0)],
            vec![text("DE"), CellValue::Real(3.0)],
        ];
        let agg = aggregate(&rows, &labels(&["motorway"]), ParsePolicy::Strict).unwrap();

        assert_eq!(agg.codes, vec!["DE"]);
        assert_eq!(agg.records.len(), agg.codes.len());
        assert_eq!(agg.skipped_rows, 2);
    }

    #[test]
    fn test_duplicates_kept_in_order() {
        let rows = vec![
            vec![text("US"), CellValue::Real(1.0)],
            vec![text("US"), CellValue::Real(2.0)],
        ];
        let agg = aggregate(&rows, &labels(&["motorway"]), ParsePolicy::Strict).unwrap();
        assert_eq!(agg.codes, vec!["US", "US"]);
        assert_eq!(agg.records[1], vec![2.0, 2.0]);
    }

    #[test]
    fn test_numeric_text_accepted_in_strict_mode() {
        let rows = vec![vec![text("FR"), text(" 12.5 "), text("7")]];
        let agg = aggregate(&rows, &labels(&["a", "b"]), ParsePolicy::Strict).unwrap();
        assert_eq!(agg.records[0], vec![12.5, 7.0, 19.5]);
    }

    #[test]
    fn test_strict_rejects_empty_field() {
        let rows = vec![vec![text("FR"), CellValue::Real(1.0), text("")]];
        let err = aggregate(&rows, &labels(&["a", "b"]), ParsePolicy::Strict).unwrap_err();
        match err {
            AggregationError::InvalidValue { row, country, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(country, "FR");
                assert_eq!(column, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_rejects_null_and_non_finite() {
        let lbl = labels(&["a"]);
        let null_row = vec![vec![text("FR"), CellValue::Null]];
        assert!(aggregate(&null_row, &lbl, ParsePolicy::Strict).is_err());

        let inf_row = vec![vec![text("FR"), text("inf")]];
        assert!(aggregate(&inf_row, &lbl, ParsePolicy::Strict).is_err());
    }

    #[test]
    fn test_strict_rejects_field_count_mismatch() {
        let rows = vec![vec![text("FR"), CellValue::Real(1.0)]];
        let err = aggregate(&rows, &labels(&["a", "b"]), ParsePolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            AggregationError::FieldCount { expected: 2, found: 1, .. }
        ));
    }

    #[test]
    fn test_lenient_empty_field_shrinks_record() {
        let rows = vec![vec![text("FR"), CellValue::Real(1.5), text(""), CellValue::Integer(2)]];
        let agg = aggregate(&rows, &labels(&["a", "b", "c"]), ParsePolicy::Lenient).unwrap();

        // One value short, total excludes the missing field
        assert_eq!(agg.records[0], vec![1.5, 2.0, 3.5]);
        assert_eq!(agg.degradations.len(), 1);
        assert_eq!(agg.degradations[0].column.as_deref(), Some("b"));
        assert_eq!(agg.degradations[0].value, "");
    }

    #[test]
    fn test_lenient_drops_garbage_tokens() {
        let rows = vec![vec![text("FR"), text("abc"), CellValue::Null, text("4")]];
        let agg = aggregate(&rows, &labels(&["a", "b", "c"]), ParsePolicy::Lenient).unwrap();

        assert_eq!(agg.records[0], vec![4.0, 4.0]);
        assert_eq!(agg.degradations.len(), 2);
        assert_eq!(agg.degradations[0].value, "abc");
    }

    #[test]
    fn test_lenient_splits_multi_token_text() {
        let rows = vec![vec![text("FR"), text("1 2")]];
        let agg = aggregate(&rows, &labels(&["a"]), ParsePolicy::Lenient).unwrap();
        assert_eq!(agg.records[0], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_read_countries_filters_in_sql() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE countrydata (isocode TEXT, motorway REAL, trunk REAL);
             INSERT INTO countrydata VALUES ('US', 1000.0, 234.5);
             INSERT INTO countrydata VALUES ('', 5.0, 5.0);
             INSERT INTO countrydata VALUES ('CA', 987.65, 0);",
        )
        .unwrap();
        let store = StatsStore::from_connection(conn);

        let agg = read_countries(
            &store,
            &SourceConfig::default(),
            &labels(&["motorway", "trunk"]),
            ParsePolicy::Strict,
        )
        .unwrap();

        assert_eq!(agg.codes, vec!["US", "CA"]);
        assert_eq!(agg.records[0], vec![1000.0, 234.5, 1234.5]);
    }

    #[test]
    fn test_read_countries_query_failure() {
        let store = StatsStore::from_connection(Connection::open_in_memory().unwrap());
        let err = read_countries(
            &store,
            &SourceConfig::default(),
            &labels(&["motorway"]),
            ParsePolicy::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, AggregationError::QueryFailed(_)));
    }
}
