//! Read-only access to the statistics database.
//!
//! The store hands out column names straight from prepared statement
//! metadata, so an empty table still describes its schema, and rows as
//! typed [`CellValue`]s. Nothing here knows about countries or road classes.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::debug;

use crate::error::{ConnectionError, ConnectionResult};

/// One cell of a result row
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    fn from_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(v) => CellValue::Integer(v),
            ValueRef::Real(v) => CellValue::Real(v),
            ValueRef::Text(v) => CellValue::Text(String::from_utf8_lossy(v).to_string()),
            ValueRef::Blob(v) => CellValue::Blob(v.to_vec()),
        }
    }

    /// Text rendering of the cell. NULL renders as an empty string.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Integer(v) => v.to_string(),
            CellValue::Real(v) => v.to_string(),
            CellValue::Text(v) => v.clone(),
            CellValue::Blob(v) => String::from_utf8_lossy(v).to_string(),
        }
    }

    /// True for NULL and for text that is empty once trimmed.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(v) => v.trim().is_empty(),
            CellValue::Blob(v) => v.is_empty(),
            CellValue::Integer(_) | CellValue::Real(_) => false,
        }
    }
}

/// A result row, in column order
pub type Row = Vec<CellValue>;

/// Column names plus every row of a query
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Owner of the database connection.
///
/// Dropping the store releases the connection; [`StatsStore::close`] does
/// the same but reports engine errors.
pub struct StatsStore {
    conn: Connection,
}

impl StatsStore {
    /// Open an existing database file read-only.
    ///
    /// A missing file is an error, never a fresh empty database.
    pub fn open(path: impl AsRef<Path>) -> ConnectionResult<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(path, flags).map_err(|e| ConnectionError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        debug!(path = %path.display(), "opened statistics database");
        Ok(Self { conn })
    }

    /// Wrap an already open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Column names of `sql`, read from statement metadata without stepping it.
    pub fn columns(&self, sql: &str) -> rusqlite::Result<Vec<String>> {
        let stmt = self.conn.prepare(sql)?;
        Ok(stmt.column_names().into_iter().map(String::from).collect())
    }

    /// Run `sql` and collect every row.
    pub fn query(&self, sql: &str) -> rusqlite::Result<QueryResult> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = stmt.query([])?;
        let mut all_rows = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(CellValue::from_ref(row.get_ref(i)?));
            }
            all_rows.push(cells);
        }

        debug!(rows = all_rows.len(), columns = width, "query done");
        Ok(QueryResult {
            columns,
            rows: all_rows,
        })
    }

    /// Close the connection, surfacing engine errors.
    pub fn close(self) -> ConnectionResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| ConnectionError::Close(e.to_string()))
    }
}
