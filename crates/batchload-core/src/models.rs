//! Ledger records

use crate::error::{IngestError, IngestResult};
use crate::table::{Table, Value};
use serde::Serialize;

/// A registered upstream producer of data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSource {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub description: String,
}

/// One ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    pub id: i64,
    pub datasource_id: i64,
    pub notes: String,
    pub source_location: String,
    pub execution_env: String,
}

/// Reads typed cells out of a query result by column name
pub(crate) struct RowReader<'a> {
    table: &'a Table,
    query: &'a str,
}

impl<'a> RowReader<'a> {
    pub(crate) fn new(table: &'a Table, query: &'a str) -> Self {
        Self { table, query }
    }

    fn index(&self, column: &str) -> IngestResult<usize> {
        self.table
            .column_index(column)
            .ok_or_else(|| IngestError::MissingColumn {
                column: column.to_string(),
                query: self.query.to_string(),
            })
    }

    pub(crate) fn int(&self, row: &[Value], column: &str) -> IngestResult<i64> {
        let cell = &row[self.index(column)?];
        cell.as_i64().ok_or_else(|| IngestError::UnexpectedValue {
            column: column.to_string(),
            found: cell.kind().to_string(),
        })
    }

    pub(crate) fn optional_int(&self, row: &[Value], column: &str) -> IngestResult<Option<i64>> {
        let cell = &row[self.index(column)?];
        if cell.is_null() {
            return Ok(None);
        }
        self.int(row, column).map(Some)
    }

    /// Text cell; SQL NULL reads as an empty string.
    pub(crate) fn text(&self, row: &[Value], column: &str) -> IngestResult<String> {
        match &row[self.index(column)?] {
            Value::Null => Ok(String::new()),
            Value::Text(s) => Ok(s.clone()),
            other => Err(IngestError::UnexpectedValue {
                column: column.to_string(),
                found: other.kind().to_string(),
            }),
        }
    }
}
