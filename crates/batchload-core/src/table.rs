//! In-memory tabular data
//!
//! A [`Table`] is the unit every stage of an ingestion run passes around: the
//! parsed input, the staged artifact, the tagged load payload, and warehouse
//! query results. Transforms return new tables instead of mutating, so the
//! staged and tagged derivations of one input stay independent.

use crate::error::{IngestError, IngestResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// A single typed cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Timestamp(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

/// Column-named rows of [`Value`]s
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows. Every row must have one cell per column.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over the cells of one column
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Same rows under new column names. The name count must not change.
    pub fn rename_columns(self, columns: Vec<String>) -> Self {
        debug_assert_eq!(columns.len(), self.columns.len());
        Self {
            columns,
            rows: self.rows,
        }
    }

    /// Copy of this table with `value` in every row of column `name`.
    ///
    /// An existing column of that name is overwritten in place; otherwise the
    /// column is appended.
    pub fn with_constant_column(&self, name: &str, value: Value) -> Self {
        let mut columns = self.columns.clone();
        let existing = self.column_index(name);
        if existing.is_none() {
            columns.push(name.to_string());
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                match existing {
                    Some(idx) => row[idx] = value.clone(),
                    None => row.push(value.clone()),
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Read a CSV file with a header row, inferring a type per column.
    pub fn read_csv(path: &Path) -> IngestResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file).map_err(|e| match e {
            IngestError::EmptyInput(_) => IngestError::EmptyInput(path.display().to_string()),
            other => other,
        })
    }

    /// Header cells are kept verbatim; a blank one becomes `Unnamed: <index>`.
    /// Short records are padded with nulls, long ones are rejected.
    pub fn from_csv_reader<R: Read>(reader: R) -> IngestResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                if name.is_empty() {
                    format!("Unnamed: {}", idx)
                } else {
                    name.to_string()
                }
            })
            .collect();
        if columns.is_empty() {
            return Err(IngestError::EmptyInput("<reader>".to_string()));
        }

        let mut raw: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() > columns.len() {
                return Err(IngestError::RaggedRow {
                    line: record.position().map_or(0, |p| p.line()),
                    expected: columns.len(),
                    found: record.len(),
                });
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(columns.len(), String::new());
            raw.push(row);
        }

        let kinds: Vec<CellKind> = (0..columns.len())
            .map(|idx| CellKind::infer(raw.iter().map(|row| row[idx].as_str())))
            .collect();

        let rows = raw
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&kinds)
                    .map(|(cell, kind)| kind.parse(cell))
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn write_csv(&self, path: &Path) -> IngestResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Column type detected while reading CSV text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Int,
    Float,
    Bool,
    Text,
}

impl CellKind {
    /// Narrowest kind that every non-empty cell parses as.
    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut int = true;
        let mut float = true;
        let mut boolean = true;
        let mut seen = false;

        for cell in cells.filter(|c| !c.is_empty()) {
            seen = true;
            int &= cell.parse::<i64>().is_ok();
            float &= cell.parse::<f64>().is_ok();
            boolean &= parse_bool(cell).is_some();
            if !(int || float || boolean) {
                return CellKind::Text;
            }
        }

        match (seen, int, float, boolean) {
            (false, ..) => CellKind::Text,
            (_, true, ..) => CellKind::Int,
            (_, _, true, _) => CellKind::Float,
            (_, _, _, true) => CellKind::Bool,
            _ => CellKind::Text,
        }
    }

    fn parse(self, cell: String) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }
        match self {
            CellKind::Int => cell.parse().map(Value::Int).unwrap_or(Value::Text(cell)),
            CellKind::Float => cell.parse().map(Value::Float).unwrap_or(Value::Text(cell)),
            CellKind::Bool => parse_bool(&cell).map(Value::Bool).unwrap_or(Value::Text(cell)),
            CellKind::Text => Value::Text(cell),
        }
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// A `schema.table` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Parse `schema.table`; a bare name lands in `public`.
    pub fn parse(reference: &str) -> Self {
        match reference.split_once('.') {
            Some((schema, name)) => Self::new(schema, name),
            None => Self::new("public", reference),
        }
    }

    /// Unquoted `schema.table`, as recorded in staged metadata
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Quoted form safe to splice into SQL
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Double-quote an SQL identifier
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let csv = "Region,Total Sales (%),Active,Comment\nNorth,12.5,true,\nSouth,7,false,late\n";
        Table::from_csv_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_csv_column_types_are_inferred() {
        let table = sample();
        assert_eq!(table.columns(), &["Region", "Total Sales (%)", "Active", "Comment"]);
        assert_eq!(table.rows()[0][0], Value::Text("North".into()));
        assert_eq!(table.rows()[1][1], Value::Float(7.0));
        assert_eq!(table.rows()[0][2], Value::Bool(true));
        assert_eq!(table.rows()[0][3], Value::Null);
        assert_eq!(table.rows()[1][3], Value::Text("late".into()));
    }

    #[test]
    fn test_integer_column_stays_integer() {
        let table = Table::from_csv_reader("id,qty\n1,10\n2,\n".as_bytes()).unwrap();
        assert_eq!(table.rows()[0][1], Value::Int(10));
        assert_eq!(table.rows()[1][1], Value::Null);
    }

    #[test]
    fn test_empty_header_is_rejected() {
        let result = Table::from_csv_reader("".as_bytes());
        assert!(matches!(result, Err(IngestError::EmptyInput(_))));
    }

    #[test]
    fn test_with_constant_column_leaves_source_untouched() {
        let base = sample();
        let tagged = base.with_constant_column("batch_id", Value::Int(10));

        assert_eq!(base.columns().len(), 4);
        assert_eq!(tagged.columns().last().map(String::as_str), Some("batch_id"));
        assert!(tagged.column("batch_id").unwrap().all(|v| *v == Value::Int(10)));
    }

    #[test]
    fn test_with_constant_column_overwrites_existing() {
        let base = Table::from_csv_reader("Region,batch_id\nNorth,1\nSouth,2\n".as_bytes()).unwrap();
        let tagged = base.with_constant_column("batch_id", Value::Int(10));

        assert_eq!(tagged.columns(), &["Region", "batch_id"]);
        assert!(tagged.column("batch_id").unwrap().all(|v| *v == Value::Int(10)));
        assert_eq!(base.rows()[1][1], Value::Int(2));
    }

    #[test]
    fn test_header_whitespace_is_preserved() {
        let table = Table::from_csv_reader(" Region,Sales \nNorth,1\n".as_bytes()).unwrap();
        assert_eq!(table.columns(), &[" Region", "Sales "]);
    }

    #[test]
    fn test_blank_header_becomes_unnamed() {
        let table = Table::from_csv_reader(",Region\n0,North\n1,South\n".as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Unnamed: 0", "Region"]);
        assert_eq!(table.rows()[1][0], Value::Int(1));
    }

    #[test]
    fn test_short_rows_are_padded_with_nulls() {
        let table = Table::from_csv_reader("a,b,c\n1,2,3\n4\n".as_bytes()).unwrap();
        assert_eq!(table.rows()[1], vec![Value::Int(4), Value::Null, Value::Null]);
    }

    #[test]
    fn test_long_rows_are_rejected() {
        let result = Table::from_csv_reader("a,b\n1,2\n3,4,5\n".as_bytes());
        assert!(matches!(
            result,
            Err(IngestError::RaggedRow {
                line: 3,
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn test_write_csv_round_trips_header_and_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        sample().write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Region,Total Sales (%),Active,Comment"));
        assert_eq!(lines.next(), Some("North,12.5,true,"));
    }

    #[test]
    fn test_table_ref_parse_and_quote() {
        let r = TableRef::parse("dwh.dim_datasource");
        assert_eq!(r.schema, "dwh");
        assert_eq!(r.qualified(), "dwh.dim_datasource");
        assert_eq!(TableRef::parse("batch").schema, "public");
        assert_eq!(TableRef::new("raw", "a\"b").quoted(), "\"raw\".\"a\"\"b\"");
    }
}
