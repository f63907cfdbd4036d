//! Derived datasets
//!
//! Two independent transforms of the same normalized input:
//!
//! - the **staged artifact**, annotated with `metadata_created` and
//!   `metadata_table_name`, written next to the input and uploaded to the
//!   landing zone;
//! - the **tagged dataset**, annotated with `batch_id` and `created`, loaded
//!   into the warehouse.
//!
//! The staged copy never carries a batch id.

use crate::error::IngestResult;
use crate::table::{Table, TableRef, Value};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub const METADATA_CREATED: &str = "metadata_created";
pub const METADATA_TABLE_NAME: &str = "metadata_table_name";
pub const BATCH_ID: &str = "batch_id";
pub const CREATED: &str = "created";

/// Landing-zone copy of the normalized input
pub fn stage(normalized: &Table, target: &TableRef, staged_at: DateTime<Utc>) -> Table {
    normalized
        .with_constant_column(METADATA_CREATED, Value::Timestamp(staged_at))
        .with_constant_column(METADATA_TABLE_NAME, Value::Text(target.qualified()))
}

/// Load payload: every row carries the same batch id and load timestamp.
pub fn tag(normalized: &Table, batch_id: i64, created: DateTime<Utc>) -> Table {
    normalized
        .with_constant_column(BATCH_ID, Value::Int(batch_id))
        .with_constant_column(CREATED, Value::Timestamp(created))
}

/// `/data/sales.csv` -> `/data/sales_datalake.csv`
pub fn staged_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    input.with_file_name(format!("{}_datalake.csv", stem))
}

/// Write the staged artifact and return where it landed.
pub fn write_staged(staged: &Table, input: &Path) -> IngestResult<PathBuf> {
    let path = staged_path(input);
    staged.write_csv(&path)?;
    Ok(path)
}
