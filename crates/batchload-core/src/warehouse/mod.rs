//! Relational warehouse access
//!
//! [`Warehouse`] is the only way the ledger and provisioner reach storage.
//! [`postgres::PgWarehouse`] is the production implementation;
//! [`crate::testing::MemoryWarehouse`] backs the tests.

use crate::error::IngestResult;
use crate::table::{Table, TableRef, Value};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

pub mod postgres;

pub use postgres::PgWarehouse;

/// Destination column type, as created by the provisioner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    BigInt,
    Double,
    Boolean,
    Timestamp,
    Text,
}

impl ColumnType {
    pub fn sql(self) -> &'static str {
        match self {
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMPTZ",
            ColumnType::Text => "TEXT",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Query, insert and DDL capability over the warehouse
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Run a read query and return its rows.
    async fn query_table(&self, sql: &str) -> IngestResult<Table>;

    /// Append every row of `rows` to `table`, matching columns by name.
    async fn insert_rows(&self, table: &TableRef, rows: &Table) -> IngestResult<u64>;

    /// Insert one row whose integer `id` is allocated as `max(id) + 1`
    /// (1 on an empty table) atomically with the insert. Returns the id.
    async fn insert_with_next_id(
        &self,
        table: &TableRef,
        columns: &[&str],
        values: Vec<Value>,
    ) -> IngestResult<i64>;

    async fn table_exists(&self, table: &TableRef) -> IngestResult<bool>;

    async fn create_table(&self, table: &TableRef, columns: &[ColumnDef]) -> IngestResult<()>;

    /// Release the connection. Called once at the end of a run.
    async fn close(&self);
}
