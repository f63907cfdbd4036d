//! In-memory collaborators for tests
//!
//! Lets the ledger and orchestrator run without a terminal, a warehouse or a
//! bucket.
//!
//! # Examples
//!
//! ```rust,ignore
//! use batchload_core::testing::{MemoryWarehouse, ScriptedPrompter};
//!
//! let warehouse = MemoryWarehouse::new();
//! warehouse.seed_datasource(4, "POS", "Point of Sale", "");
//!
//! let mut prompter = ScriptedPrompter::new()
//!     .choose("POS")
//!     .text("first load");
//! ```

use crate::config::{DEFAULT_BATCH_TABLE, DEFAULT_DATASOURCE_TABLE};
use crate::error::{IngestError, IngestResult};
use crate::ledger::next_id;
use crate::prompt::Prompter;
use crate::storage::{sha256_hex, UploadReceipt, Uploader};
use crate::table::{Table, TableRef, Value};
use crate::warehouse::{ColumnDef, Warehouse};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const DATASOURCE_COLUMNS: [&str; 4] = ["id", "name", "full_name", "descr"];
const BATCH_COLUMNS: [&str; 5] = [
    "id",
    "datasource_id",
    "notes",
    "source_location",
    "execution_env",
];

fn simulated(msg: impl Into<String>) -> IngestError {
    IngestError::Warehouse(sqlx::Error::Protocol(msg.into()))
}

#[derive(Default)]
struct WarehouseState {
    tables: HashMap<TableRef, Table>,
    created: HashMap<TableRef, Vec<ColumnDef>>,
    writes: usize,
    creates: usize,
    fail_writes: Option<String>,
    closed: bool,
}

impl WarehouseState {
    fn table_mut(&mut self, table: &TableRef, columns: &[&str]) -> &mut Table {
        self.tables
            .entry(table.clone())
            .or_insert_with(|| Table::new(columns.iter().map(|c| c.to_string()).collect()))
    }

    fn check_writable(&self) -> IngestResult<()> {
        match &self.fail_writes {
            Some(msg) => Err(simulated(msg.clone())),
            None => Ok(()),
        }
    }
}

/// Warehouse double understanding the handful of query shapes the ledger
/// issues: `SELECT cols FROM t [WHERE id = N] [ORDER BY id]` and
/// `SELECT MAX(id) AS alias FROM t`.
#[derive(Default)]
pub struct MemoryWarehouse {
    state: Mutex<WarehouseState>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, WarehouseState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a data source without counting it as a write.
    pub fn seed_datasource(&self, id: i64, name: &str, full_name: &str, descr: &str) {
        self.lock()
            .table_mut(&TableRef::parse(DEFAULT_DATASOURCE_TABLE), &DATASOURCE_COLUMNS)
            .push_row(vec![
                Value::Int(id),
                name.into(),
                full_name.into(),
                descr.into(),
            ]);
    }

    /// Add a batch without counting it as a write.
    pub fn seed_batch(&self, id: i64, datasource_id: i64) {
        self.lock()
            .table_mut(&TableRef::parse(DEFAULT_BATCH_TABLE), &BATCH_COLUMNS)
            .push_row(vec![
                Value::Int(id),
                Value::Int(datasource_id),
                "seeded".into(),
                "".into(),
                "seed".into(),
            ]);
    }

    /// Make every subsequent write fail with `msg`.
    pub fn fail_writes(&self, msg: &str) {
        self.lock().fail_writes = Some(msg.to_string());
    }

    /// Inserts performed through the [`Warehouse`] trait
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    pub fn create_count(&self) -> usize {
        self.lock().creates
    }

    pub fn table(&self, table: &TableRef) -> Option<Table> {
        self.lock().tables.get(table).cloned()
    }

    pub fn created_columns(&self, table: &TableRef) -> Option<Vec<ColumnDef>> {
        self.lock().created.get(table).cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn run_query(&self, sql: &str) -> IngestResult<Table> {
        let upper = sql.to_ascii_uppercase();
        let from = upper
            .find(" FROM ")
            .ok_or_else(|| simulated(format!("unsupported query: {}", sql)))?;
        let select = sql["SELECT".len()..from].trim();
        let rest = sql[from + " FROM ".len()..].trim();
        let (table_token, clause) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let table_ref = TableRef::parse(&table_token.replace('"', ""));
        let clause = clause.to_ascii_uppercase();

        let source = self.lock().tables.get(&table_ref).cloned().unwrap_or_default();

        if select.to_ascii_uppercase().starts_with("MAX(ID)") {
            let alias = select
                .split_whitespace()
                .last()
                .filter(|a| !a.eq_ignore_ascii_case("MAX(ID)"))
                .unwrap_or("max")
                .to_string();
            let max = source
                .column("id")
                .and_then(|cells| cells.filter_map(Value::as_i64).max());
            return Ok(Table::from_rows(
                vec![alias],
                vec![vec![max.map_or(Value::Null, Value::Int)]],
            ));
        }

        let id_index = source.column_index("id");
        let mut rows: Vec<Vec<Value>> = source.rows().to_vec();

        if let Some(pos) = clause.find("WHERE ID = ") {
            let wanted: i64 = clause[pos + "WHERE ID = ".len()..]
                .split_whitespace()
                .next()
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| simulated(format!("unsupported filter: {}", sql)))?;
            rows.retain(|row| id_index.and_then(|i| row[i].as_i64()) == Some(wanted));
        }

        if clause.contains("ORDER BY ID") {
            rows.sort_by_key(|row| id_index.and_then(|i| row[i].as_i64()));
        }

        let columns: Vec<String> = select.split(',').map(|c| c.trim().to_string()).collect();
        if rows.is_empty() {
            return Ok(Table::new(columns));
        }

        let indices = columns
            .iter()
            .map(|c| {
                source.column_index(c).ok_or_else(|| IngestError::MissingColumn {
                    column: c.clone(),
                    query: sql.to_string(),
                })
            })
            .collect::<IngestResult<Vec<usize>>>()?;

        let projected = rows
            .into_iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Table::from_rows(columns, projected))
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn query_table(&self, sql: &str) -> IngestResult<Table> {
        self.run_query(sql)
    }

    async fn insert_rows(&self, table: &TableRef, rows: &Table) -> IngestResult<u64> {
        let mut state = self.lock();
        state.check_writable()?;

        let target = state
            .tables
            .get_mut(table)
            .ok_or_else(|| simulated(format!("relation {} does not exist", table)))?;

        let mapping = target
            .columns()
            .iter()
            .map(|c| rows.column_index(c))
            .collect::<Vec<_>>();
        if let Some(extra) = rows.columns().iter().find(|c| target.column_index(c).is_none()) {
            return Err(simulated(format!("column {} of {} does not exist", extra, table)));
        }

        for row in rows.rows() {
            target.push_row(
                mapping
                    .iter()
                    .map(|idx| idx.map_or(Value::Null, |i| row[i].clone()))
                    .collect(),
            );
        }

        state.writes += 1;
        Ok(rows.len() as u64)
    }

    async fn insert_with_next_id(
        &self,
        table: &TableRef,
        columns: &[&str],
        values: Vec<Value>,
    ) -> IngestResult<i64> {
        let mut state = self.lock();
        state.check_writable()?;

        let mut all_columns = vec!["id"];
        all_columns.extend_from_slice(columns);
        let target = state.table_mut(table, &all_columns);

        let id = next_id(
            target
                .column("id")
                .into_iter()
                .flatten()
                .filter_map(Value::as_i64),
        );

        let mut row = vec![Value::Null; target.columns().len()];
        row[0] = Value::Int(id);
        for (column, value) in columns.iter().zip(values) {
            let idx = target
                .column_index(column)
                .ok_or_else(|| simulated(format!("column {} of {} does not exist", column, table)))?;
            row[idx] = value;
        }
        target.push_row(row);

        state.writes += 1;
        Ok(id)
    }

    async fn table_exists(&self, table: &TableRef) -> IngestResult<bool> {
        Ok(self.lock().tables.contains_key(table))
    }

    async fn create_table(&self, table: &TableRef, columns: &[ColumnDef]) -> IngestResult<()> {
        let mut state = self.lock();
        state.check_writable()?;

        if state.tables.contains_key(table) {
            return Err(simulated(format!("relation {} already exists", table)));
        }

        let names = columns.iter().map(|c| c.name.clone()).collect();
        state.tables.insert(table.clone(), Table::new(names));
        state.created.insert(table.clone(), columns.to_vec());
        state.creates += 1;
        Ok(())
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}

/// Prompter replaying queued answers
///
/// Choices and free-text answers are consumed in order from separate queues.
/// Running out of answers is an error, so an unexpected extra prompt fails
/// the test instead of hanging.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    choices: VecDeque<String>,
    texts: VecDeque<String>,
    offered: Vec<Vec<String>>,
    notices: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the label for the next `choose_one`.
    pub fn choose(mut self, option: &str) -> Self {
        self.choices.push_back(option.to_string());
        self
    }

    /// Queue the answer for the next `read_text`.
    pub fn text(mut self, answer: &str) -> Self {
        self.texts.push_back(answer.to_string());
        self
    }

    /// Option lists shown so far, one entry per `choose_one`
    pub fn offered(&self) -> &[Vec<String>] {
        &self.offered
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }
}

impl Prompter for ScriptedPrompter {
    fn choose_one(&mut self, prompt: &str, options: &[String]) -> IngestResult<String> {
        self.offered.push(options.to_vec());
        let choice = self
            .choices
            .pop_front()
            .ok_or_else(|| IngestError::prompt(format!("no scripted choice for '{}'", prompt)))?;

        if !options.contains(&choice) {
            return Err(IngestError::prompt(format!(
                "'{}' is not one of {:?}",
                choice, options
            )));
        }
        Ok(choice)
    }

    fn read_text(&mut self, prompt: &str) -> IngestResult<String> {
        self.texts
            .pop_front()
            .ok_or_else(|| IngestError::prompt(format!("no scripted answer for '{}'", prompt)))
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

/// Uploader that records calls instead of contacting a bucket
#[derive(Default)]
pub struct RecordingUploader {
    uploads: Mutex<Vec<(PathBuf, String)>>,
    fail: bool,
}

impl RecordingUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// An uploader whose every upload fails
    pub fn failing() -> Self {
        Self {
            uploads: Mutex::default(),
            fail: true,
        }
    }

    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.uploads
            .lock()
            .map(|u| u.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl Uploader for RecordingUploader {
    async fn upload(&self, local_path: &Path, display_name: &str) -> IngestResult<UploadReceipt> {
        if self.fail {
            return Err(IngestError::upload("landing zone unreachable"));
        }

        let data = std::fs::read(local_path)?;
        self.uploads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((local_path.to_path_buf(), display_name.to_string()));

        Ok(UploadReceipt {
            location: format!("memory://landing/{}", display_name),
            checksum: sha256_hex(&data),
            size: data.len() as u64,
        })
    }
}
