//! Batch ledger
//!
//! Every ingestion run is tagged with a batch id. A run either creates a new
//! batch record (the only path that produces one) or reuses an id the
//! operator types in.
//!
//! # Id allocation
//!
//! New ids are `max(existing) + 1`, starting at 1 on an empty ledger. The
//! read and the insert happen inside one warehouse call
//! ([`Warehouse::insert_with_next_id`]) so two concurrent runs cannot both
//! claim the same id.
//!
//! # Reused ids
//!
//! By default a typed-in id is trusted without a lookup. With
//! `verify_existing_batch` enabled the ledger re-prompts until the id names a
//! real batch.

use crate::config::LedgerConfig;
use crate::error::IngestResult;
use crate::models::{Batch, RowReader};
use crate::prompt::Prompter;
use crate::table::{TableRef, Value};
use crate::warehouse::Warehouse;
use tracing::{info, instrument, warn};

/// `max(existing) + 1`, or 1 when there are no ids yet
pub fn next_id<I>(existing: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    existing.into_iter().max().map_or(1, |max| max + 1)
}

pub struct BatchLedger<'a> {
    warehouse: &'a dyn Warehouse,
    table: TableRef,
    execution_env: String,
    verify_existing: bool,
}

impl<'a> BatchLedger<'a> {
    pub fn new(warehouse: &'a dyn Warehouse, config: &LedgerConfig) -> Self {
        Self {
            warehouse,
            table: config.batch_table.clone(),
            execution_env: config.execution_env.clone(),
            verify_existing: config.verify_existing_batch,
        }
    }

    /// Id the next created batch will receive
    #[instrument(skip(self))]
    pub async fn next_batch_id(&self) -> IngestResult<i64> {
        let sql = format!("SELECT MAX(id) AS max_id FROM {}", self.table.quoted());
        let result = self.warehouse.query_table(&sql).await?;
        let reader = RowReader::new(&result, &sql);

        let max = match result.rows().first() {
            Some(row) => reader.optional_int(row, "max_id")?,
            None => None,
        };

        Ok(next_id(max))
    }

    /// Allocate, stamp and persist a new batch.
    #[instrument(skip(self, notes))]
    pub async fn create_batch(
        &self,
        source_location: &str,
        notes: &str,
        datasource_id: i64,
    ) -> IngestResult<Batch> {
        let id = self
            .warehouse
            .insert_with_next_id(
                &self.table,
                &["datasource_id", "notes", "source_location", "execution_env"],
                vec![
                    Value::Int(datasource_id),
                    Value::from(notes),
                    Value::from(source_location),
                    Value::from(self.execution_env.as_str()),
                ],
            )
            .await?;

        let batch = Batch {
            id,
            datasource_id,
            notes: notes.to_string(),
            source_location: source_location.to_string(),
            execution_env: self.execution_env.clone(),
        };

        info!(batch_id = batch.id, datasource_id, "Batch created");
        Ok(batch)
    }

    /// Look up a batch record by id
    pub async fn get_batch(&self, id: i64) -> IngestResult<Option<Batch>> {
        let sql = format!(
            "SELECT id, datasource_id, notes, source_location, execution_env FROM {} WHERE id = {}",
            self.table.quoted(),
            id
        );
        let result = self.warehouse.query_table(&sql).await?;
        let reader = RowReader::new(&result, &sql);

        result
            .rows()
            .first()
            .map(|row| {
                Ok(Batch {
                    id: reader.int(row, "id")?,
                    datasource_id: reader.int(row, "datasource_id")?,
                    notes: reader.text(row, "notes")?,
                    source_location: reader.text(row, "source_location")?,
                    execution_env: reader.text(row, "execution_env")?,
                })
            })
            .transpose()
    }

    pub async fn batch_exists(&self, id: i64) -> IngestResult<bool> {
        Ok(self.get_batch(id).await?.is_some())
    }

    /// Ask for an existing batch id until the input parses as an integer.
    ///
    /// The parsed value is returned unmodified. Existence is only checked
    /// when the ledger was configured with `verify_existing_batch`.
    #[instrument(skip(self, prompter))]
    pub async fn use_existing_batch_id(&self, prompter: &mut dyn Prompter) -> IngestResult<i64> {
        loop {
            let input = prompter.read_text("Enter existing batch ID:")?;

            let id = match parse_batch_id(&input) {
                Some(id) => id,
                None => {
                    warn!(input = %input, "Rejected non-integer batch id");
                    prompter.notify("That's not an integer. Try again.");
                    continue;
                },
            };

            if self.verify_existing && !self.batch_exists(id).await? {
                warn!(batch_id = id, "Rejected unknown batch id");
                prompter.notify(&format!("Batch {} does not exist. Try again.", id));
                continue;
            }

            info!(batch_id = id, "Reusing existing batch");
            return Ok(id);
        }
    }
}

/// Integer parse tolerant of surrounding whitespace
fn parse_batch_id(input: &str) -> Option<i64> {
    input.trim().parse().ok()
}
