//! Ingestion run orchestration
//!
//! Drives one run through its states:
//!
//! ```text
//! SelectFile -> Normalize -> ChooseSchemaAndTable -> Stage -> Upload
//!   -> ChooseBatchPath -> (CreateBatch | ReuseBatch) -> Tag -> Load -> Done
//! SelectFile -> Aborted            (no file chosen)
//! ```
//!
//! The target table is chosen before staging because the staged artifact
//! records it in `metadata_table_name`. Runs hold no state between
//! invocations; the warehouse connection is closed when a run ends, whether
//! it completed, aborted or failed. An error after the upload leaves the
//! uploaded artifact in place.

use crate::columns::{duplicate_names, normalize_columns};
use crate::config::LedgerConfig;
use crate::error::{IngestError, IngestResult};
use crate::ledger::BatchLedger;
use crate::models::Batch;
use crate::prompt::{FileFilter, FilePicker, Prompter};
use crate::provisioner::TableProvisioner;
use crate::registry::DataSourceRegistry;
use crate::staging;
use crate::storage::Uploader;
use crate::table::{Table, TableRef};
use crate::warehouse::Warehouse;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

pub const CREATE_NEW_BATCH: &str = "Create New Batch ID";
pub const USE_EXISTING_BATCH: &str = "Use Existing Batch ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IngestionState {
    SelectFile,
    Normalize,
    ChooseSchemaAndTable,
    Stage,
    Upload,
    ChooseBatchPath,
    CreateBatch,
    ReuseBatch,
    Tag,
    Load,
    Done,
    Aborted,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub input: PathBuf,
    pub staged_path: PathBuf,
    pub source_location: String,
    pub staged_checksum: String,
    pub target: TableRef,
    pub batch_id: i64,
    /// Present when the run created the batch
    pub batch: Option<Batch>,
    pub rows_loaded: u64,
    pub created: DateTime<Utc>,
    pub states: Vec<IngestionState>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestionOutcome {
    Aborted { states: Vec<IngestionState> },
    Completed(IngestionReport),
}

pub struct IngestionOrchestrator<'a> {
    warehouse: &'a dyn Warehouse,
    uploader: &'a dyn Uploader,
    picker: &'a dyn FilePicker,
    ledger: &'a LedgerConfig,
}

/// Visited states, logged as they are entered
struct Trail(Vec<IngestionState>);

impl Trail {
    fn enter(&mut self, state: IngestionState) {
        debug!(?state, "Entering state");
        self.0.push(state);
    }
}

impl<'a> IngestionOrchestrator<'a> {
    pub fn new(
        warehouse: &'a dyn Warehouse,
        uploader: &'a dyn Uploader,
        picker: &'a dyn FilePicker,
        ledger: &'a LedgerConfig,
    ) -> Self {
        Self {
            warehouse,
            uploader,
            picker,
            ledger,
        }
    }

    /// Run one ingestion end to end and close the warehouse connection.
    pub async fn run(&self, prompter: &mut dyn Prompter) -> IngestResult<IngestionOutcome> {
        let result = self.execute(prompter).await;
        self.warehouse.close().await;

        if let Err(ref e) = result {
            warn!(error = %e, "Ingestion run failed");
        }
        result
    }

    #[instrument(skip_all)]
    async fn execute(&self, prompter: &mut dyn Prompter) -> IngestResult<IngestionOutcome> {
        let mut trail = Trail(Vec::new());

        trail.enter(IngestionState::SelectFile);
        let Some(input) = self.picker.pick_file(&FileFilter::csv())? else {
            info!("No file selected");
            prompter.notify("No file selected.");
            trail.enter(IngestionState::Aborted);
            return Ok(IngestionOutcome::Aborted { states: trail.0 });
        };
        info!(file = %input.display(), "Selected input file");

        trail.enter(IngestionState::Normalize);
        let normalized = read_normalized(&input)?;

        trail.enter(IngestionState::ChooseSchemaAndTable);
        let schema = prompter.choose_one("Select target schema:", &self.ledger.target_schemas)?;
        let table_name = read_table_name(prompter)?;
        let target = TableRef::new(schema, table_name);

        trail.enter(IngestionState::Stage);
        let staged = staging::stage(&normalized, &target, Utc::now());
        let staged_path = staging::write_staged(&staged, &input)?;
        info!(path = %staged_path.display(), "Wrote staged artifact");

        trail.enter(IngestionState::Upload);
        let display_name = staged_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| IngestError::upload("staged path has no file name"))?;
        let receipt = self.uploader.upload(&staged_path, &display_name).await?;

        trail.enter(IngestionState::ChooseBatchPath);
        let options = [CREATE_NEW_BATCH.to_string(), USE_EXISTING_BATCH.to_string()];
        let choice = prompter.choose_one("Select a batch option:", &options)?;
        let ledger = BatchLedger::new(self.warehouse, self.ledger);

        let (batch_id, batch) = if choice == CREATE_NEW_BATCH {
            trail.enter(IngestionState::CreateBatch);
            let registry =
                DataSourceRegistry::new(self.warehouse, self.ledger.datasource_table.clone());
            let datasource_id = registry.resolve_or_create(prompter).await?;
            let notes =
                prompter.read_text("Please insert note to include in batch table entry:")?;
            let batch = ledger
                .create_batch(&receipt.location, &notes, datasource_id)
                .await?;
            prompter.notify(&format!("BATCH ID {} CREATED", batch.id));
            (batch.id, Some(batch))
        } else {
            trail.enter(IngestionState::ReuseBatch);
            (ledger.use_existing_batch_id(prompter).await?, None)
        };

        trail.enter(IngestionState::Tag);
        let created = Utc::now();
        let tagged = staging::tag(&normalized, batch_id, created);

        trail.enter(IngestionState::Load);
        let rows_loaded = TableProvisioner::new(self.warehouse)
            .load(&target.schema, &target.name, &tagged)
            .await?;

        trail.enter(IngestionState::Done);
        info!(batch_id, table = %target, rows_loaded, "Ingestion complete");

        Ok(IngestionOutcome::Completed(IngestionReport {
            input,
            staged_path,
            source_location: receipt.location,
            staged_checksum: receipt.checksum,
            target,
            batch_id,
            batch,
            rows_loaded,
            created,
            states: trail.0,
        }))
    }
}

/// Read the input CSV and normalize its header.
fn read_normalized(input: &std::path::Path) -> IngestResult<Table> {
    let raw = Table::read_csv(input)?;
    let names = normalize_columns(raw.columns());

    let dupes = duplicate_names(&names);
    if !dupes.is_empty() {
        warn!(columns = ?dupes, "Normalized column names collide");
    }

    Ok(raw.rename_columns(names))
}

fn read_table_name(prompter: &mut dyn Prompter) -> IngestResult<String> {
    loop {
        let name = prompter.read_text("Enter desired table name to write:")?;
        let name = name.trim();
        if name.is_empty() {
            prompter.notify("The table name cannot be empty. Try again.");
            continue;
        }
        return Ok(name.to_string());
    }
}
