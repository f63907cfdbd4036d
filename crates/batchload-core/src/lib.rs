//! Batchload Core Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! CSV ingestion with a batch ledger.
//!
//! # Overview
//!
//! One run of the [`IngestionOrchestrator`] takes a CSV chosen by the
//! operator through these steps:
//!
//! - **Normalize**: header cleanup ([`columns`])
//! - **Stage**: annotated copy written next to the input and uploaded to
//!   the landing zone ([`staging`], [`storage`])
//! - **Ledger**: the run is tagged with a new or existing batch id, new
//!   batches reference a registered data source ([`ledger`], [`registry`])
//! - **Load**: rows land in the chosen `schema.table`, which is created on
//!   first use ([`provisioner`], [`warehouse`])
//!
//! Interaction goes through the [`Prompter`] and [`FilePicker`] traits so a
//! run can be driven from a terminal or from a script.
//!
//! # Example
//!
//! ```no_run
//! use batchload_core::{AppConfig, IngestionOrchestrator, PgWarehouse, S3Uploader};
//! use batchload_core::prompt::{FixedFilePicker, Prompter};
//!
//! async fn ingest(prompter: &mut dyn Prompter) -> batchload_core::IngestResult<()> {
//!     let config = AppConfig::load()?;
//!     let warehouse = PgWarehouse::connect(&config.warehouse).await?;
//!     let uploader = S3Uploader::new(config.storage.clone()).await?;
//!     let picker = FixedFilePicker(Some("sales.csv".into()));
//!
//!     IngestionOrchestrator::new(&warehouse, &uploader, &picker, &config.ledger)
//!         .run(prompter)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod columns;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod provisioner;
pub mod registry;
pub mod staging;
pub mod storage;
pub mod table;
pub mod testing;
pub mod warehouse;

pub use config::{AppConfig, LedgerConfig, WarehouseConfig};
pub use error::{IngestError, IngestResult};
pub use ledger::BatchLedger;
pub use models::{Batch, DataSource};
pub use orchestrator::{IngestionOrchestrator, IngestionOutcome, IngestionReport, IngestionState};
pub use prompt::{FilePicker, Prompter};
pub use registry::DataSourceRegistry;
pub use storage::{S3Uploader, StorageConfig, UploadReceipt, Uploader};
pub use table::{Table, TableRef, Value};
pub use warehouse::{PgWarehouse, Warehouse};
