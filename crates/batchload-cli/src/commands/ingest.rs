//! `batchload ingest`

use crate::picker::InquireFilePicker;
use crate::prompt::InquirePrompter;
use crate::{CliError, Result};
use batchload_core::prompt::{FilePicker, FixedFilePicker};
use batchload_core::{
    AppConfig, IngestionOrchestrator, IngestionOutcome, IngestionReport, PgWarehouse, S3Uploader,
};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

pub async fn run(file: Option<PathBuf>, json: bool) -> Result<()> {
    if let Some(path) = &file {
        if !path.is_file() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }
    }

    let config = AppConfig::load()?;
    info!(warehouse = ?config.warehouse, storage = ?config.storage, "Loaded configuration");

    let warehouse = PgWarehouse::connect(&config.warehouse).await?;
    let uploader = S3Uploader::new(config.storage.clone()).await?;
    let picker: Box<dyn FilePicker> = match file {
        Some(path) => Box::new(FixedFilePicker(Some(path))),
        None => Box::new(InquireFilePicker::new(std::env::current_dir()?)),
    };
    let mut prompter = InquirePrompter::new();

    let outcome = IngestionOrchestrator::new(&warehouse, &uploader, picker.as_ref(), &config.ledger)
        .run(&mut prompter)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        IngestionOutcome::Aborted { .. } => println!("{}", "Nothing ingested".yellow()),
        IngestionOutcome::Completed(report) => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &IngestionReport) {
    println!();
    println!(
        "{} Loaded {} rows into {} with batch {}",
        "✓".green(),
        report.rows_loaded,
        report.target.qualified().cyan(),
        report.batch_id.to_string().bold()
    );
    println!("  Staged:   {}", report.staged_path.display());
    println!("  Uploaded: {}", report.source_location);
    println!("  SHA-256:  {}", report.staged_checksum);
}
