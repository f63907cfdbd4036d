//! End-to-end ingestion runs against the in-memory warehouse

mod common;

use batchload_core::orchestrator::{CREATE_NEW_BATCH, USE_EXISTING_BATCH};
use batchload_core::prompt::FixedFilePicker;
use batchload_core::registry::CREATE_NEW_DATASOURCE;
use batchload_core::testing::{MemoryWarehouse, RecordingUploader, ScriptedPrompter};
use batchload_core::{
    IngestionOrchestrator, IngestionOutcome, IngestionReport, IngestionState, LedgerConfig,
    Table, TableRef, Value,
};
use common::{init_test_tracing, write_input, SALES_CSV};

fn ledger_with_pos() -> MemoryWarehouse {
    let warehouse = MemoryWarehouse::new();
    warehouse.seed_datasource(4, "POS", "Point of Sale", "Till exports");
    warehouse.seed_batch(9, 4);
    warehouse
}

fn completed(outcome: IngestionOutcome) -> IngestionReport {
    match outcome {
        IngestionOutcome::Completed(report) => report,
        IngestionOutcome::Aborted { states } => panic!("run aborted after {:?}", states),
    }
}

fn batch_table() -> TableRef {
    TableRef::parse("config.batch")
}

#[tokio::test]
async fn test_new_batch_run_loads_tagged_rows() {
    init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "sales.csv", SALES_CSV);

    let warehouse = ledger_with_pos();
    let uploader = RecordingUploader::new();
    let picker = FixedFilePicker(Some(input.clone()));
    let ledger = LedgerConfig::default();
    let mut prompter = ScriptedPrompter::new()
        .choose("raw")
        .text("sales_test")
        .choose(CREATE_NEW_BATCH)
        .choose("POS")
        .text("test load");

    let outcome = IngestionOrchestrator::new(&warehouse, &uploader, &picker, &ledger)
        .run(&mut prompter)
        .await
        .unwrap();
    let report = completed(outcome);

    assert_eq!(report.batch_id, 10);
    let batch = report.batch.clone().unwrap();
    assert_eq!(batch.datasource_id, 4);
    assert_eq!(batch.notes, "test load");
    assert_eq!(batch.source_location, "memory://landing/sales_datalake.csv");
    assert_eq!(batch.execution_env, "batchload automation");

    let target = TableRef::new("raw", "sales_test");
    let loaded = warehouse.table(&target).unwrap();
    assert_eq!(
        loaded.columns(),
        &["Region", "Total_Sales_percent", "batch_id", "created"]
    );
    assert_eq!(loaded.len(), 2);
    assert!(loaded.column("batch_id").unwrap().all(|v| *v == Value::Int(10)));
    assert!(loaded
        .column("created")
        .unwrap()
        .all(|v| *v == Value::Timestamp(report.created)));
    assert_eq!(report.rows_loaded, 2);

    // batch insert plus the load
    assert_eq!(warehouse.write_count(), 2);
    assert_eq!(warehouse.table(&batch_table()).unwrap().len(), 2);
    assert!(warehouse.is_closed());
    assert!(prompter.notices().iter().any(|n| n == "BATCH ID 10 CREATED"));

    assert_eq!(
        report.states,
        vec![
            IngestionState::SelectFile,
            IngestionState::Normalize,
            IngestionState::ChooseSchemaAndTable,
            IngestionState::Stage,
            IngestionState::Upload,
            IngestionState::ChooseBatchPath,
            IngestionState::CreateBatch,
            IngestionState::Tag,
            IngestionState::Load,
            IngestionState::Done,
        ]
    );
}

#[tokio::test]
async fn test_staged_artifact_carries_metadata_not_batch() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "sales.csv", SALES_CSV);

    let warehouse = ledger_with_pos();
    let uploader = RecordingUploader::new();
    let picker = FixedFilePicker(Some(input));
    let ledger = LedgerConfig::default();
    let mut prompter = ScriptedPrompter::new()
        .choose("raw")
        .text("sales_test")
        .choose(CREATE_NEW_BATCH)
        .choose("POS")
        .text("test load");

    let report = completed(
        IngestionOrchestrator::new(&warehouse, &uploader, &picker, &ledger)
            .run(&mut prompter)
            .await
            .unwrap(),
    );

    assert_eq!(report.staged_path, dir.path().join("sales_datalake.csv"));
    let staged = Table::read_csv(&report.staged_path).unwrap();
    assert_eq!(
        staged.columns(),
        &[
            "Region",
            "Total_Sales_percent",
            "metadata_created",
            "metadata_table_name"
        ]
    );
    assert!(staged
        .column("metadata_table_name")
        .unwrap()
        .all(|v| v.as_str() == Some("raw.sales_test")));

    let uploads = uploader.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1, "sales_datalake.csv");
}

#[tokio::test]
async fn test_input_batch_id_column_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "reload.csv", "Region,batch_id\nNorth,1\nSouth,2\n");

    let warehouse = ledger_with_pos();
    let uploader = RecordingUploader::new();
    let picker = FixedFilePicker(Some(input));
    let ledger = LedgerConfig::default();
    let mut prompter = ScriptedPrompter::new()
        .choose("raw")
        .text("reload")
        .choose(CREATE_NEW_BATCH)
        .choose("POS")
        .text("reload of an export");

    let report = completed(
        IngestionOrchestrator::new(&warehouse, &uploader, &picker, &ledger)
            .run(&mut prompter)
            .await
            .unwrap(),
    );

    let loaded = warehouse.table(&TableRef::new("raw", "reload")).unwrap();
    assert_eq!(loaded.columns(), &["Region", "batch_id", "created"]);
    assert!(loaded
        .column("batch_id")
        .unwrap()
        .all(|v| *v == Value::Int(report.batch_id)));
    assert_eq!(report.batch_id, 10);
}

#[tokio::test]
async fn test_header_quirks_normalize_like_source_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "indexed.csv",
        ",  Region,Total Sales (%)\n0,North,1\n1,South,2\n",
    );

    let warehouse = ledger_with_pos();
    let uploader = RecordingUploader::new();
    let picker = FixedFilePicker(Some(input));
    let ledger = LedgerConfig::default();
    let mut prompter = ScriptedPrompter::new()
        .choose("raw")
        .text("indexed")
        .choose(USE_EXISTING_BATCH)
        .text("9");

    completed(
        IngestionOrchestrator::new(&warehouse, &uploader, &picker, &ledger)
            .run(&mut prompter)
            .await
            .unwrap(),
    );

    let loaded = warehouse.table(&TableRef::new("raw", "indexed")).unwrap();
    assert_eq!(
        loaded.columns(),
        &["Unnamed_0", "__Region", "Total_Sales_percent", "batch_id", "created"]
    );
}

#[tokio::test]
async fn test_no_file_selected_aborts_without_side_effects() {
    let warehouse = ledger_with_pos();
    let uploader = RecordingUploader::new();
    let picker = FixedFilePicker(None);
    let ledger = LedgerConfig::default();
    let mut prompter = ScriptedPrompter::new();

    let outcome = IngestionOrchestrator::new(&warehouse, &uploader, &picker, &ledger)
        .run(&mut prompter)
        .await
        .unwrap();

    match outcome {
        IngestionOutcome::Aborted { states } => {
            assert_eq!(states, vec![IngestionState::SelectFile, IngestionState::Aborted]);
        },
        other => panic!("expected abort, got {:?}", other),
    }
    assert_eq!(warehouse.write_count(), 0);
    assert!(uploader.uploads().is_empty());
    assert!(warehouse.is_closed());
    assert_eq!(prompter.notices(), &["No file selected.".to_string()]);
}

#[tokio::test]
async fn test_existing_batch_run_reuses_id() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "sales.csv", SALES_CSV);

    let warehouse = ledger_with_pos();
    let uploader = RecordingUploader::new();
    let picker = FixedFilePicker(Some(input));
    let ledger = LedgerConfig::default();
    let mut prompter = ScriptedPrompter::new()
        .choose("raw_third_party")
        .text("sales_test")
        .choose(USE_EXISTING_BATCH)
        .text("abc")
        .text("9");

    let report = completed(
        IngestionOrchestrator::new(&warehouse, &uploader, &picker, &ledger)
            .run(&mut prompter)
            .await
            .unwrap(),
    );

    assert_eq!(report.batch_id, 9);
    assert!(report.batch.is_none());
    assert!(report.states.contains(&IngestionState::ReuseBatch));
    assert!(!report.states.contains(&IngestionState::CreateBatch));

    // only the load writes; the ledger is untouched
    assert_eq!(warehouse.write_count(), 1);
    assert_eq!(warehouse.table(&batch_table()).unwrap().len(), 1);

    let loaded = warehouse
        .table(&TableRef::new("raw_third_party", "sales_test"))
        .unwrap();
    assert!(loaded.column("batch_id").unwrap().all(|v| *v == Value::Int(9)));
    assert!(prompter.notices()[0].contains("not an integer"));
}

#[tokio::test]
async fn test_new_datasource_then_new_batch() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "orders.csv", "Order Id,Amount\n1,10\n2,20\n");

    let warehouse = MemoryWarehouse::new();
    let uploader = RecordingUploader::new();
    let picker = FixedFilePicker(Some(input));
    let ledger = LedgerConfig::default();
    let mut prompter = ScriptedPrompter::new()
        .choose("raw")
        .text("   ")
        .text("orders")
        .choose(CREATE_NEW_BATCH)
        .choose(CREATE_NEW_DATASOURCE)
        .text("ERP")
        .text("Enterprise Resource Planning")
        .text("")
        .text("first load");

    let report = completed(
        IngestionOrchestrator::new(&warehouse, &uploader, &picker, &ledger)
            .run(&mut prompter)
            .await
            .unwrap(),
    );

    assert_eq!(report.batch_id, 1);
    assert_eq!(report.batch.unwrap().datasource_id, 1);
    assert_eq!(report.target, TableRef::new("raw", "orders"));
    assert_eq!(warehouse.write_count(), 3);
    assert_eq!(warehouse.create_count(), 1);
}

#[tokio::test]
async fn test_upload_failure_leaves_ledger_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "sales.csv", SALES_CSV);

    let warehouse = ledger_with_pos();
    let uploader = RecordingUploader::failing();
    let picker = FixedFilePicker(Some(input));
    let ledger = LedgerConfig::default();
    let mut prompter = ScriptedPrompter::new().choose("raw").text("sales_test");

    let result = IngestionOrchestrator::new(&warehouse, &uploader, &picker, &ledger)
        .run(&mut prompter)
        .await;

    assert!(result.is_err());
    assert_eq!(warehouse.write_count(), 0);
    assert!(warehouse.is_closed());
}

#[tokio::test]
async fn test_ledger_failure_after_upload_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "sales.csv", SALES_CSV);

    let warehouse = ledger_with_pos();
    warehouse.fail_writes("connection reset by peer");
    let uploader = RecordingUploader::new();
    let picker = FixedFilePicker(Some(input));
    let ledger = LedgerConfig::default();
    let mut prompter = ScriptedPrompter::new()
        .choose("raw")
        .text("sales_test")
        .choose(CREATE_NEW_BATCH)
        .choose("POS")
        .text("test load");

    let result = IngestionOrchestrator::new(&warehouse, &uploader, &picker, &ledger)
        .run(&mut prompter)
        .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("connection reset by peer"));
    // the uploaded artifact is not rolled back
    assert_eq!(uploader.uploads().len(), 1);
    assert!(warehouse.table(&TableRef::new("raw", "sales_test")).is_none());
    assert!(warehouse.is_closed());
}

#[tokio::test]
async fn test_outcome_serializes_with_tag() {
    let warehouse = MemoryWarehouse::new();
    let uploader = RecordingUploader::new();
    let picker = FixedFilePicker(None);
    let ledger = LedgerConfig::default();

    let outcome = IngestionOrchestrator::new(&warehouse, &uploader, &picker, &ledger)
        .run(&mut ScriptedPrompter::new())
        .await
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "aborted");
    assert_eq!(json["states"][1], "Aborted");
}
