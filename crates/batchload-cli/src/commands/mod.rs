//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod ingest;
pub mod init_ledger;
pub mod sources;

use crate::Result;
use batchload_core::{LedgerConfig, PgWarehouse, WarehouseConfig};

/// Open the warehouse for commands that only touch the ledger.
///
/// Storage settings are not read, so these commands work without bucket
/// credentials.
pub(crate) async fn open_ledger() -> Result<(PgWarehouse, LedgerConfig)> {
    dotenvy::dotenv().ok();

    let warehouse_config = WarehouseConfig::from_env()?;
    warehouse_config.validate()?;
    let ledger = LedgerConfig::from_env()?;
    ledger.validate()?;

    let warehouse = PgWarehouse::connect(&warehouse_config).await?;
    Ok((warehouse, ledger))
}
