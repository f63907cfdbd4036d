//! `batchload init-ledger`

use super::open_ledger;
use crate::Result;
use batchload_core::Warehouse;
use colored::Colorize;

pub async fn run() -> Result<()> {
    let (warehouse, ledger) = open_ledger().await?;

    let result = warehouse.init_ledger(&ledger).await;
    warehouse.close().await;
    result?;

    println!(
        "{} Ledger ready: {} and {}",
        "✓".green(),
        ledger.datasource_table.qualified().cyan(),
        ledger.batch_table.qualified().cyan()
    );
    Ok(())
}
