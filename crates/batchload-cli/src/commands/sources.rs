//! `batchload sources`

use super::open_ledger;
use crate::Result;
use batchload_core::{DataSource, DataSourceRegistry, Warehouse};
use colored::Colorize;

pub async fn run(json: bool) -> Result<()> {
    let (warehouse, ledger) = open_ledger().await?;

    let result = DataSourceRegistry::new(&warehouse, ledger.datasource_table.clone())
        .list_sources()
        .await;
    warehouse.close().await;
    let sources = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sources)?);
    } else if sources.is_empty() {
        println!("{}", "No data sources registered".yellow());
    } else {
        println!("{}", render_table(&sources));
    }
    Ok(())
}

fn render_table(sources: &[DataSource]) -> comfy_table::Table {
    use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["ID", "Name", "Full Name", "Description"]);

    for source in sources {
        table.add_row(vec![
            source.id.to_string(),
            source.name.clone(),
            source.full_name.clone(),
            source.description.clone(),
        ]);
    }
    table
}
