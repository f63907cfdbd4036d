//! Data-source registry
//!
//! Lets the operator pick a registered upstream source or register a new one.
//! Picking an existing source never writes; registering performs exactly one
//! insert whose id is `max(existing ids) + 1`.

use crate::error::IngestResult;
use crate::ledger::next_id;
use crate::models::{DataSource, RowReader};
use crate::prompt::Prompter;
use crate::table::{TableRef, Value};
use crate::warehouse::Warehouse;
use tracing::{info, instrument};

/// First choice offered by [`DataSourceRegistry::resolve_or_create`]
pub const CREATE_NEW_DATASOURCE: &str = "Create a new datasource";

pub struct DataSourceRegistry<'a> {
    warehouse: &'a dyn Warehouse,
    table: TableRef,
}

impl<'a> DataSourceRegistry<'a> {
    pub fn new(warehouse: &'a dyn Warehouse, table: TableRef) -> Self {
        Self { warehouse, table }
    }

    /// All registered sources, ordered by id
    #[instrument(skip(self))]
    pub async fn list_sources(&self) -> IngestResult<Vec<DataSource>> {
        let sql = format!(
            "SELECT id, name, full_name, descr FROM {} ORDER BY id",
            self.table.quoted()
        );
        let table = self.warehouse.query_table(&sql).await?;
        let reader = RowReader::new(&table, &sql);

        table
            .rows()
            .iter()
            .map(|row| {
                Ok(DataSource {
                    id: reader.int(row, "id")?,
                    name: reader.text(row, "name")?,
                    full_name: reader.text(row, "full_name")?,
                    description: reader.text(row, "descr")?,
                })
            })
            .collect()
    }

    /// Id the next registered source will receive
    pub async fn next_source_id(&self) -> IngestResult<i64> {
        let sources = self.list_sources().await?;
        Ok(next_id(sources.iter().map(|s| s.id)))
    }

    /// Let the operator choose a source, registering a new one on request.
    #[instrument(skip(self, prompter))]
    pub async fn resolve_or_create(&self, prompter: &mut dyn Prompter) -> IngestResult<i64> {
        let sources = self.list_sources().await?;

        let mut options = Vec::with_capacity(sources.len() + 1);
        options.push(CREATE_NEW_DATASOURCE.to_string());
        options.extend(sources.iter().map(|s| s.name.clone()));

        let choice =
            prompter.choose_one("Select a data source or create a new one:", &options)?;

        // The sentinel wins over a registered source that shares its label.
        if choice != CREATE_NEW_DATASOURCE {
            if let Some(existing) = sources.iter().find(|s| s.name == choice) {
                info!(datasource_id = existing.id, name = %existing.name, "Using existing data source");
                return Ok(existing.id);
            }
        }

        let name = Self::read_new_name(prompter, &sources)?;
        let full_name = prompter.read_text("Enter the full name:")?;
        let description = prompter.read_text("Enter the description:")?;

        let id = self
            .warehouse
            .insert_with_next_id(
                &self.table,
                &["name", "full_name", "descr"],
                vec![
                    Value::Text(name.clone()),
                    Value::Text(full_name),
                    Value::Text(description),
                ],
            )
            .await?;

        info!(datasource_id = id, name = %name, "Registered data source");
        Ok(id)
    }

    /// Names are the registry key: re-prompt until non-empty and unused.
    fn read_new_name(prompter: &mut dyn Prompter, sources: &[DataSource]) -> IngestResult<String> {
        loop {
            let name = prompter.read_text("Enter the name:")?.trim().to_string();
            if name.is_empty() {
                prompter.notify("The name cannot be empty. Try again.");
            } else if name == CREATE_NEW_DATASOURCE || sources.iter().any(|s| s.name == name) {
                prompter.notify(&format!("A data source named '{}' already exists. Try again.", name));
            } else {
                return Ok(name);
            }
        }
    }
}
