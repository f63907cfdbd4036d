//! Destination table provisioning
//!
//! Loads a tagged dataset into `schema.table`, creating the table from the
//! dataset's inferred column types when it does not exist yet. Existing
//! tables are appended to as-is: a type clash between loads is left for the
//! warehouse to reject.

use crate::error::IngestResult;
use crate::table::{Table, TableRef, Value};
use crate::warehouse::{ColumnDef, ColumnType, Warehouse};
use tracing::{info, instrument};

pub struct TableProvisioner<'a> {
    warehouse: &'a dyn Warehouse,
}

impl<'a> TableProvisioner<'a> {
    pub fn new(warehouse: &'a dyn Warehouse) -> Self {
        Self { warehouse }
    }

    /// Create-if-absent, then append every row. Returns the rows written.
    #[instrument(skip(self, data), fields(rows = data.len()))]
    pub async fn load(&self, schema: &str, table: &str, data: &Table) -> IngestResult<u64> {
        let target = TableRef::new(schema, table);

        if !self.warehouse.table_exists(&target).await? {
            let columns = infer_columns(data);
            info!(table = %target, columns = columns.len(), "Creating destination table");
            self.warehouse.create_table(&target, &columns).await?;
        }

        let written = self.warehouse.insert_rows(&target, data).await?;
        info!(table = %target, rows = written, "Loaded rows");
        Ok(written)
    }
}

/// One column definition per dataset column, typed from its values.
pub fn infer_columns(data: &Table) -> Vec<ColumnDef> {
    data.columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let column_type = data
                .rows()
                .iter()
                .map(|row| &row[idx])
                .fold(None, widen);
            ColumnDef::new(name.clone(), column_type.unwrap_or(ColumnType::Text))
        })
        .collect()
}

/// Fold step: the narrowest type holding everything seen so far.
fn widen(current: Option<ColumnType>, value: &Value) -> Option<ColumnType> {
    let next = match value {
        Value::Null => return current,
        Value::Int(_) => ColumnType::BigInt,
        Value::Float(_) => ColumnType::Double,
        Value::Bool(_) => ColumnType::Boolean,
        Value::Text(_) => ColumnType::Text,
        Value::Timestamp(_) => ColumnType::Timestamp,
    };

    Some(match (current, next) {
        (None, t) => t,
        (Some(a), b) if a == b => a,
        (Some(ColumnType::BigInt), ColumnType::Double)
        | (Some(ColumnType::Double), ColumnType::BigInt) => ColumnType::Double,
        _ => ColumnType::Text,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::testing::MemoryWarehouse;
    use chrono::Utc;

    fn dataset() -> Table {
        Table::from_rows(
            vec!["region".into(), "qty".into(), "ratio".into(), "note".into()],
            vec![
                vec!["North".into(), Value::Int(1), Value::Int(2), Value::Null],
                vec!["South".into(), Value::Int(3), Value::Float(0.5), Value::Null],
            ],
        )
    }

    #[test]
    fn test_infer_columns_widens_and_defaults() {
        let columns = infer_columns(&dataset());
        let types: Vec<ColumnType> = columns.iter().map(|c| c.column_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Text,
                ColumnType::BigInt,
                ColumnType::Double,
                ColumnType::Text
            ]
        );
    }

    #[test]
    fn test_infer_columns_mixed_falls_back_to_text() {
        let data = Table::from_rows(
            vec!["mixed".into(), "created".into()],
            vec![
                vec![Value::Bool(true), Value::Timestamp(Utc::now())],
                vec![Value::Int(1), Value::Null],
            ],
        );
        let columns = infer_columns(&data);
        assert_eq!(columns[0].column_type, ColumnType::Text);
        assert_eq!(columns[1].column_type, ColumnType::Timestamp);
    }

    #[tokio::test]
    async fn test_load_creates_missing_table() {
        let warehouse = MemoryWarehouse::new();
        let provisioner = TableProvisioner::new(&warehouse);

        let written = provisioner.load("raw", "sales", &dataset()).await.unwrap();

        assert_eq!(written, 2);
        let target = TableRef::new("raw", "sales");
        assert_eq!(warehouse.created_columns(&target).unwrap().len(), 4);
        assert_eq!(warehouse.table(&target).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_load_appends_to_existing_table() {
        let warehouse = MemoryWarehouse::new();
        let provisioner = TableProvisioner::new(&warehouse);

        provisioner.load("raw", "sales", &dataset()).await.unwrap();
        provisioner.load("raw", "sales", &dataset()).await.unwrap();

        let target = TableRef::new("raw", "sales");
        assert_eq!(warehouse.table(&target).unwrap().len(), 4);
        assert_eq!(warehouse.create_count(), 1);
    }
}
