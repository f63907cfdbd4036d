//! PostgreSQL warehouse
//!
//! The pool holds a single connection: a run is strictly sequential and the
//! connection stays open until [`Warehouse::close`] at the end of the run.

use super::{ColumnDef, Warehouse};
use crate::config::{LedgerConfig, WarehouseConfig};
use crate::error::{IngestError, IngestResult};
use crate::table::{quote_ident, Table, TableRef, Value};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::query_builder::Separated;
use sqlx::{Column, Postgres, QueryBuilder, Row, TypeInfo};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Postgres caps bind parameters per statement at 65535.
const MAX_BIND_PARAMS: usize = 65_535;

#[derive(Clone)]
pub struct PgWarehouse {
    pool: PgPool,
}

impl PgWarehouse {
    pub async fn connect(config: &WarehouseConfig) -> IngestResult<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.dbname)
            .username(&config.username)
            .password(&config.password);

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await?;

        info!(
            host = %config.host,
            dbname = %config.dbname,
            "Warehouse connection opened"
        );

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the data-source and batch tables (and their schemas) if absent.
    #[instrument(skip(self))]
    pub async fn init_ledger(&self, ledger: &LedgerConfig) -> IngestResult<()> {
        let sources = ledger.datasource_table.quoted();
        let batches = ledger.batch_table.quoted();

        let statements = [
            format!(
                "CREATE SCHEMA IF NOT EXISTS {}",
                quote_ident(&ledger.datasource_table.schema)
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {sources} (
                    id BIGINT PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    full_name TEXT,
                    descr TEXT
                )"
            ),
            format!(
                "CREATE SCHEMA IF NOT EXISTS {}",
                quote_ident(&ledger.batch_table.schema)
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {batches} (
                    id BIGINT PRIMARY KEY,
                    datasource_id BIGINT NOT NULL REFERENCES {sources} (id),
                    notes TEXT,
                    source_location TEXT,
                    execution_env TEXT NOT NULL
                )"
            ),
        ];

        let mut tx = self.pool.begin().await?;
        for statement in &statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        info!(
            datasource_table = %ledger.datasource_table,
            batch_table = %ledger.batch_table,
            "Ledger tables ready"
        );
        Ok(())
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    #[instrument(skip(self))]
    async fn query_table(&self, sql: &str) -> IngestResult<Table> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;

        let Some(first) = rows.first() else {
            return Ok(Table::default());
        };

        let columns = first
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let mut table = Table::new(columns);

        for row in &rows {
            table.push_row(decode_row(row)?);
        }

        debug!(rows = table.len(), "Query returned");
        Ok(table)
    }

    #[instrument(skip(self, rows), fields(table = %table, rows = rows.len()))]
    async fn insert_rows(&self, table: &TableRef, rows: &Table) -> IngestResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let column_list = rows
            .columns()
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let chunk_size = (MAX_BIND_PARAMS / rows.columns().len().max(1)).max(1);

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in rows.rows().chunks(chunk_size) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("INSERT INTO {} ({}) ", table.quoted(), column_list));

            builder.push_values(chunk.iter(), |mut b, row| {
                for value in row {
                    push_value(&mut b, value);
                }
            });

            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        debug!(inserted, "Rows inserted");
        Ok(inserted)
    }

    #[instrument(skip(self, values), fields(table = %table))]
    async fn insert_with_next_id(
        &self,
        table: &TableRef,
        columns: &[&str],
        values: Vec<Value>,
    ) -> IngestResult<i64> {
        let quoted = table.quoted();
        let lock = format!("LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE", quoted);
        let next = format!("SELECT COALESCE(MAX(id), 0)::BIGINT + 1 FROM {}", quoted);

        // The lock serializes allocators; plain readers are not blocked.
        let mut tx = self.pool.begin().await?;
        sqlx::query(&lock).execute(&mut *tx).await?;
        let id: i64 = sqlx::query_scalar(&next).fetch_one(&mut *tx).await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO {} (id", quoted));
        for column in columns {
            builder.push(", ").push(quote_ident(column));
        }
        builder.push(") VALUES (");
        {
            let mut values_list = builder.separated(", ");
            values_list.push_bind(id);
            for value in &values {
                push_value(&mut values_list, value);
            }
        }
        builder.push(")");

        builder.build().execute(&mut *tx).await?;
        tx.commit().await?;

        debug!(id, "Allocated id");
        Ok(id)
    }

    async fn table_exists(&self, table: &TableRef) -> IngestResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = $1 AND table_name = $2
            )
            "#,
        )
        .bind(&table.schema)
        .bind(&table.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[instrument(skip(self, columns), fields(table = %table))]
    async fn create_table(&self, table: &TableRef, columns: &[ColumnDef]) -> IngestResult<()> {
        let definitions = columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql()))
            .collect::<Vec<_>>()
            .join(", ");
        let ddl = format!("CREATE TABLE {} ({})", table.quoted(), definitions);

        sqlx::query(&ddl).execute(&self.pool).await?;
        info!(columns = columns.len(), "Created destination table");
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("Warehouse connection closed");
    }
}

fn push_value(builder: &mut Separated<'_, '_, Postgres, &'static str>, value: &Value) {
    match value {
        Value::Null => {
            builder.push("NULL");
        },
        Value::Int(v) => {
            builder.push_bind(*v);
        },
        Value::Float(v) => {
            builder.push_bind(*v);
        },
        Value::Bool(v) => {
            builder.push_bind(*v);
        },
        Value::Text(v) => {
            builder.push_bind(v.clone());
        },
        Value::Timestamp(v) => {
            builder.push_bind(*v);
        },
    }
}

fn decode_row(row: &PgRow) -> IngestResult<Vec<Value>> {
    (0..row.columns().len()).map(|idx| decode_cell(row, idx)).collect()
}

fn decode_cell(row: &PgRow, idx: usize) -> IngestResult<Value> {
    let column = &row.columns()[idx];
    let value = match column.type_info().name() {
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(|v| Value::Int(v.into())),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(|v| Value::Int(v.into())),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::Int),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx)?.map(|v| Value::Float(v.into())),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(Value::Float),
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::Bool),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(idx)?.map(Value::Text)
        },
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(Value::Timestamp),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|v| Value::Timestamp(v.and_utc())),
        other => {
            return Err(IngestError::UnsupportedType {
                column: column.name().to_string(),
                type_name: other.to_string(),
            })
        },
    };

    Ok(value.unwrap_or(Value::Null))
}
