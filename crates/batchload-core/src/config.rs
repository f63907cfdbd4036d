//! Configuration management
//!
//! Connection credentials and ledger locations come from the environment
//! (optionally via a `.env` file). Nothing is hard-coded.

use crate::error::{IngestError, IngestResult};
use crate::storage::config::StorageConfig;
use crate::table::TableRef;
use batchload_common::env::{env_list, env_or, env_parse};
use std::fmt;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default warehouse host.
pub const DEFAULT_DB_HOST: &str = "localhost";

/// Default warehouse port.
pub const DEFAULT_DB_PORT: u16 = 5432;

/// Default warehouse database name.
pub const DEFAULT_DB_NAME: &str = "warehouse";

/// Default connection timeout in seconds.
pub const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default table holding registered data sources.
pub const DEFAULT_DATASOURCE_TABLE: &str = "dwh.dim_datasource";

/// Default table holding batch records.
pub const DEFAULT_BATCH_TABLE: &str = "config.batch";

/// Provenance tag written to every batch this tool creates.
pub const DEFAULT_EXECUTION_ENV: &str = "batchload automation";

/// Schemas offered as load targets.
pub const DEFAULT_TARGET_SCHEMAS: &[&str] = &["raw", "raw_third_party"];

/// Full runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub warehouse: WarehouseConfig,
    pub ledger: LedgerConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> IngestResult<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            warehouse: WarehouseConfig::from_env()?,
            ledger: LedgerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> IngestResult<()> {
        self.warehouse.validate()?;
        self.ledger.validate()?;
        self.storage.validate()
    }
}

/// Warehouse connection settings
#[derive(Clone)]
pub struct WarehouseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub username: String,
    pub password: String,
    pub connect_timeout_secs: u64,
}

impl fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl WarehouseConfig {
    /// - `BATCHLOAD_DB_HOST`, `BATCHLOAD_DB_PORT`, `BATCHLOAD_DB_NAME`
    /// - `BATCHLOAD_DB_USER`, `BATCHLOAD_DB_PASSWORD` (required)
    /// - `BATCHLOAD_DB_CONNECT_TIMEOUT`
    pub fn from_env() -> IngestResult<Self> {
        let username = std::env::var("BATCHLOAD_DB_USER")
            .map_err(|_| IngestError::config("BATCHLOAD_DB_USER not set"))?;
        let password = std::env::var("BATCHLOAD_DB_PASSWORD")
            .map_err(|_| IngestError::config("BATCHLOAD_DB_PASSWORD not set"))?;

        Ok(Self {
            host: env_or("BATCHLOAD_DB_HOST", DEFAULT_DB_HOST),
            port: env_parse("BATCHLOAD_DB_PORT", DEFAULT_DB_PORT)?,
            dbname: env_or("BATCHLOAD_DB_NAME", DEFAULT_DB_NAME),
            username,
            password,
            connect_timeout_secs: env_parse(
                "BATCHLOAD_DB_CONNECT_TIMEOUT",
                DEFAULT_DB_CONNECT_TIMEOUT_SECS,
            )?,
        })
    }

    pub fn validate(&self) -> IngestResult<()> {
        if self.host.is_empty() {
            return Err(IngestError::config("Warehouse host cannot be empty"));
        }
        if self.dbname.is_empty() {
            return Err(IngestError::config("Warehouse database name cannot be empty"));
        }
        if self.port == 0 {
            return Err(IngestError::config("Warehouse port must be greater than 0"));
        }
        Ok(())
    }
}

/// Where the ledger lives and how batches are stamped
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub datasource_table: TableRef,
    pub batch_table: TableRef,
    pub execution_env: String,
    pub target_schemas: Vec<String>,
    /// Re-prompt when a reused batch id has no ledger row
    pub verify_existing_batch: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            datasource_table: TableRef::parse(DEFAULT_DATASOURCE_TABLE),
            batch_table: TableRef::parse(DEFAULT_BATCH_TABLE),
            execution_env: DEFAULT_EXECUTION_ENV.to_string(),
            target_schemas: DEFAULT_TARGET_SCHEMAS.iter().map(|s| s.to_string()).collect(),
            verify_existing_batch: false,
        }
    }
}

impl LedgerConfig {
    /// - `BATCHLOAD_DATASOURCE_TABLE`, `BATCHLOAD_BATCH_TABLE` (`schema.table`)
    /// - `BATCHLOAD_EXECUTION_ENV`
    /// - `BATCHLOAD_SCHEMAS` (comma separated)
    /// - `BATCHLOAD_VERIFY_EXISTING_BATCH` (true/false)
    pub fn from_env() -> IngestResult<Self> {
        Ok(Self {
            datasource_table: TableRef::parse(&env_or(
                "BATCHLOAD_DATASOURCE_TABLE",
                DEFAULT_DATASOURCE_TABLE,
            )),
            batch_table: TableRef::parse(&env_or("BATCHLOAD_BATCH_TABLE", DEFAULT_BATCH_TABLE)),
            execution_env: env_or("BATCHLOAD_EXECUTION_ENV", DEFAULT_EXECUTION_ENV),
            target_schemas: env_list("BATCHLOAD_SCHEMAS", DEFAULT_TARGET_SCHEMAS),
            verify_existing_batch: env_parse("BATCHLOAD_VERIFY_EXISTING_BATCH", false)?,
        })
    }

    pub fn validate(&self) -> IngestResult<()> {
        if self.target_schemas.is_empty() {
            return Err(IngestError::config("At least one target schema is required"));
        }
        if self.execution_env.trim().is_empty() {
            return Err(IngestError::config("Execution environment tag cannot be empty"));
        }
        Ok(())
    }
}
