//! Shared helpers for batchload-core integration tests
//!
//! Postgres-backed tests need Docker and are `#[ignore]`d by default:
//!
//! ```bash
//! cargo test -p batchload-core --test postgres_tests -- --ignored --nocapture
//! ```

#![allow(dead_code)]

use batchload_core::{PgWarehouse, WarehouseConfig};
use sqlx::postgres::PgPoolOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use tracing::info;

/// Sales export used by the end-to-end scenarios
pub const SALES_CSV: &str = "Region,Total Sales (%)\nNorth,12.5\nSouth,7\n";

pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,batchload_core=debug,sqlx=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_input(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write input CSV");
    path
}

/// Disposable PostgreSQL container
pub struct TestPostgres {
    container: ContainerAsync<Postgres>,
    config: WarehouseConfig,
}

impl TestPostgres {
    pub async fn start() -> Self {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .start()
            .await
            .expect("Failed to start PostgreSQL container");
        let host = container
            .get_host()
            .await
            .expect("Failed to get container host");
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .expect("Failed to get container port");

        let config = WarehouseConfig {
            host: host.to_string(),
            port,
            dbname: "postgres".to_string(),
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            connect_timeout_secs: 30,
        };

        Self { container, config }
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Single-connection warehouse, as the CLI opens it
    pub async fn warehouse(&self) -> PgWarehouse {
        PgWarehouse::connect(&self.config)
            .await
            .expect("Failed to connect to PostgreSQL")
    }

    /// Warehouse over a wider pool, for concurrent allocation
    pub async fn pooled_warehouse(&self, connections: u32) -> PgWarehouse {
        let url = format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.config.username,
            self.config.password,
            self.config.host,
            self.config.port,
            self.config.dbname
        );
        let pool = PgPoolOptions::new()
            .max_connections(connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&url)
            .await
            .expect("Failed to connect to PostgreSQL");
        PgWarehouse::from_pool(pool)
    }
}
