//! Build automation tasks for batchload
//!
//! Currently generates the CLI reference from the clap definitions.

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for batchload", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<batchload_cli::Cli>();

    let content = format!(
        r#"# batchload CLI Reference

Generated from the CLI source on {}.

## Quick Start

```bash
# Create the ledger tables once per warehouse
batchload init-ledger

# Pick a CSV in the current directory and load it
batchload ingest

# Or name the file up front and get a machine-readable summary
batchload ingest --file exports/sales.csv --json

# See which data sources batches can reference
batchload sources
```

## Commands

{}

## Environment Variables

Warehouse:

- `BATCHLOAD_DB_HOST`, `BATCHLOAD_DB_PORT`, `BATCHLOAD_DB_NAME`
- `BATCHLOAD_DB_USER`, `BATCHLOAD_DB_PASSWORD` (required)
- `BATCHLOAD_DB_CONNECT_TIMEOUT` (seconds)

Ledger:

- `BATCHLOAD_DATASOURCE_TABLE` (default `dwh.dim_datasource`)
- `BATCHLOAD_BATCH_TABLE` (default `config.batch`)
- `BATCHLOAD_EXECUTION_ENV` (default `batchload automation`)
- `BATCHLOAD_SCHEMAS` (default `raw,raw_third_party`)
- `BATCHLOAD_VERIFY_EXISTING_BATCH` (default `false`)

Landing zone:

- `S3_ENDPOINT`, `S3_REGION`, `S3_BUCKET`, `S3_PREFIX`
- `S3_ACCESS_KEY`, `S3_SECRET_KEY`, `S3_PATH_STYLE`

Logging:

- `LOG_LEVEL`, `LOG_OUTPUT`, `LOG_FORMAT`, `LOG_DIR`, `LOG_FILE_PREFIX`, `LOG_FILTER`

All of these may also be set in a `.env` file in the working directory.

---

*To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());
    Ok(())
}
