//! Batchload CLI Library
//!
//! Command-line front end for CSV ingestion into the warehouse.
//!
//! # Overview
//!
//! - **Ingestion**: pick a CSV, stage it, tag it with a batch and load it
//!   (`batchload ingest`)
//! - **Registry**: list registered data sources (`batchload sources`)
//! - **Setup**: create the ledger tables (`batchload init-ledger`)
//!
//! Connection settings come from `BATCHLOAD_*` and `S3_*` environment
//! variables or a `.env` file in the working directory.

pub mod commands;
pub mod error;
pub mod picker;
pub mod prompt;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Batchload - interactive CSV ingestion with a batch ledger
#[derive(Parser, Debug)]
#[command(name = "batchload")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the full command reference as markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a CSV file into the warehouse
    Ingest {
        /// CSV to ingest (prompts for one in the current directory if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the run outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered data sources
    Sources {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Create the data-source and batch tables if they do not exist
    InitLedger,
}
