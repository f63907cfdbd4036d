//! Batchload CLI - Main entry point

use batchload_cli::{Cli, Commands};
use batchload_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use clap::{CommandFactory, Parser};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    let Some(command) = cli.command else {
        // Printing help only fails if stdout is gone
        let _ = Cli::command().print_help();
        process::exit(2);
    };

    // Verbose: debug to the console. Otherwise only warnings reach it.
    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("batchload".to_string())
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env().unwrap_or_else(|e| {
        eprintln!("Ignoring invalid logging settings: {}", e);
        LogConfig::default()
    });

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok();

    let result = match command {
        Commands::Ingest { file, json } => batchload_cli::commands::ingest::run(file, json).await,
        Commands::Sources { json } => batchload_cli::commands::sources::run(json).await,
        Commands::InitLedger => batchload_cli::commands::init_ledger::run().await,
    };

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
