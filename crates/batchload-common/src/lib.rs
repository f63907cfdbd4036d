//! Batchload Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities for the batchload workspace members.
//!
//! - **Error Handling**: [`BatchloadError`] and the [`Result`] alias
//! - **Environment**: typed readers for configuration variables
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use batchload_common::env::env_parse;
//! use batchload_common::Result;
//!
//! fn port() -> Result<u16> {
//!     env_parse("BATCHLOAD_DB_PORT", 5432)
//! }
//! ```

pub mod env;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{BatchloadError, Result};
