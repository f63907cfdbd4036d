//! Error types shared across batchload crates

use thiserror::Error;

/// Result type alias for shared batchload operations
pub type Result<T> = std::result::Result<T, BatchloadError>;

/// Errors raised by the shared utilities
#[derive(Error, Debug)]
pub enum BatchloadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidEnv {
        key: String,
        value: String,
        reason: String,
    },
}

impl BatchloadError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
