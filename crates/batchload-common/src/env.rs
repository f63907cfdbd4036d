//! Typed access to environment variables
//!
//! Unset variables fall back to the supplied default. A variable that is set
//! but does not parse is an error rather than being silently ignored, so a
//! typo in `.env` surfaces at startup.

use crate::error::{BatchloadError, Result};
use std::str::FromStr;

/// Read a string variable, falling back to `default` when unset.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse a variable, falling back to `default` when unset.
pub fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| BatchloadError::InvalidEnv {
            key: key.to_string(),
            value: value.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Read a comma separated list, dropping empty items.
pub fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(value) => value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_default_when_unset() {
        std::env::remove_var("BATCHLOAD_TEST_UNSET_PORT");
        let port: u16 = env_parse("BATCHLOAD_TEST_UNSET_PORT", 5432).unwrap();
        assert_eq!(port, 5432);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("BATCHLOAD_TEST_BAD_PORT", "fifty");
        let result: Result<u16> = env_parse("BATCHLOAD_TEST_BAD_PORT", 5432);
        assert!(matches!(result, Err(BatchloadError::InvalidEnv { .. })));
        std::env::remove_var("BATCHLOAD_TEST_BAD_PORT");
    }

    #[test]
    fn test_env_list_splits_and_trims() {
        std::env::set_var("BATCHLOAD_TEST_LIST", "raw, staging ,,archive");
        let items = env_list("BATCHLOAD_TEST_LIST", &["unused"]);
        assert_eq!(items, vec!["raw", "staging", "archive"]);
        std::env::remove_var("BATCHLOAD_TEST_LIST");
    }

    #[test]
    fn test_env_list_default() {
        std::env::remove_var("BATCHLOAD_TEST_LIST_UNSET");
        let items = env_list("BATCHLOAD_TEST_LIST_UNSET", &["raw", "raw_third_party"]);
        assert_eq!(items, vec!["raw", "raw_third_party"]);
    }
}
