use crate::error::{IngestError, IngestResult};
use batchload_common::env::{env_or, env_parse};
use serde::{Deserialize, Serialize};
use std::env;

/// Default bucket for the landing zone.
pub const DEFAULT_BUCKET: &str = "datalake";

/// Default key prefix under which staged files land.
pub const DEFAULT_PREFIX: &str = "landing";

/// S3-compatible landing-zone settings
///
/// Credentials are optional: when unset, the standard AWS provider chain
/// (environment, profile, instance role) is used.
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub prefix: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub path_style: bool,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("access_key", &self.access_key.as_ref().map(|_| "<set>"))
            .field("path_style", &self.path_style)
            .finish()
    }
}

impl StorageConfig {
    /// A malformed `S3_PATH_STYLE` is an error rather than `false`.
    pub fn from_env() -> IngestResult<Self> {
        Ok(Self {
            endpoint: env::var("S3_ENDPOINT").ok(),
            region: env_or("S3_REGION", "us-east-1"),
            bucket: env_or("S3_BUCKET", DEFAULT_BUCKET),
            prefix: env_or("S3_PREFIX", DEFAULT_PREFIX),
            access_key: env::var("S3_ACCESS_KEY").ok(),
            secret_key: env::var("S3_SECRET_KEY").ok(),
            path_style: env_parse("S3_PATH_STYLE", false)?,
        })
    }

    /// Settings for a local MinIO endpoint
    pub fn for_minio(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: "us-east-1".to_string(),
            bucket: bucket.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            access_key: Some(access_key.into()),
            secret_key: Some(secret_key.into()),
            path_style: true,
        }
    }

    pub fn validate(&self) -> IngestResult<()> {
        if self.bucket.is_empty() {
            return Err(IngestError::config("S3 bucket cannot be empty"));
        }
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(IngestError::config(
                "S3_ACCESS_KEY and S3_SECRET_KEY must be set together",
            ));
        }
        Ok(())
    }

    /// Object key for a staged file
    pub fn key_for(&self, display_name: &str) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            display_name.to_string()
        } else {
            format!("{}/{}", prefix, display_name)
        }
    }
}
