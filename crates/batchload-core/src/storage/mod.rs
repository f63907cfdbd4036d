//! Landing-zone uploads
//!
//! Staged files are copied to an S3-compatible bucket before the warehouse
//! load. The returned location is recorded on the batch as its
//! `source_location`.

use crate::error::{IngestError, IngestResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info, instrument};

pub mod config;

pub use config::StorageConfig;

/// What an upload produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    /// Remote location, e.g. `s3://bucket/landing/file.csv`
    pub location: String,
    pub checksum: String,
    pub size: u64,
}

/// Remote staging capability
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, local_path: &Path, display_name: &str) -> IngestResult<UploadReceipt>;
}

#[derive(Clone)]
pub struct S3Uploader {
    client: Client,
    config: StorageConfig,
}

impl S3Uploader {
    pub async fn new(config: StorageConfig) -> IngestResult<Self> {
        debug!(?config, "Initializing landing-zone client");

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.path_style);

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            builder = builder.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "batchload",
            ));
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());
        info!(bucket = %config.bucket, "Landing-zone client initialized");

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Uploader for S3Uploader {
    #[instrument(skip(self))]
    async fn upload(&self, local_path: &Path, display_name: &str) -> IngestResult<UploadReceipt> {
        let data = tokio::fs::read(local_path).await?;
        let checksum = sha256_hex(&data);
        let size = data.len() as u64;
        let key = self.config.key_for(display_name);

        debug!(size, key = %key, "Uploading staged file");

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .content_type("text/csv")
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| IngestError::upload(format!("s3://{}/{}: {}", self.config.bucket, key, e)))?;

        let location = format!("s3://{}/{}", self.config.bucket, key);
        info!(location = %location, checksum = %checksum, "Staged file uploaded");

        Ok(UploadReceipt {
            location,
            checksum,
            size,
        })
    }
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
