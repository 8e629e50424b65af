//! AWS S3 fast-path mirror.
//!
//! Uploads the snapshot as a single JSON object. Region and credentials come
//! from the standard AWS environment.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::models::Deal;
use crate::storage::SnapshotMirror;

pub struct S3Mirror {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Mirror {
    pub fn new(client: Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create the mirror with the default AWS configuration chain.
    pub async fn from_env(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket, key)
    }
}

#[async_trait]
impl SnapshotMirror for S3Mirror {
    fn describe(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    async fn publish(&self, deals: &[Deal]) -> Result<()> {
        let json = serde_json::to_vec_pretty(deals)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(ByteStream::from(json))
            .content_type("application/json")
            .cache_control("no-cache")
            .send()
            .await
            .map_err(|e| AppError::S3(e.to_string()))?;

        log::info!("Wrote {} deals to {}", deals.len(), self.describe());
        Ok(())
    }
}
