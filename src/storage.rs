//! Object storage access for raw inbound messages.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use tracing::info;

use crate::error::StorageError;
use crate::trigger::ObjectRef;

/// Fetches raw object bytes.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>, StorageError>;
}

/// `ObjectFetcher` backed by S3 `GetObject`.
pub struct S3ObjectFetcher {
    client: aws_sdk_s3::Client,
}

impl S3ObjectFetcher {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ObjectFetcher for S3ObjectFetcher {
    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>, StorageError> {
        let fetch_failed = |reason: String| StorageError::FetchFailed {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            reason,
        };

        let output = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| fetch_failed(DisplayErrorContext(&e).to_string()))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| fetch_failed(format!("reading body: {e}")))?
            .into_bytes();

        info!(bucket = %object.bucket, key = %object.key, bytes = bytes.len(), "Fetched stored message");
        Ok(bytes.to_vec())
    }
}
