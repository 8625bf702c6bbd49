//! S3-compatible backend.
//!
//! Credentials and region come from the standard AWS environment
//! (`AWS_ACCESS_KEY_ID`, `AWS_REGION`, instance roles, ...). A custom
//! endpoint enables MinIO, R2 and similar stores.

use super::{validate_key, BlobStore};
use crate::errors::WeddingError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

/// Keys are unique per upload, so objects never change once written.
const OBJECT_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Stores objects in one bucket.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3BlobStore {
    /// Build a client from the AWS environment.
    pub async fn connect(bucket: String, public_url: String, endpoint_url: Option<&str>) -> Self {
        let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = endpoint_url {
            // S3-compatible stores rarely support virtual-hosted buckets
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::with_client(Client::from_conf(builder.build()), bucket, public_url)
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client, bucket: String, public_url: String) -> Self {
        Self {
            client,
            bucket,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    fn backend(&self) -> &'static str {
        "s3"
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, WeddingError> {
        validate_key(key)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .cache_control(OBJECT_CACHE_CONTROL)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                WeddingError::Storage(format!(
                    "put_object {}/{key} failed: {}",
                    self.bucket,
                    aws_sdk_s3::error::DisplayErrorContext(&e)
                ))
            })?;

        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), WeddingError> {
        validate_key(key)?;

        // S3 DeleteObject succeeds for missing keys
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                WeddingError::Storage(format!(
                    "delete_object {}/{key} failed: {}",
                    self.bucket,
                    aws_sdk_s3::error::DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), WeddingError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                WeddingError::Storage(format!(
                    "head_bucket {} failed: {}",
                    self.bucket,
                    aws_sdk_s3::error::DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }
}
