//! S3-compatible object storage for rendered PDFs.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use seasonal_core::storage::{public_url, validate_key};
use seasonal_core::{BlobStore, StorageError};

#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    /// Build a client from the ambient AWS credentials chain.
    ///
    /// `endpoint` points at an S3-compatible service (MinIO, R2). Objects are
    /// served from `public_base_url`, or the bucket's virtual-hosted URL when unset.
    pub async fn connect(
        bucket: String,
        region: String,
        endpoint: Option<String>,
        public_base_url: Option<String>,
    ) -> Self {
        let mut config_builder =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.clone()));

        if let Some(endpoint) = &endpoint {
            config_builder = config_builder.endpoint_url(endpoint);
        }

        let config = config_builder.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(endpoint.is_some())
            .build();

        let public_base_url = public_base_url.unwrap_or_else(|| match &endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        });

        Self {
            client: Client::from_conf(s3_config),
            bucket,
            public_base_url,
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        validate_key(key)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to upload {}: {}", key, e)))?;

        tracing::debug!(bucket = %self.bucket, key, "Uploaded object");
        Ok(public_url(&self.public_base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;

        // S3 reports success for keys that do not exist.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to delete {}: {}", key, e)))?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
