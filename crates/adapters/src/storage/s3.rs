//! S3-compatible Object Store Adapter
//!
//! Talks to MinIO (or any S3 API) with path-style addressing and static
//! credentials. Each object is written with a single `PutObject`, so the
//! store never exposes a partially written dataset.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use axle_ports::{ObjectInfo, ObjectStore, ObjectStoreError};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::StorageConfig;

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl S3ObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "axle-static",
        );

        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(config.endpoint.clone())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, ObjectStoreError>
    where
        F: Future<Output = Result<T, ObjectStoreError>>,
    {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| ObjectStoreError::Timeout(self.timeout))?
    }
}

/// Connection-level failures are retryable; everything else is reported as
/// a storage error with the service's own message.
fn classify<E, R>(action: &str, target: &str, err: SdkError<E, R>) -> ObjectStoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => ObjectStoreError::Unavailable(
            format!("Failed to {} '{}': {}", action, target, DisplayErrorContext(&err)),
        ),
        other => ObjectStoreError::Storage(format!(
            "Failed to {} '{}': {}",
            action,
            target,
            DisplayErrorContext(&other)
        )),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        let size = body.len();
        let target = format!("{}/{}", bucket, key);

        self.bounded(async {
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .content_type(content_type)
                .body(ByteStream::from(body))
                .send()
                .await
                .map_err(|e| classify("upload", &target, e))
        })
        .await?;

        info!(bucket = bucket, key = key, size = size, "Object uploaded");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let target = format!("{}/{}", bucket, key);

        self.bounded(async {
            let output = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| {
                    if e.as_service_error().is_some_and(|s| s.is_no_such_key()) {
                        ObjectStoreError::NotFound {
                            bucket: bucket.to_string(),
                            key: key.to_string(),
                        }
                    } else {
                        classify("download", &target, e)
                    }
                })?;

            let data = output.body.collect().await.map_err(|e| {
                ObjectStoreError::Storage(format!("Failed to read body of '{}': {}", target, e))
            })?;
            Ok(data.into_bytes().to_vec())
        })
        .await
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectInfo, ObjectStoreError> {
        let target = format!("{}/{}", bucket, key);

        let output = self
            .bounded(async {
                self.client
                    .head_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| {
                        if e.as_service_error().is_some_and(|s| s.is_not_found()) {
                            ObjectStoreError::NotFound {
                                bucket: bucket.to_string(),
                                key: key.to_string(),
                            }
                        } else {
                            classify("inspect", &target, e)
                        }
                    })
            })
            .await?;

        Ok(ObjectInfo {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: output.content_length().unwrap_or_default().max(0) as u64,
        })
    }

    async fn check_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        self.bounded(async {
            self.client
                .head_bucket()
                .bucket(bucket)
                .send()
                .await
                .map_err(|e| classify("reach bucket", bucket, e))
        })
        .await?;

        debug!(bucket = bucket, endpoint = %self.endpoint, "Bucket reachable");
        Ok(())
    }
}
