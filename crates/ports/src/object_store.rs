//! Object Store Port
//!
//! Durable blob storage addressed by bucket and key. A `put` replaces the
//! whole object in one call: readers see either the previous object or the
//! complete new one, never a partial write.

use async_trait::async_trait;
use axle_core::DomainError;
use std::time::Duration;

/// Object store error
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectStoreError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Object store unavailable: {0}")]
    Unavailable(String),

    #[error("Object store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Object store error: {0}")]
    Storage(String),
}

impl From<ObjectStoreError> for DomainError {
    fn from(err: ObjectStoreError) -> Self {
        match err {
            ObjectStoreError::NotFound { bucket, key } => {
                DomainError::NotFound(format!("{}/{}", bucket, key))
            }
            ObjectStoreError::Unavailable(msg) => DomainError::BackendUnavailable(msg),
            ObjectStoreError::Timeout(after) => {
                DomainError::Timeout(format!("object store after {:?}", after))
            }
            ObjectStoreError::Storage(msg) => DomainError::Upload(msg),
        }
    }
}

/// Metadata returned by a `head` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub bucket: String,
    pub key: String,
    pub size: u64,
}

/// Object store port trait
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Store `body` as the complete object at `bucket/key`, replacing any
    /// previous object. Returns only after the store acknowledged the write.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError>;

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectInfo, ObjectStoreError>;

    /// Connectivity check against a bucket
    async fn check_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError>;
}
