//! In-memory object store
//!
//! Objects are replaced wholesale under a map entry lock, which gives the
//! same all-or-nothing visibility as a single S3 `PutObject`.

use async_trait::async_trait;
use axle_ports::{ObjectInfo, ObjectStore, ObjectStoreError};
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
}

#[derive(Debug, Default)]
struct Inner {
    buckets: DashSet<String>,
    objects: DashMap<(String, String), StoredObject>,
    puts: AtomicUsize,
    fail_put: AtomicBool,
    unavailable: AtomicBool,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    inner: Arc<Inner>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::new();
        store.create_bucket(bucket);
        store
    }

    pub fn create_bucket(&self, bucket: &str) {
        self.inner.buckets.insert(bucket.to_string());
    }

    pub fn object_count(&self) -> usize {
        self.inner.objects.len()
    }

    /// Successful writes since creation, overwrites included
    pub fn put_count(&self) -> usize {
        self.inner.puts.load(Ordering::SeqCst)
    }

    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.inner
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|object| object.content_type.clone())
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .objects
            .iter()
            .filter(|entry| entry.key().0 == bucket)
            .map(|entry| entry.key().1.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Reject writes with a storage error
    pub fn fail_put(&self, fail: bool) {
        self.inner.fail_put.store(fail, Ordering::SeqCst);
    }

    /// Reject every call as if the endpoint were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_reachable(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Unavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        if !self.inner.buckets.contains(bucket) {
            return Err(ObjectStoreError::Storage(format!(
                "bucket '{}' does not exist",
                bucket
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        self.ensure_reachable(bucket)?;
        if self.inner.fail_put.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Storage(format!(
                "write to '{}/{}' rejected",
                bucket, key
            )));
        }

        self.inner.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        self.inner.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.ensure_reachable(bucket)?;
        self.inner
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|object| object.body.clone())
            .ok_or_else(|| ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectInfo, ObjectStoreError> {
        let size = self.get(bucket, key).await?.len() as u64;
        Ok(ObjectInfo {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size,
        })
    }

    async fn check_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        self.ensure_reachable(bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_replaces_whole_object() {
        let store = InMemoryObjectStore::with_bucket("raw-telemetry");

        store
            .put("raw-telemetry", "a/data.parquet", vec![1, 2, 3], "application/octet-stream")
            .await
            .unwrap();
        store
            .put("raw-telemetry", "a/data.parquet", vec![9], "application/octet-stream")
            .await
            .unwrap();

        assert_eq!(store.get("raw-telemetry", "a/data.parquet").await.unwrap(), vec![9]);
        assert_eq!(store.object_count(), 1);
        assert_eq!(store.put_count(), 2);
        assert_eq!(store.head("raw-telemetry", "a/data.parquet").await.unwrap().size, 1);
    }

    #[tokio::test]
    async fn test_missing_object_and_bucket() {
        let store = InMemoryObjectStore::with_bucket("raw-telemetry");

        assert!(matches!(
            store.get("raw-telemetry", "missing").await,
            Err(ObjectStoreError::NotFound { .. })
        ));
        assert!(store.check_bucket("other").await.is_err());
        assert!(store.check_bucket("raw-telemetry").await.is_ok());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryObjectStore::with_bucket("raw-telemetry");

        store.fail_put(true);
        assert!(store.put("raw-telemetry", "k", vec![1], "x").await.is_err());
        assert_eq!(store.object_count(), 0);

        store.fail_put(false);
        store.set_unavailable(true);
        assert!(matches!(
            store.check_bucket("raw-telemetry").await,
            Err(ObjectStoreError::Unavailable(_))
        ));
    }
}
