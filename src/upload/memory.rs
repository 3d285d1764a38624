//! In-process object store
//!
//! Used for local development and tests. Objects are lost on restart.
//! The API serves them back under `{public_base}/storage/{bucket}/{path}`,
//! and total stored bytes are capped.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::ObjectStore;
use crate::error::{ArchiveError, Result};

pub const DEFAULT_PUBLIC_BASE: &str = "http://localhost:8080";
pub const DEFAULT_CAPACITY_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: String,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
struct Objects {
    by_key: HashMap<String, StoredObject>,
    bytes: usize,
}

/// Object store kept in memory
#[derive(Debug)]
pub struct MemoryObjectStore {
    objects: RwLock<Objects>,
    public_base: String,
    capacity_bytes: usize,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(Objects::default()),
            public_base: DEFAULT_PUBLIC_BASE.to_string(),
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
        }
    }

    /// Base URL the HTTP server is reachable at
    pub fn with_public_base(mut self, base: &str) -> Self {
        self.public_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_capacity(mut self, capacity_bytes: usize) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.by_key.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.by_key.is_empty()
    }

    /// Total bytes currently stored
    pub async fn stored_bytes(&self) -> usize {
        self.objects.read().await.bytes
    }

    /// Content type and bytes of a stored object
    pub async fn get(&self, bucket: &str, path: &str) -> Option<(String, Vec<u8>)> {
        self.objects
            .read()
            .await
            .by_key
            .get(&key(bucket, path))
            .map(|o| (o.content_type.clone(), o.data.clone()))
    }
}

fn key(bucket: &str, path: &str) -> String {
    format!("{}/{}", bucket, path)
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        data: &[u8],
        content_type: &str,
        upsert: bool,
    ) -> Result<String> {
        let mut objects = self.objects.write().await;
        let key = key(bucket, object_name);

        let replaced = match objects.by_key.get(&key) {
            Some(_) if !upsert => {
                return Err(ArchiveError::Upload(format!("{} already exists", key)));
            }
            Some(existing) => existing.data.len(),
            None => 0,
        };

        let bytes = objects.bytes - replaced + data.len();
        if bytes > self.capacity_bytes {
            warn!(stored = objects.bytes, capacity = self.capacity_bytes, "Memory object store full");
            return Err(ArchiveError::Upload(format!(
                "memory store full ({} of {} bytes used)",
                objects.bytes, self.capacity_bytes
            )));
        }

        objects.by_key.insert(
            key,
            StoredObject {
                content_type: content_type.to_string(),
                data: data.to_vec(),
            },
        );
        objects.bytes = bytes;
        debug!(bucket, object = object_name, stored = bytes, "Stored object in memory");

        Ok(object_name.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/{}/{}", self.public_base, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let store = MemoryObjectStore::new();
        store.upload("b", "x.png", b"one", "image/png", true).await.unwrap();
        store.upload("b", "x.png", b"three", "image/png", true).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.stored_bytes().await, 5);
        let (content_type, data) = store.get("b", "x.png").await.unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(data, b"three");
    }

    #[tokio::test]
    async fn test_no_upsert_conflicts() {
        let store = MemoryObjectStore::new();
        store.upload("b", "x.png", b"one", "image/png", false).await.unwrap();
        let err = store
            .upload("b", "x.png", b"two", "image/png", false)
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Upload(_)));
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let store = MemoryObjectStore::new().with_capacity(8);
        store.upload("b", "a.png", b"12345", "image/png", true).await.unwrap();

        let err = store
            .upload("b", "b.png", b"1234", "image/png", true)
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Upload(msg) if msg.starts_with("memory store full")));
        assert_eq!(store.len().await, 1);

        // Replacing an object only counts the difference
        store.upload("b", "a.png", b"12345678", "image/png", true).await.unwrap();
        assert_eq!(store.stored_bytes().await, 8);
    }

    #[test]
    fn test_public_url_points_at_storage_route() {
        let store = MemoryObjectStore::new().with_public_base("http://127.0.0.1:9000/");
        assert_eq!(
            store.public_url("screenshots", "1_1_a.png"),
            "http://127.0.0.1:9000/storage/screenshots/1_1_a.png"
        );
    }
}
