//! Image upload adapter
//!
//! Screenshots are written to an object store before the catalog is touched.
//! Object names are `{unix_millis}_{ordinal}_{file_name}` and uploads always
//! overwrite an existing object of the same name.

pub mod http;
pub mod memory;

pub use http::HttpObjectStore;
pub use memory::MemoryObjectStore;

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ArchiveError, Result};

/// Remote object storage boundary
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `bucket/object_name`, returning the stored path
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        data: &[u8],
        content_type: &str,
        upsert: bool,
    ) -> Result<String>;

    /// Publicly dereferenceable URL for a stored path
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Which screenshot slot a file fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSlot {
    Primary,
    Secondary,
}

impl ImageSlot {
    pub fn ordinal(&self) -> u8 {
        match self {
            ImageSlot::Primary => 1,
            ImageSlot::Secondary => 2,
        }
    }
}

/// An image selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Wire form of an image: base64 bytes inside JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePayload {
    pub file_name: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    /// Standard base64
    pub data: String,
}

fn default_content_type() -> String {
    "image/png".to_string()
}

impl ImagePayload {
    pub fn decode(self) -> Result<ImageFile> {
        let data = STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| ArchiveError::Validation(format!("invalid image data: {}", e)))?;

        Ok(ImageFile {
            file_name: self.file_name,
            content_type: self.content_type,
            data,
        })
    }
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    fn check(&self, max_bytes: usize) -> Result<()> {
        if self.data.is_empty() {
            return Err(ArchiveError::Validation(format!("{} is empty", self.file_name)));
        }
        if self.data.len() > max_bytes {
            return Err(ArchiveError::Validation(format!(
                "{} is {} bytes, limit is {}",
                self.file_name,
                self.data.len(),
                max_bytes
            )));
        }
        if !self.content_type.starts_with("image/") {
            return Err(ArchiveError::Validation(format!(
                "{} is not an image ({})",
                self.file_name, self.content_type
            )));
        }
        Ok(())
    }
}

/// Build the object name for an upload
pub fn object_name(timestamp_millis: i64, slot: ImageSlot, file_name: &str) -> String {
    format!(
        "{}_{}_{}",
        timestamp_millis,
        slot.ordinal(),
        sanitize_file_name(file_name)
    )
}

/// Keep the base name and replace anything outside `[A-Za-z0-9._-]`
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Uploads screenshots into one bucket and hands back public URLs
#[derive(Clone)]
pub struct ImageUploader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    max_bytes: usize,
}

impl ImageUploader {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            max_bytes,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload one image; local checks run before any network call
    pub async fn upload(&self, file: &ImageFile, slot: ImageSlot) -> Result<String> {
        file.check(self.max_bytes)?;

        let name = object_name(Utc::now().timestamp_millis(), slot, &file.file_name);
        debug!(bucket = %self.bucket, object = %name, size = file.data.len(), "Uploading image");

        let path = self
            .store
            .upload(&self.bucket, &name, &file.data, &file.content_type, true)
            .await
            .map_err(|e| {
                warn!(object = %name, error = %e, "Image upload failed");
                e
            })?;

        let url = self.store.public_url(&self.bucket, &path);
        info!(slot = ?slot, url = %url, "Image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_name_layout() {
        assert_eq!(
            object_name(1_700_000_000_000, ImageSlot::Primary, "shot.png"),
            "1700000000000_1_shot.png"
        );
        assert_eq!(
            object_name(42, ImageSlot::Secondary, "shot.png"),
            "42_2_shot.png"
        );
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Screenshot 2025-07-27.png"), "Screenshot_2025-07-27.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\shots\\a b.jpg"), "a_b.jpg");
        assert_eq!(sanitize_file_name("スクショ.png"), "____.png");
        assert_eq!(sanitize_file_name(""), "image");
        assert_eq!(sanitize_file_name(".."), "image");
    }

    #[test]
    fn test_payload_decode() {
        let payload = ImagePayload {
            file_name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            data: STANDARD.encode(b"png-bytes"),
        };
        let file = payload.decode().unwrap();
        assert_eq!(file.data, b"png-bytes");

        let bad = ImagePayload {
            file_name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            data: "not base64 !!".to_string(),
        };
        assert!(matches!(bad.decode(), Err(ArchiveError::Validation(_))));
    }

    #[tokio::test]
    async fn test_uploader_rejects_before_network() {
        let store = Arc::new(MemoryObjectStore::new());
        let uploader = ImageUploader::new(store.clone(), "screenshots", 8);

        let empty = ImageFile::new("a.png", "image/png", Vec::new());
        let big = ImageFile::new("a.png", "image/png", vec![0u8; 9]);
        let text = ImageFile::new("a.txt", "text/plain", b"hi".to_vec());

        for file in [empty, big, text] {
            let err = uploader.upload(&file, ImageSlot::Primary).await.unwrap_err();
            assert!(matches!(err, ArchiveError::Validation(_)));
        }
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_uploader_returns_public_url() {
        let store = Arc::new(MemoryObjectStore::new());
        let uploader = ImageUploader::new(store.clone(), "screenshots", 1024);

        let file = ImageFile::new("rain.png", "image/png", b"png".to_vec());
        let url = uploader.upload(&file, ImageSlot::Secondary).await.unwrap();

        assert!(url.starts_with("http://localhost:8080/storage/screenshots/"));
        assert!(url.ends_with("_2_rain.png"));
        assert_eq!(store.len().await, 1);
    }
}
