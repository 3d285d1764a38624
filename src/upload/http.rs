//! Object storage over HTTP
//!
//! Talks to a storage REST API:
//! - `POST {base}/storage/v1/object/{bucket}/{name}` with `x-upsert`
//! - public objects at `{base}/storage/v1/object/public/{bucket}/{name}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use super::ObjectStore;
use crate::error::{ArchiveError, Result};

/// Remote object store client
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpObjectStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ArchiveError::Config(format!("storage client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    fn object_url(&self, bucket: &str, object_name: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, object_name)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        data: &[u8],
        content_type: &str,
        upsert: bool,
    ) -> Result<String> {
        let url = self.object_url(bucket, object_name);
        debug!(url = %url, upsert, "POST object");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .header(CONTENT_TYPE, content_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ArchiveError::Upload(format!("timed out after {}s", self.timeout.as_secs()))
                } else {
                    ArchiveError::Upload(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Upload(format!("HTTP {}: {}", status, body.trim())));
        }

        Ok(object_name.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }
}
