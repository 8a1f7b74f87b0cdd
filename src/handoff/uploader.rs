use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Durable-storage seam: `(key, bytes, content type)` in, confirmation out.
///
/// Uploads must be idempotent under retry; overwriting the same key is safe,
/// which is what makes handoff at-least-once.
#[async_trait::async_trait]
pub trait ArtifactUploader: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;
}

/// Object-store upload over HTTP PUT (`{endpoint}/{key}`).
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUploader {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to build storage HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl ArtifactUploader for HttpUploader {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), key);

        self.client
            .put(&url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("Upload request failed for {}", key))?
            .error_for_status()
            .with_context(|| format!("Storage service rejected {}", key))?;

        Ok(())
    }
}
