use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::config::Config;

const BLOB_API_VERSION: &str = "7";

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("{0}")]
    Request(String),
    #[error("blob API returned {0}")]
    Status(u16),
}

/// Deletion half of the blob-storage service. Uploads happen elsewhere.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn delete(&self, url: &str) -> Result<(), BlobError>;
}

// ── Vercel Blob ──────────────────────────────────────────────────────────────

pub struct VercelBlobStore {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    urls: [&'a str; 1],
}

impl VercelBlobStore {
    pub fn new(http: reqwest::Client, api_url: &str, token: String) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl BlobStore for VercelBlobStore {
    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let response = self
            .http
            .post(format!("{}/delete", self.api_url))
            .bearer_auth(&self.token)
            .header("x-api-version", BLOB_API_VERSION)
            .json(&DeleteRequest { urls: [url] })
            .send()
            .await
            .map_err(|e| BlobError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BlobError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Used when no blob token is configured.
pub struct DisabledBlobStore;

#[async_trait]
impl BlobStore for DisabledBlobStore {
    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        tracing::debug!(url, "blob cleanup disabled, skipping delete");
        Ok(())
    }
}

pub fn store_from_config(config: &Config, http: reqwest::Client) -> Arc<dyn BlobStore> {
    match &config.blob_token {
        Some(token) => Arc::new(VercelBlobStore::new(http, &config.blob_api_url, token.clone())),
        None => Arc::new(DisabledBlobStore),
    }
}

// ── Best-effort cleanup ──────────────────────────────────────────────────────

/// True when `url` lives under the managed storage host.
pub fn is_managed(url: &str, host_suffix: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let host = parsed.host_str().unwrap_or("").to_ascii_lowercase();
    let suffix = host_suffix.to_ascii_lowercase();
    host == suffix || host.ends_with(&format!(".{suffix}"))
}

/// Deletes a transient upload. Failures are logged and dropped; the caller
/// never sees them.
pub async fn release_transient(store: &dyn BlobStore, url: &str, host_suffix: &str) {
    if !is_managed(url, host_suffix) {
        return;
    }
    match store.delete(url).await {
        Ok(()) => tracing::debug!(url, "deleted transient upload"),
        Err(e) => tracing::warn!(url, error = %e, "transient upload cleanup failed"),
    }
}
