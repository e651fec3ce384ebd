use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Storage responded with status {0}")]
    UnexpectedStatus(reqwest::StatusCode),
}

/// Client for the hosted object-storage API. Only deletion is needed here:
/// uploads go directly from the browser to storage, and this service keeps
/// the metadata.
pub struct ObjectStorage {
    client: reqwest::Client,
    endpoint: Url,
    bucket: String,
    service_key: String,
}

impl ObjectStorage {
    /// Build a client from config. Returns `None` when storage is not
    /// configured; callers then skip blob removal.
    pub fn from_config(cfg: &StorageConfig) -> Result<Option<Self>, StorageError> {
        if cfg.url.is_empty() || cfg.service_key.is_empty() {
            return Ok(None);
        }

        let endpoint = Url::parse(&cfg.url).map_err(|e| StorageError::InvalidUrl(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;

        Ok(Some(Self {
            client,
            endpoint,
            bucket: cfg.bucket.clone(),
            service_key: cfg.service_key.clone(),
        }))
    }

    /// Remove an object from the bucket. Callers treat failures as
    /// non-fatal; the metadata row is the system of record.
    pub async fn remove(&self, path: &str) -> Result<(), StorageError> {
        let url = self.object_url(path)?;
        let res = self
            .client
            .delete(url)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(StorageError::UnexpectedStatus(res.status()));
        }
        Ok(())
    }

    fn object_url(&self, path: &str) -> Result<Url, StorageError> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::InvalidUrl("URL cannot be a base".to_string()))?;
            segments.extend(["storage", "v1", "object", self.bucket.as_str()]);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }
}
