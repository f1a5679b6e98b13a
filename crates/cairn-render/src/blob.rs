//! HTTP blob store client.
//!
//! Artifacts are PUT to `{endpoint}/{key}` and served from
//! `{public_base_url}/{key}`. The store is expected to be dumb object
//! storage; the public URL is constructed here, not returned by the service.

use std::time::Duration;

use async_trait::async_trait;

use crate::{BlobStore, ExternalError, Result};

const CONTENT_TYPE: &str = "audio/mpeg";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for the artifact store.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Write endpoint, without trailing slash.
    pub endpoint: String,
    /// Base URL artifacts are publicly readable under.
    pub public_base_url: String,
    /// Bearer credential for writes.
    pub access_token: String,
}

/// [`BlobStore`] over an HTTP object store.
pub struct HttpBlobStore {
    client: reqwest::Client,
    config: BlobConfig,
}

impl HttpBlobStore {
    pub fn new(config: BlobConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{key}", self.config.endpoint.trim_end_matches('/'))
    }

    /// Public URL an artifact is readable under once stored.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.config.public_base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String> {
        let response = self
            .client
            .put(self.object_url(key))
            .bearer_auth(&self.config.access_token)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ExternalError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let response = self
            .client
            .delete(self.object_url(key))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ExternalError::Api {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpBlobStore {
        HttpBlobStore::new(BlobConfig {
            endpoint: "https://blobs.internal/write/".to_string(),
            public_base_url: "https://blobs.example/".to_string(),
            access_token: "secret".to_string(),
        })
        .expect("client")
    }

    #[test]
    fn test_url_construction_trims_slashes() {
        let store = store();
        assert_eq!(
            store.object_url("capsule_1_2_3.mp3"),
            "https://blobs.internal/write/capsule_1_2_3.mp3"
        );
        assert_eq!(
            store.public_url("capsule_1_2_3.mp3"),
            "https://blobs.example/capsule_1_2_3.mp3"
        );
    }
}
