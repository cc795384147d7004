//! S3-compatible HTTP object store
//!
//! Path-style addressing: `{endpoint}/{bucket}/{key}`.

use std::time::Duration;

use reqwest::{StatusCode, Url};

use super::{check_key, ArtifactStore, StoreError};

pub struct HttpArtifactStore {
    endpoint: Url,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl HttpArtifactStore {
    pub fn new(endpoint: &str, token: Option<String>, timeout_seconds: u64) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {}", e)))?;

        let endpoint = Url::parse(endpoint)
            .map_err(|e| StoreError::Transport(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(StoreError::Transport(format!("invalid endpoint '{}'", endpoint)));
        }

        Ok(Self {
            endpoint,
            token,
            http_client,
        })
    }

    /// Object URL with bucket and key segments percent-encoded
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, StoreError> {
        check_key(bucket)?;
        check_key(key)?;

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport(format!("invalid endpoint '{}'", self.endpoint)))?
            .pop_if_empty()
            .push(bucket)
            .extend(key.split('/'));
        Ok(url)
    }

    fn request(
        &self,
        method: reqwest::Method,
        bucket: &str,
        key: &str,
    ) -> Result<reqwest::RequestBuilder, StoreError> {
        let builder = self.http_client.request(method, self.object_url(bucket, key)?);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }
}

impl ArtifactStore for HttpArtifactStore {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        let response = self
            .request(reqwest::Method::HEAD, bucket, key)?
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(status_error(s, bucket, key)),
        }
    }

    async fn fetch_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, bucket, key)?
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            s if s.is_success() => {
                let bytes = response.bytes().await.map_err(transport)?;
                tracing::debug!("Fetched {}/{} ({} bytes)", bucket, key, bytes.len());
                Ok(bytes.to_vec())
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            s => Err(status_error(s, bucket, key)),
        }
    }

    async fn upload(&self, bytes: Vec<u8>, bucket: &str, key: &str) -> Result<(), StoreError> {
        let size = bytes.len();
        let response = self
            .request(reqwest::Method::PUT, bucket, key)?
            .body(bytes)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(status_error(response.status(), bucket, key));
        }

        tracing::info!("Uploaded {}/{} ({} bytes)", bucket, key, size);
        Ok(())
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

fn status_error(status: StatusCode, bucket: &str, key: &str) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::Transport(format!("access denied to {}/{} ({})", bucket, key, status))
        }
        _ => StoreError::Transport(format!("unexpected status {} for {}/{}", status, bucket, key)),
    }
}
