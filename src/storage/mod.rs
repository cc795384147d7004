//! Artifact storage
//!
//! Named byte blobs addressed by (bucket, key). The predictor only reads;
//! `upload` exists for the offline publishing flow.

pub mod http;
pub mod local;
pub mod memory;

pub use http::HttpArtifactStore;
pub use local::LocalArtifactStore;
pub use memory::MemoryArtifactStore;

use std::future::Future;

use thiserror::Error;

use crate::config::{StorageKind, StorageSettings};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Object storage used for model artifacts
pub trait ArtifactStore: Send + Sync {
    fn exists(&self, bucket: &str, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn fetch_bytes(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;

    fn upload(
        &self,
        bytes: Vec<u8>,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Backend chosen at startup
pub enum ArtifactBackend {
    Http(HttpArtifactStore),
    Local(LocalArtifactStore),
    Memory(MemoryArtifactStore),
}

impl ArtifactBackend {
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StoreError> {
        match settings.kind {
            StorageKind::Http => Ok(ArtifactBackend::Http(HttpArtifactStore::new(
                &settings.endpoint,
                settings.token.clone(),
                settings.timeout_secs,
            )?)),
            StorageKind::Local => Ok(ArtifactBackend::Local(LocalArtifactStore::new(&settings.root))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArtifactBackend::Http(_) => "http",
            ArtifactBackend::Local(_) => "local",
            ArtifactBackend::Memory(_) => "memory",
        }
    }
}

impl ArtifactStore for ArtifactBackend {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        match self {
            ArtifactBackend::Http(s) => s.exists(bucket, key).await,
            ArtifactBackend::Local(s) => s.exists(bucket, key).await,
            ArtifactBackend::Memory(s) => s.exists(bucket, key).await,
        }
    }

    async fn fetch_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        match self {
            ArtifactBackend::Http(s) => s.fetch_bytes(bucket, key).await,
            ArtifactBackend::Local(s) => s.fetch_bytes(bucket, key).await,
            ArtifactBackend::Memory(s) => s.fetch_bytes(bucket, key).await,
        }
    }

    async fn upload(&self, bytes: Vec<u8>, bucket: &str, key: &str) -> Result<(), StoreError> {
        match self {
            ArtifactBackend::Http(s) => s.upload(bytes, bucket, key).await,
            ArtifactBackend::Local(s) => s.upload(bytes, bucket, key).await,
            ArtifactBackend::Memory(s) => s.upload(bytes, bucket, key).await,
        }
    }
}

/// Reject keys that could escape the bucket
pub(crate) fn check_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
