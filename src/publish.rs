//! Artifact publishing
//!
//! Offline counterpart of the predictor's load path: checks that a trained
//! model and its preprocessor decode the same way the server will decode
//! them, then uploads both to the configured bucket and keys.

use std::env;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::ModelSettings;
use crate::pipeline::{Preprocessor, ENCODER_COLUMNS};
use crate::storage::{ArtifactStore, StoreError};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("environment variable {0} is not set")]
    MissingVariable(&'static str),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid artifact: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Local files to publish
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub model_source: PathBuf,
    pub preprocessor_source: PathBuf,
    pub remove_local: bool,
}

impl PublishRequest {
    pub fn from_env() -> Result<Self, PublishError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, PublishError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_source = lookup("MODEL_SOURCE_FILE")
            .ok_or(PublishError::MissingVariable("MODEL_SOURCE_FILE"))?;
        let preprocessor_source = lookup("PREPROCESSOR_SOURCE_FILE")
            .ok_or(PublishError::MissingVariable("PREPROCESSOR_SOURCE_FILE"))?;

        Ok(Self {
            model_source: PathBuf::from(model_source),
            preprocessor_source: PathBuf::from(preprocessor_source),
            remove_local: lookup("PUBLISH_REMOVE_LOCAL")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

/// One uploaded object
#[derive(Debug, Clone, Serialize)]
pub struct PublishedArtifact {
    pub source: PathBuf,
    pub bucket: String,
    pub key: String,
    pub size_bytes: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub model: PublishedArtifact,
    pub preprocessor: PublishedArtifact,
    pub removed_local: bool,
}

/// Validate both artifacts, then upload them.
///
/// Nothing is uploaded unless both decode.
pub async fn publish_artifacts<S: ArtifactStore>(
    store: &S,
    settings: &ModelSettings,
    request: &PublishRequest,
) -> Result<PublishReport, PublishError> {
    let model_bytes = read_file(&request.model_source).await?;
    let preprocessor_bytes = read_file(&request.preprocessor_source).await?;

    settings
        .model_format
        .decode(&model_bytes)
        .map_err(|reason| PublishError::InvalidArtifact {
            path: request.model_source.clone(),
            reason,
        })?;
    check_preprocessor(&preprocessor_bytes).map_err(|reason| PublishError::InvalidArtifact {
        path: request.preprocessor_source.clone(),
        reason,
    })?;

    let model = upload(store, &settings.bucket, &settings.model_path, &request.model_source, model_bytes).await?;
    let preprocessor = upload(
        store,
        &settings.bucket,
        &settings.preprocessor_path,
        &request.preprocessor_source,
        preprocessor_bytes,
    )
    .await?;

    if request.remove_local {
        for path in [&request.model_source, &request.preprocessor_source] {
            tokio::fs::remove_file(path).await.map_err(|source| PublishError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!("Removed local artifact {}", path.display());
        }
    }

    Ok(PublishReport {
        model,
        preprocessor,
        removed_local: request.remove_local,
    })
}

/// The preprocessor must be fitted on exactly the encoder's output columns
fn check_preprocessor(bytes: &[u8]) -> Result<(), String> {
    let preprocessor = Preprocessor::from_slice(bytes)?;

    if preprocessor.feature_names_in != ENCODER_COLUMNS {
        return Err(format!(
            "fitted on {:?}, expected {:?}",
            preprocessor.feature_names_in, ENCODER_COLUMNS
        ));
    }
    Ok(())
}

async fn read_file(path: &Path) -> Result<Vec<u8>, PublishError> {
    tokio::fs::read(path).await.map_err(|source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    })
}

async fn upload<S: ArtifactStore>(
    store: &S,
    bucket: &str,
    key: &str,
    source: &Path,
    bytes: Vec<u8>,
) -> Result<PublishedArtifact, PublishError> {
    let size_bytes = bytes.len();
    let sha256 = format!("{:x}", Sha256::digest(&bytes));

    store.upload(bytes, bucket, key).await?;
    tracing::info!(%bucket, %key, size_bytes, %sha256, "Published {}", source.display());

    Ok(PublishedArtifact {
        source: source.to_path_buf(),
        bucket: bucket.to_string(),
        key: key.to_string(),
        size_bytes,
        sha256,
    })
}
