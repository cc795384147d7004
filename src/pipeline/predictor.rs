//! Model Predictor
//!
//! Owns the artifact cache for one (bucket, model key, preprocessor key)
//! triple. Each artifact sits behind a load-once cell: the first `predict`
//! fetches and decodes it, concurrent first callers wait on that single
//! fetch, and a failed load leaves the cell empty so a later call retries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;

use super::classifier::{Classifier, Label};
use super::encoder::{encode, EncodedRow};
use super::error::PredictError;
use super::preprocessor::Preprocessor;
use crate::config::ModelSettings;
use crate::models::{DataRow, VehicleData};
use crate::storage::ArtifactStore;

/// Where and when an artifact was loaded from
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub bucket: String,
    pub key: String,
    pub size_bytes: usize,
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
}

struct Loaded<T> {
    value: T,
    info: ArtifactInfo,
}

/// Loaded state reported by health checks
#[derive(Debug, Clone, Serialize)]
pub struct PredictorStatus {
    pub model_loaded: bool,
    pub preprocessor_loaded: bool,
    pub model_format: String,
    pub model: Option<ArtifactInfo>,
    pub preprocessor: Option<ArtifactInfo>,
}

pub struct Predictor<S> {
    store: S,
    settings: ModelSettings,
    model: OnceCell<Loaded<Box<dyn Classifier>>>,
    preprocessor: OnceCell<Loaded<Preprocessor>>,
}

impl<S: ArtifactStore> Predictor<S> {
    /// Create an empty (unloaded) predictor
    pub fn new(store: S, settings: ModelSettings) -> Self {
        Self {
            store,
            settings,
            model: OnceCell::new(),
            preprocessor: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True once both artifacts are cached
    pub fn is_loaded(&self) -> bool {
        self.model.initialized() && self.preprocessor.initialized()
    }

    pub fn status(&self) -> PredictorStatus {
        PredictorStatus {
            model_loaded: self.model.initialized(),
            preprocessor_loaded: self.preprocessor.initialized(),
            model_format: self.settings.model_format.to_string(),
            model: self.model.get().map(|l| l.info.clone()),
            preprocessor: self.preprocessor.get().map(|l| l.info.clone()),
        }
    }

    /// Label one validated record
    pub async fn predict(&self, record: &VehicleData) -> Result<Label, PredictError> {
        self.predict_row(&record.to_row()).await
    }

    /// Label one canonical raw row
    pub async fn predict_row(&self, raw: &DataRow) -> Result<Label, PredictError> {
        let (model, preprocessor) = self.ensure_loaded().await?;

        let encoded = encode(raw, preprocessor)?;
        let label = model.predict(&encoded)?;

        tracing::debug!(label = label.value(), "Prediction complete");
        Ok(label)
    }

    /// Encode a row with the cached preprocessor without running the model
    pub async fn encode_row(&self, raw: &DataRow) -> Result<EncodedRow, PredictError> {
        let (_, preprocessor) = self.ensure_loaded().await?;
        Ok(encode(raw, preprocessor)?)
    }

    /// Unloaded -> Loaded transition; no-op once both artifacts are cached
    pub async fn ensure_loaded(&self) -> Result<(&dyn Classifier, &Preprocessor), PredictError> {
        let model = self
            .model
            .get_or_try_init(|| self.load_model())
            .await?;
        let preprocessor = self
            .preprocessor
            .get_or_try_init(|| self.load_preprocessor())
            .await?;

        Ok((model.value.as_ref(), &preprocessor.value))
    }

    async fn load_model(&self) -> Result<Loaded<Box<dyn Classifier>>, PredictError> {
        let key = &self.settings.model_path;
        let (bytes, info) = self.fetch_artifact(key).await?;

        let value = self
            .settings
            .model_format
            .decode(&bytes)
            .map_err(|reason| PredictError::InvalidArtifact {
                key: key.clone(),
                reason,
            })?;

        tracing::info!(
            bucket = %info.bucket,
            key = %info.key,
            format = %value.format(),
            sha256 = %info.sha256,
            "Model artifact loaded"
        );
        Ok(Loaded { value, info })
    }

    async fn load_preprocessor(&self) -> Result<Loaded<Preprocessor>, PredictError> {
        let key = &self.settings.preprocessor_path;
        let (bytes, info) = self.fetch_artifact(key).await?;

        let value = Preprocessor::from_slice(&bytes).map_err(|reason| PredictError::InvalidArtifact {
            key: key.clone(),
            reason,
        })?;

        tracing::info!(
            bucket = %info.bucket,
            key = %info.key,
            features = value.feature_names_in.len(),
            sha256 = %info.sha256,
            "Preprocessor artifact loaded"
        );
        Ok(Loaded { value, info })
    }

    async fn fetch_artifact(&self, key: &str) -> Result<(Vec<u8>, ArtifactInfo), PredictError> {
        let bucket = &self.settings.bucket;

        if !self.store.exists(bucket, key).await? {
            tracing::warn!("Artifact {}/{} not found", bucket, key);
            return Err(PredictError::ArtifactNotFound {
                bucket: bucket.clone(),
                key: key.to_string(),
            });
        }

        let bytes = self.store.fetch_bytes(bucket, key).await?;

        let info = ArtifactInfo {
            bucket: bucket.clone(),
            key: key.to_string(),
            size_bytes: bytes.len(),
            sha256: format!("{:x}", Sha256::digest(&bytes)),
            loaded_at: Utc::now(),
        };

        Ok((bytes, info))
    }
}
