//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use crosssell_server::config::ModelSettings;
use crosssell_server::storage::{ArtifactStore, MemoryArtifactStore, StoreError};

pub const BUCKET: &str = "vehicle-insurance-models";
pub const MODEL_KEY: &str = "model.json";
pub const PREPROCESSOR_KEY: &str = "preprocessor.json";

pub const PREPROCESSOR: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/preprocessor.json"));
pub const LINEAR_MODEL: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/linear_model.json"));

pub const ONNX_KEY: &str = "model.onnx";
pub const LABELLED_ONNX: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/linear_labelled.onnx"));
pub const SCORES_ONNX: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/linear_scores.onnx"));
pub const LOGISTIC_ONNX: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/logistic.onnx"));

pub fn settings() -> ModelSettings {
    ModelSettings::new(BUCKET, MODEL_KEY, PREPROCESSOR_KEY)
}

/// Store holding both fixture artifacts
pub fn seeded_store() -> MemoryArtifactStore {
    MemoryArtifactStore::new()
        .with_object(BUCKET, MODEL_KEY, LINEAR_MODEL)
        .with_object(BUCKET, PREPROCESSOR_KEY, PREPROCESSOR)
}

pub fn onnx_settings() -> ModelSettings {
    ModelSettings::new(BUCKET, ONNX_KEY, PREPROCESSOR_KEY)
}

/// Store holding an ONNX model next to the fixture preprocessor
pub fn onnx_store(model: &[u8]) -> MemoryArtifactStore {
    MemoryArtifactStore::new()
        .with_object(BUCKET, ONNX_KEY, model)
        .with_object(BUCKET, PREPROCESSOR_KEY, PREPROCESSOR)
}

/// The reference customer: interested in vehicle insurance
pub fn reference_fields() -> Map<String, Value> {
    let value = json!({
        "Gender": "Male",
        "Age": 35,
        "Driving_License": 1,
        "Region_Code": 28.0,
        "Previously_Insured": 0,
        "Annual_Premium": 40000.0,
        "Policy_Sales_Channel": 152.0,
        "Vintage": 100,
        "Vehicle_Age": "1-2 Years",
        "Vehicle_Damage": "Yes"
    });
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Already insured, new car, no damage: not interested
pub fn insured_fields() -> Map<String, Value> {
    let mut fields = reference_fields();
    fields.insert("Previously_Insured".into(), json!(1));
    fields.insert("Vehicle_Age".into(), json!("< 1 Year"));
    fields.insert("Vehicle_Damage".into(), json!("No"));
    fields
}

/// Wraps a memory store, counting fetches per key.
///
/// Fetches can be slowed down to widen race windows, and the first
/// `failures` fetches can be made to fail with a transport error.
pub struct CountingStore {
    inner: MemoryArtifactStore,
    fetches: Mutex<HashMap<String, usize>>,
    delay: Duration,
    failures: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: MemoryArtifactStore) -> Self {
        Self {
            inner,
            fetches: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
            failures: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_first(self, failures: usize) -> Self {
        self.failures.store(failures, Ordering::SeqCst);
        self
    }

    pub fn fetch_count(&self, key: &str) -> usize {
        self.fetches.lock().get(key).copied().unwrap_or(0)
    }
}

impl ArtifactStore for CountingStore {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        self.inner.exists(bucket, key).await
    }

    async fn fetch_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        *self.fetches.lock().entry(key.to_string()).or_default() += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Transport("connection reset".into()));
        }

        self.inner.fetch_bytes(bucket, key).await
    }

    async fn upload(&self, bytes: Vec<u8>, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.inner.upload(bytes, bucket, key).await
    }
}
