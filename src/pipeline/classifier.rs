//! Classifier - model artifact decoding and inference
//!
//! Two artifact formats are understood: an ONNX graph run through ONNX
//! Runtime, and a JSON linear model. Both return the raw class label the
//! model itself decides on.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::encoder::EncodedRow;
use super::error::InferenceError;

// ============================================================================
// LABEL
// ============================================================================

/// Binary response label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    No = 0,
    Yes = 1,
}

impl Label {
    pub fn from_raw(raw: i64) -> Result<Self, InferenceError> {
        match raw {
            0 => Ok(Label::No),
            1 => Ok(Label::Yes),
            other => Err(InferenceError(format!("model produced non-binary label {}", other))),
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    /// Status string rendered back to the user
    pub fn status(self) -> &'static str {
        match self {
            Label::Yes => "Response-Yes",
            Label::No => "Response-No",
        }
    }
}

// ============================================================================
// FORMATS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Onnx,
    Linear,
}

impl ModelFormat {
    /// Guess the format from the storage key
    pub fn from_key(key: &str) -> Self {
        if key.to_ascii_lowercase().ends_with(".json") {
            ModelFormat::Linear
        } else {
            ModelFormat::Onnx
        }
    }

    /// Decode a model artifact in this format
    pub fn decode(self, bytes: &[u8]) -> Result<Box<dyn Classifier>, String> {
        match self {
            ModelFormat::Onnx => Ok(Box::new(OnnxClassifier::from_bytes(bytes)?)),
            ModelFormat::Linear => Ok(Box::new(LinearClassifier::from_slice(bytes)?)),
        }
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(ModelFormat::Onnx),
            "linear" | "json" => Ok(ModelFormat::Linear),
            other => Err(format!("unknown model format '{}'", other)),
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFormat::Onnx => write!(f, "onnx"),
            ModelFormat::Linear => write!(f, "linear"),
        }
    }
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// A loaded model able to label one encoded row
pub trait Classifier: Send + Sync {
    fn predict(&self, row: &EncodedRow) -> Result<Label, InferenceError>;
    fn format(&self) -> ModelFormat;
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

/// ONNX Runtime session over a `[1, n]` float input
pub struct OnnxClassifier {
    session: Mutex<Session>,
    label_output: Option<String>,
    score_output: Option<String>,
}

impl OnnxClassifier {
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, String> {
        tracing::info!("Loading ONNX model from memory ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| format!("Session builder error: {}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| format!("Optimization error: {}", e))?
            .commit_from_memory(model_bytes)
            .map_err(|e| format!("Load from memory error: {}", e))?;

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let score_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.iter().find(|o| !o.name.contains("label")))
            .map(|o| o.name.clone());

        if label_output.is_none() && score_output.is_none() {
            return Err("model defines no usable output".to_string());
        }

        tracing::info!(
            label_output = ?label_output,
            score_output = ?score_output,
            "ONNX model loaded successfully"
        );

        Ok(Self {
            session: Mutex::new(session),
            label_output,
            score_output,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, row: &EncodedRow) -> Result<Label, InferenceError> {
        let features = row.to_f32();
        let input_array = Array2::<f32>::from_shape_vec((1, features.len()), features)
            .map_err(|e| InferenceError(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError(format!("Inference failed: {}", e)))?;

        if let Some(name) = &self.label_output {
            let output = outputs
                .get(name.as_str())
                .ok_or_else(|| InferenceError(format!("No output '{}'", name)))?;
            let (_, data) = output
                .try_extract_tensor::<i64>()
                .map_err(|e| InferenceError(format!("Extract error: {}", e)))?;
            let raw = data
                .first()
                .copied()
                .ok_or_else(|| InferenceError("Empty label output".to_string()))?;
            return Label::from_raw(raw);
        }

        let name = self
            .score_output
            .as_ref()
            .ok_or_else(|| InferenceError("No output defined".to_string()))?;
        let output = outputs
            .get(name.as_str())
            .ok_or_else(|| InferenceError(format!("No output '{}'", name)))?;
        let (_, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError(format!("Extract error: {}", e)))?;

        label_from_scores(scores)
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::Onnx
    }
}

/// Decision threshold for models exposing only P(class = 1)
const POSITIVE_THRESHOLD: f32 = 0.5;

/// Label from a single row of scores.
///
/// One score is read as the positive-class probability; two or more are
/// per-class scores resolved by arg-max.
fn label_from_scores(scores: &[f32]) -> Result<Label, InferenceError> {
    if let [p] = scores {
        if !p.is_finite() {
            return Err(InferenceError(format!("non-finite probability {}", p)));
        }
        return Ok(if *p > POSITIVE_THRESHOLD { Label::Yes } else { Label::No });
    }

    let best = scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
        .ok_or_else(|| InferenceError("Empty score output".to_string()))?;

    Label::from_raw(best.0 as i64)
}

// ============================================================================
// LINEAR IMPLEMENTATION
// ============================================================================

/// Linear decision function: label 1 when `intercept + w·x > 0`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearClassifier {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, String> {
        let model: Self = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        if model.feature_names.len() != model.coefficients.len() {
            return Err(format!(
                "{} feature names but {} coefficients",
                model.feature_names.len(),
                model.coefficients.len()
            ));
        }
        Ok(model)
    }

    pub fn decision(&self, row: &EncodedRow) -> Result<f64, InferenceError> {
        if row.names != self.feature_names {
            return Err(InferenceError(format!(
                "model expects features {:?}, got {:?}",
                self.feature_names, row.names
            )));
        }

        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(&row.values)
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, row: &EncodedRow) -> Result<Label, InferenceError> {
        let score = self.decision(row)?;
        Ok(if score > 0.0 { Label::Yes } else { Label::No })
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::Linear
    }
}
