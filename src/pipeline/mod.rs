//! Inference pipeline: raw record -> encoded features -> label

pub mod classifier;
pub mod encoder;
pub mod error;
pub mod predictor;
pub mod preprocessor;

pub use classifier::{Classifier, Label, LinearClassifier, ModelFormat, OnnxClassifier};
pub use encoder::{encode, EncodedRow, ENCODER_COLUMNS};
pub use error::{EncodingError, InferenceError, PredictError};
pub use predictor::{ArtifactInfo, Predictor, PredictorStatus};
pub use preprocessor::Preprocessor;
