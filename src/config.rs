//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::pipeline::ModelFormat;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Where the model and preprocessor artifacts live
    pub model: ModelSettings,

    /// Artifact storage backend
    pub storage: StorageSettings,

    /// Directory served under /static
    pub static_dir: PathBuf,

    /// Environment (development, production)
    pub environment: String,
}

/// Bucket and keys of the two artifacts served by this process
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub bucket: String,
    pub model_path: String,
    pub preprocessor_path: String,
    pub model_format: ModelFormat,
}

impl ModelSettings {
    /// Settings with the model format inferred from the model key
    pub fn new(
        bucket: impl Into<String>,
        model_path: impl Into<String>,
        preprocessor_path: impl Into<String>,
    ) -> Self {
        let model_path = model_path.into();
        Self {
            bucket: bucket.into(),
            model_format: ModelFormat::from_key(&model_path),
            model_path,
            preprocessor_path: preprocessor_path.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// S3-compatible HTTP endpoint
    Http,
    /// Directory on local disk
    Local,
}

/// Storage backend configuration
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub kind: StorageKind,

    /// Base URL for the HTTP backend (path-style: {endpoint}/{bucket}/{key})
    pub endpoint: String,

    /// Optional bearer token sent to the HTTP backend
    pub token: Option<String>,

    /// Root directory for the local backend
    pub root: PathBuf,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_path = lookup("MODEL_FILE_PATH").unwrap_or_else(|| "model.onnx".to_string());

        let model_format = match lookup("MODEL_FORMAT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Unknown MODEL_FORMAT '{}', inferring from model path", raw);
                ModelFormat::from_key(&model_path)
            }),
            None => ModelFormat::from_key(&model_path),
        };

        let kind = match lookup("STORAGE_BACKEND").as_deref() {
            Some("local") => StorageKind::Local,
            Some("http") | None => StorageKind::Http,
            Some(other) => {
                tracing::warn!("Unknown STORAGE_BACKEND '{}', using http", other);
                StorageKind::Http
            }
        };

        Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: lookup("APP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),

            model: ModelSettings {
                bucket: lookup("MODEL_BUCKET_NAME")
                    .unwrap_or_else(|| "vehicle-insurance-models".to_string()),
                preprocessor_path: lookup("PREPROCESSOR_FILE_PATH")
                    .unwrap_or_else(|| "preprocessor.json".to_string()),
                model_path,
                model_format,
            },

            storage: StorageSettings {
                kind,
                endpoint: lookup("STORAGE_ENDPOINT")
                    .unwrap_or_else(|| "http://localhost:9000".to_string()),
                token: lookup("STORAGE_TOKEN").filter(|t| !t.is_empty()),
                root: lookup("STORAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./artifacts")),
                timeout_secs: lookup("STORAGE_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },

            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),

            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.model.bucket, "vehicle-insurance-models");
        assert_eq!(config.model.model_format, ModelFormat::Onnx);
        assert_eq!(config.storage.kind, StorageKind::Http);
        assert!(config.storage.token.is_none());
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_model_format_inferred_from_key() {
        let config = config_with(&[("MODEL_FILE_PATH", "models/linear.json")]);
        assert_eq!(config.model.model_format, ModelFormat::Linear);
    }

    #[test]
    fn test_explicit_format_wins() {
        let config = config_with(&[
            ("MODEL_FILE_PATH", "models/model.bin"),
            ("MODEL_FORMAT", "linear"),
        ]);
        assert_eq!(config.model.model_format, ModelFormat::Linear);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = config_with(&[
            ("APP_PORT", "not-a-port"),
            ("STORAGE_BACKEND", "ftp"),
            ("MODEL_FORMAT", "pickle"),
            ("STORAGE_TOKEN", ""),
        ]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.storage.kind, StorageKind::Http);
        assert_eq!(config.model.model_format, ModelFormat::Onnx);
        assert!(config.storage.token.is_none());
    }

    #[test]
    fn test_local_backend() {
        let config = config_with(&[
            ("STORAGE_BACKEND", "local"),
            ("STORAGE_ROOT", "/srv/artifacts"),
            ("ENVIRONMENT", "production"),
        ]);
        assert_eq!(config.storage.kind, StorageKind::Local);
        assert_eq!(config.storage.root, PathBuf::from("/srv/artifacts"));
        assert_eq!(config.environment, "production");
    }
}
