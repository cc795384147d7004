//! Filesystem object store: `{root}/{bucket}/{key}`

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{check_key, ArtifactStore, StoreError};

pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        check_key(key)?;
        check_key(bucket)?;
        Ok(self.root.join(bucket).join(key))
    }
}

impl ArtifactStore for LocalArtifactStore {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::Transport(format!("{}: {}", path.display(), e)))
    }

    async fn fetch_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(StoreError::Transport(format!("{}: {}", path.display(), e))),
        }
    }

    async fn upload(&self, bytes: Vec<u8>, bucket: &str, key: &str) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Transport(format!("{}: {}", parent.display(), e)))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::Transport(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Stored artifact at {}", path.display());
        Ok(())
    }
}
