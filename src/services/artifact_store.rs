use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

/// What the binary-object store hands back for a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub url: String,
    pub artifact_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactStoreError {
    #[error("{0}")]
    Provider(String),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persists `bytes` under `logical_name` and returns a durable URL.
    async fn store(
        &self,
        bytes: Bytes,
        media_type: &str,
        logical_name: &str,
    ) -> Result<StoredArtifact, ArtifactStoreError>;
}

/// Writes artifacts below a directory that the HTTP layer serves at
/// `/uploads`.
#[derive(Clone)]
pub struct LocalDiskStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDiskStore {
    pub const SUBDIR: &'static str = "resumes";

    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ArtifactStore for LocalDiskStore {
    async fn store(
        &self,
        bytes: Bytes,
        media_type: &str,
        logical_name: &str,
    ) -> Result<StoredArtifact, ArtifactStoreError> {
        if logical_name.contains('/') || logical_name.contains("..") {
            return Err(ArtifactStoreError::Provider(format!(
                "refusing unsafe artifact name `{}`",
                logical_name
            )));
        }

        let dir = self.root.join(Self::SUBDIR);
        fs::create_dir_all(&dir).await?;
        let path = dir.join(logical_name);
        fs::write(&path, &bytes).await.map_err(|e| {
            tracing::error!("Failed to write artifact {}: {}", path.display(), e);
            e
        })?;

        tracing::info!(
            media_type,
            size = bytes.len(),
            "Stored artifact {}",
            logical_name
        );
        Ok(StoredArtifact {
            url: format!("{}/uploads/{}/{}", self.public_base_url, Self::SUBDIR, logical_name),
            artifact_id: format!("{}/{}", Self::SUBDIR, logical_name),
        })
    }
}

/// Keeps artifacts in process memory; used by tests and local demos.
#[derive(Clone, Default)]
pub struct MemoryArtifactStore {
    objects: Arc<Mutex<HashMap<String, (String, Bytes)>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, artifact_id: &str) -> Option<(String, Bytes)> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(artifact_id).cloned())
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn store(
        &self,
        bytes: Bytes,
        media_type: &str,
        logical_name: &str,
    ) -> Result<StoredArtifact, ArtifactStoreError> {
        let artifact_id = format!("mem/{}", logical_name);
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| ArtifactStoreError::Provider("artifact map poisoned".into()))?;
        objects.insert(artifact_id.clone(), (media_type.to_string(), bytes));
        Ok(StoredArtifact {
            url: format!("memory://{}", artifact_id),
            artifact_id,
        })
    }
}
