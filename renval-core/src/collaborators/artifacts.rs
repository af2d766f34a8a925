//! Byte storage for presentations, questionnaires, memos and evaluation sheets

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CollaboratorError;
use crate::model::ArtifactRef;

/// Stores blobs under path-like keys.
///
/// `delete` is idempotent: removing an artifact that is already gone
/// succeeds.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under `key`, returning the canonical reference
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<ArtifactRef, CollaboratorError>;

    async fn get(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, CollaboratorError>;

    async fn delete(&self, artifact: &ArtifactRef) -> Result<(), CollaboratorError>;
}

/// Artifact store rooted at a directory on the local filesystem
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key below the root, refusing anything that would escape it
    fn resolve(&self, key: &str) -> Result<PathBuf, CollaboratorError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(CollaboratorError::Artifact(format!(
                "invalid artifact key: {key}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<ArtifactRef, CollaboratorError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(ArtifactRef::new(key))
    }

    async fn get(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, CollaboratorError> {
        let path = self.resolve(artifact.as_str())?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(CollaboratorError::ArtifactMissing(artifact.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, artifact: &ArtifactRef) -> Result<(), CollaboratorError> {
        let path = self.resolve(artifact.as_str())?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory artifact store for tests
#[derive(Default)]
pub struct MemoryArtifactStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, artifact: &ArtifactRef) -> bool {
        self.blobs.read().await.contains_key(artifact.as_str())
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<ArtifactRef, CollaboratorError> {
        self.blobs.write().await.insert(key.to_string(), bytes);
        Ok(ArtifactRef::new(key))
    }

    async fn get(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, CollaboratorError> {
        self.blobs
            .read()
            .await
            .get(artifact.as_str())
            .cloned()
            .ok_or_else(|| CollaboratorError::ArtifactMissing(artifact.to_string()))
    }

    async fn delete(&self, artifact: &ArtifactRef) -> Result<(), CollaboratorError> {
        self.blobs.write().await.remove(artifact.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_store_round_trip_and_idempotent_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());

        let artifact = store
            .put("presentations/a1.pdf", b"slides".to_vec())
            .await
            .unwrap();
        assert_eq!(artifact.as_str(), "presentations/a1.pdf");
        assert!(dir.path().join("presentations/a1.pdf").exists());
        assert_eq!(store.get(&artifact).await.unwrap(), b"slides");

        store.delete(&artifact).await.unwrap();
        store.delete(&artifact).await.unwrap();
        assert!(matches!(
            store.get(&artifact).await,
            Err(CollaboratorError::ArtifactMissing(_))
        ));
    }

    #[tokio::test]
    async fn fs_store_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());

        for key in ["../outside.txt", "/etc/passwd", ""] {
            assert!(
                matches!(
                    store.put(key, Vec::new()).await,
                    Err(CollaboratorError::Artifact(_))
                ),
                "{key:?}"
            );
        }
    }

    #[tokio::test]
    async fn memory_store_delete_of_missing_is_ok() {
        let store = MemoryArtifactStore::new();
        let artifact = store.put("memos/m1.pdf", vec![1, 2, 3]).await.unwrap();
        assert!(store.contains(&artifact).await);

        store.delete(&artifact).await.unwrap();
        store.delete(&artifact).await.unwrap();
        assert!(store.is_empty().await);
    }
}
