use super::{public_url, validate_key, BlobStore, StorageError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Blob store backed by a local directory that the server exposes over HTTP.
#[derive(Debug, Clone)]
pub struct DiskBlobStore {
    root: PathBuf,
    base_url: String,
}

impl DiskBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String, StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), "Wrote blob to disk");
        Ok(public_url(&self.base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskBlobStore::new(dir.path(), "http://localhost:3000/files");

        let url = store
            .put("meal-plans/u1/week-1.pdf", b"%PDF-1.3".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:3000/files/meal-plans/u1/week-1.pdf");

        let written = std::fs::read(dir.path().join("meal-plans/u1/week-1.pdf")).unwrap();
        assert_eq!(written, b"%PDF-1.3");

        store.delete("meal-plans/u1/week-1.pdf").await.unwrap();
        assert!(!dir.path().join("meal-plans/u1/week-1.pdf").exists());
        store.delete("meal-plans/u1/week-1.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskBlobStore::new(dir.path(), "http://localhost/files");
        let err = store.put("../outside.pdf", vec![], "application/pdf").await;
        assert!(matches!(err, Err(StorageError::InvalidKey(_))));
    }
}
