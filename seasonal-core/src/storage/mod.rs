//! Object storage for rendered documents.

mod disk;
mod memory;

pub use disk::DiskBlobStore;
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// A place to put public documents.
#[async_trait]
pub trait BlobStore: Send + Sync + fmt::Debug {
    /// Store `bytes` under `key` and return the object's public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError>;

    /// Remove the object at `key`. Removing a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn backend_name(&self) -> &'static str;
}

/// Reject keys that could escape the store's namespace.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Join a public base URL and an object key.
pub fn public_url(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("recipes/abc/soup-1.pdf").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("recipes/../../etc").is_err());
        assert!(validate_key("recipes//x.pdf").is_err());
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("https://cdn.example.com/", "recipes/a.pdf"),
            "https://cdn.example.com/recipes/a.pdf"
        );
    }
}
