use super::{public_url, validate_key, BlobStore, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Blob store held in memory. Can be told to fail for testing degraded paths.
#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: String,
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://blobs")
    }
}

impl MemoryBlobStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            objects: Mutex::new(HashMap::new()),
            fail_puts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, (Vec<u8>, String)>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects().get(key).map(|(bytes, _)| bytes.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects().get(key).map(|(_, ct)| ct.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("put disabled".to_string()));
        }
        self.objects()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(public_url(&self.base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("delete disabled".to_string()));
        }
        self.objects().remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryBlobStore::new("https://files.test");
        let url = store
            .put("recipes/u/soup.pdf", b"%PDF".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert_eq!(url, "https://files.test/recipes/u/soup.pdf");
        assert_eq!(store.get("recipes/u/soup.pdf").unwrap(), b"%PDF");
        assert_eq!(
            store.content_type("recipes/u/soup.pdf").as_deref(),
            Some("application/pdf")
        );

        store.delete("recipes/u/soup.pdf").await.unwrap();
        assert!(store.is_empty());
        // Deleting again is fine
        store.delete("recipes/u/soup.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_put() {
        let store = MemoryBlobStore::default();
        store.set_fail_puts(true);
        let err = store.put("a/b.pdf", vec![], "application/pdf").await;
        assert!(matches!(err, Err(StorageError::Backend(_))));
        assert!(store.is_empty());
    }
}
