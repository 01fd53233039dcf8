use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{validate_key, ObjectAcl, Storage, StorageError, StoredBlob, StoredObject};

/// In-memory object store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<Mutex<HashMap<String, StoredBlob>>>,
    base_url: String,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            objects: Arc::default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Keys currently held, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn put(
        &self,
        bytes: Vec<u8>,
        key: &str,
        content_type: &str,
        acl: ObjectAcl,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        let size = bytes.len() as u64;
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| StorageError::Unavailable("object map poisoned".to_string()))?;
        objects.insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
                acl,
            },
        );
        Ok(StoredObject {
            url: format!("{}/{}", self.base_url, key),
            size,
        })
    }

    fn get(&self, key: &str) -> Result<Option<StoredBlob>, StorageError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| StorageError::Unavailable("object map poisoned".to_string()))?;
        Ok(objects.get(key).cloned())
    }
}
