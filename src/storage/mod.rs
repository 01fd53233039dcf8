//! Blob storage backends for published results.
//!
//! - [`LocalStorage`]: objects on disk, served back by the HTTP layer.
//! - [`MemoryStorage`]: objects held in memory, for tests and embedding.

mod local;
mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Visibility of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAcl {
    Private,
    PublicRead,
}

/// Location and size of a written object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub url: String,
    pub size: u64,
}

/// A stored object read back with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub acl: ObjectAcl,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend could not be reached or written
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// Backend refused the write
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Key contains path separators or is otherwise unusable
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

/// Object store the result publisher writes to.
///
/// Writes are blocking; callers run them on the blocking pool together with
/// the rest of the pipeline.
pub trait Storage: Send + Sync {
    fn put(
        &self,
        bytes: Vec<u8>,
        key: &str,
        content_type: &str,
        acl: ObjectAcl,
    ) -> Result<StoredObject, StorageError>;

    /// Reads an object back. `Ok(None)` when the key does not exist.
    fn get(&self, key: &str) -> Result<Option<StoredBlob>, StorageError>;
}

/// Rejects keys that could escape a flat namespace.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
