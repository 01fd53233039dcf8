use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{validate_key, ObjectAcl, Storage, StorageError, StoredBlob, StoredObject};

const CONTENT_TYPE_SUFFIX: &str = ".content-type";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Filesystem-backed object store.
///
/// Each object is a file named after its key; the content type is kept in a
/// sidecar file next to it. Public objects are world-readable on unix.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn content_type_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}{CONTENT_TYPE_SUFFIX}"))
    }
}

impl Storage for LocalStorage {
    fn put(
        &self,
        bytes: Vec<u8>,
        key: &str,
        content_type: &str,
        acl: ObjectAcl,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        fs::create_dir_all(&self.root)?;

        // Write to a temporary name first so readers never see a partial object
        let path = self.object_path(key);
        let partial = self.root.join(format!(".{key}.partial"));
        fs::write(&partial, &bytes)?;
        set_visibility(&partial, acl)?;
        fs::write(self.content_type_path(key), content_type)?;
        fs::rename(&partial, &path)?;

        let size = bytes.len() as u64;
        debug!("Stored '{}' ({} bytes, {:?})", key, size, acl);

        Ok(StoredObject {
            url: format!("{}/{}", self.public_base_url, key),
            size,
        })
    }

    fn get(&self, key: &str) -> Result<Option<StoredBlob>, StorageError> {
        validate_key(key)?;
        if key.ends_with(CONTENT_TYPE_SUFFIX) {
            return Ok(None);
        }
        let path = self.object_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let content_type = fs::read_to_string(self.content_type_path(key))
            .unwrap_or_else(|_| DEFAULT_CONTENT_TYPE.to_string());

        Ok(Some(StoredBlob {
            bytes,
            content_type,
            acl: visibility(&path)?,
        }))
    }
}

#[cfg(unix)]
fn set_visibility(path: &Path, acl: ObjectAcl) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = match acl {
        ObjectAcl::PublicRead => 0o644,
        ObjectAcl::Private => 0o600,
    };
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(unix)]
fn visibility(path: &Path) -> Result<ObjectAcl, StorageError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)?.permissions().mode();
    Ok(if mode & 0o004 != 0 {
        ObjectAcl::PublicRead
    } else {
        ObjectAcl::Private
    })
}

// No per-object ACL on other platforms; everything under the root is served.
#[cfg(not(unix))]
fn set_visibility(_path: &Path, _acl: ObjectAcl) -> Result<(), StorageError> {
    Ok(())
}

#[cfg(not(unix))]
fn visibility(_path: &Path) -> Result<ObjectAcl, StorageError> {
    Ok(ObjectAcl::PublicRead)
}
