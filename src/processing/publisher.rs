//! Result publishing: encode the final image and store it under a fresh key.

use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::debug;

use super::handle::ImageHandle;
use crate::storage::{ObjectAcl, Storage, StoredObject};
use crate::utils::{ImageFormat, ProcessorResult};

const KEY_LENGTH: usize = 32;

/// A random object key with the format's extension, e.g. `aZ3…q9.jpeg`.
///
/// Keys are never derived from content: publishing the same output twice
/// yields two objects.
pub fn result_key(format: ImageFormat) -> String {
    let id: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_LENGTH)
        .map(char::from)
        .collect();
    format!("{}.{}", id, format.primary_extension())
}

/// Encodes `image` in its current format and writes it publicly readable.
pub fn publish(image: &dyn ImageHandle, storage: &dyn Storage) -> ProcessorResult<StoredObject> {
    let bytes = image.to_blob()?;
    let format = image.format();
    let key = result_key(format);
    let size = bytes.len();

    let stored = storage.put(bytes, &key, format.mimetype(), ObjectAcl::PublicRead)?;
    debug!("Published {} ({} bytes)", key, size);
    Ok(stored)
}
