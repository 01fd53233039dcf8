//! Handle on a published result.

use std::io::Read;

use crate::core::ImageMetadataSnapshot;
use crate::utils::{ClientError, ClientResult};

/// A processed image: the server's snapshots plus where the bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub original: ImageMetadataSnapshot,
    pub result: ImageMetadataSnapshot,
    pub url: String,
    pub filesize: u64,
}

impl ProcessedImage {
    pub(crate) fn new(
        original: ImageMetadataSnapshot,
        result: ImageMetadataSnapshot,
        url: String,
        filesize: u64,
    ) -> Self {
        Self {
            original,
            result,
            url,
            filesize,
        }
    }

    /// Downloads the whole published image.
    pub fn fetch(&self) -> ClientResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.filesize as usize);
        self.reader()?
            .read_to_end(&mut bytes)
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Ok(bytes)
    }

    /// Streams the published image.
    pub fn reader(&self) -> ClientResult<impl Read> {
        let response = reqwest::blocking::get(&self.url)?.error_for_status()?;
        Ok(response)
    }
}
