//! Source acquisition: turns a request's `source` reference into encoded bytes.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::utils::{ProcessorError, ProcessorResult};

/// Fetches the encoded bytes a source reference points at.
pub trait SourceLoader: Send + Sync {
    fn load(&self, source: &str) -> ProcessorResult<Vec<u8>>;
}

/// Loads `http(s)://` sources over the network.
///
/// `file://` sources are read from disk only when enabled with
/// [`HttpSource::with_file_sources`]; otherwise they are unavailable.
#[derive(Debug, Clone)]
pub struct HttpSource {
    timeout: Duration,
    max_bytes: u64,
    file_sources: bool,
}

impl HttpSource {
    pub fn new(timeout: Duration, max_bytes: u64) -> Self {
        Self {
            timeout,
            max_bytes,
            file_sources: false,
        }
    }

    pub fn with_file_sources(mut self, allowed: bool) -> Self {
        self.file_sources = allowed;
        self
    }

    fn load_http(&self, url: &str) -> ProcessorResult<Vec<u8>> {
        // The blocking client owns a runtime thread; it is built and dropped on
        // the blocking pool together with the rest of the pipeline.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProcessorError::source(format!("HTTP client setup failed: {e}")))?;

        let response = client
            .get(url)
            .send()
            .map_err(|e| ProcessorError::source(format!("Failed to fetch '{url}': {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcessorError::source(format!(
                "Fetching '{url}' returned HTTP {status}"
            )));
        }
        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(self.too_large(url));
            }
        }

        self.read_capped(url, response)
    }

    fn load_file(&self, url: &str, path: PathBuf) -> ProcessorResult<Vec<u8>> {
        let file = std::fs::File::open(&path)
            .map_err(|e| ProcessorError::source(format!("Cannot open '{url}': {e}")))?;
        self.read_capped(url, file)
    }

    fn read_capped(&self, url: &str, reader: impl Read) -> ProcessorResult<Vec<u8>> {
        let mut bytes = Vec::new();
        reader
            .take(self.max_bytes + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| ProcessorError::source(format!("Failed reading '{url}': {e}")))?;

        if bytes.len() as u64 > self.max_bytes {
            return Err(self.too_large(url));
        }
        if bytes.is_empty() {
            return Err(ProcessorError::source(format!("'{url}' is empty")));
        }

        debug!("Loaded {} bytes from '{}'", bytes.len(), url);
        Ok(bytes)
    }

    fn too_large(&self, url: &str) -> ProcessorError {
        ProcessorError::source(format!(
            "'{url}' exceeds the {} byte source limit",
            self.max_bytes
        ))
    }
}

impl SourceLoader for HttpSource {
    fn load(&self, source: &str) -> ProcessorResult<Vec<u8>> {
        let source = source.trim();
        let lower = source.to_ascii_lowercase();

        if lower.starts_with("http://") || lower.starts_with("https://") {
            self.load_http(source)
        } else if let Some(path) = source.strip_prefix("file://") {
            if !self.file_sources {
                return Err(ProcessorError::source(format!(
                    "file:// sources are disabled: '{source}'"
                )));
            }
            self.load_file(source, PathBuf::from(path))
        } else {
            Err(ProcessorError::source(format!(
                "Unsupported source reference: '{source}'"
            )))
        }
    }
}
