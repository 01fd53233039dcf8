//! Request executor: acquire, run the pipeline, publish, release.
//!
//! The pipeline is synchronous from acquisition through publish. Each request
//! runs inside `tokio::task::spawn_blocking` so the async runtime is never
//! blocked by decoding, pixel work, or storage writes.

use std::sync::Arc;

use tracing::{debug, warn};

use super::dispatcher::{FallbackPolicy, run_pipeline};
use super::handle::{ImageHandle, ScopedHandle};
use super::publisher::publish;
use super::raster::RasterImage;
use crate::config::DEFAULT_MAX_PIXELS;
use crate::core::{ProcessingResult, ProcessingTask};
use crate::source::SourceLoader;
use crate::storage::Storage;
use crate::utils::{ProcessorError, ProcessorResult};

/// Processes requests against one source loader and one storage backend.
#[derive(Clone)]
pub struct Processor {
    source: Arc<dyn SourceLoader>,
    storage: Arc<dyn Storage>,
    fallback: FallbackPolicy,
    max_pixels: u64,
}

impl Processor {
    pub fn new(
        source: Arc<dyn SourceLoader>,
        storage: Arc<dyn Storage>,
        fallback: FallbackPolicy,
    ) -> Self {
        Self {
            source,
            storage,
            fallback,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    /// Caps the size of every image a command may produce.
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Runs `task` on the blocking pool.
    pub async fn execute(&self, task: ProcessingTask) -> ProcessorResult<ProcessingResult> {
        let processor = self.clone();
        tokio::task::spawn_blocking(move || processor.process(&task))
            .await
            .map_err(|e| ProcessorError::Job(format!("Task panicked: {e}")))?
    }

    /// Fetches and decodes the task's source, then processes it.
    pub fn process(&self, task: &ProcessingTask) -> ProcessorResult<ProcessingResult> {
        let bytes = self.source.load(&task.source)?;
        debug!("Loaded source '{}' ({} bytes)", task.source, bytes.len());
        let image = RasterImage::open(&bytes)?.with_max_pixels(self.max_pixels);
        drop(bytes);
        self.process_handle(image, task)
    }

    /// Runs the pipeline on an already acquired handle and publishes the result.
    ///
    /// The handle is closed on every exit path.
    pub fn process_handle<H: ImageHandle>(
        &self,
        handle: H,
        task: &ProcessingTask,
    ) -> ProcessorResult<ProcessingResult> {
        let mut image = ScopedHandle::new(handle);

        let outcome = run_pipeline(&mut *image, task, &self.fallback).and_then(|(original, result)| {
            let stored = publish(&*image, self.storage.as_ref())?;
            Ok(ProcessingResult {
                original,
                result,
                result_url: stored.url,
                result_filesize: stored.size,
            })
        });

        if let Err(e) = &outcome {
            warn!("Processing '{}' failed: {}", task.source, e);
        }
        outcome
    }
}
