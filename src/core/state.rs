//! Server state.

use std::sync::Arc;

use tracing::debug;

use crate::config::ServerConfig;
use crate::processing::{FallbackPolicy, Processor};
use crate::source::{HttpSource, SourceLoader};
use crate::storage::{LocalStorage, Storage};

/// State shared by all HTTP handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    processor: Processor,
}

impl AppState {
    /// Wires the HTTP source loader and the local object store from `config`.
    pub fn new(config: ServerConfig) -> Self {
        let source = HttpSource::new(config.source_timeout, config.max_source_bytes)
            .with_file_sources(config.allow_file_sources);
        let storage = LocalStorage::new(&config.storage_dir, &config.public_base_url);
        debug!(
            "Storing results under {} ({})",
            config.storage_dir.display(),
            config.public_base_url
        );
        Self::with_parts(config, Arc::new(source), Arc::new(storage))
    }

    /// Uses the given collaborators instead of the ones `config` describes.
    pub fn with_parts(
        config: ServerConfig,
        source: Arc<dyn SourceLoader>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let fallback = FallbackPolicy::from_allow_list(config.fallback_capabilities.clone());
        let processor =
            Processor::new(source, storage, fallback).with_max_pixels(config.max_pixels);
        Self {
            config: Arc::new(config),
            processor,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }
}
