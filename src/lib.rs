// Module declarations in dependency order
pub mod utils;
pub mod config;
pub mod storage;
pub mod source;
pub mod processing;
pub mod core;
pub mod client;
pub mod server;

// Public exports for external consumers
pub use client::{MutoClient, ProcessedImage};
pub use config::ServerConfig;
pub use core::{AppState, ImageMetadataSnapshot, ProcessingRequest, ProcessingResult};
pub use processing::Processor;
pub use utils::{ClientError, ClientResult, ProcessorError, ProcessorResult};

// The server entry point is in main.rs.
