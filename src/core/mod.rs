//! Core types and state shared by the client, the pipeline and the server.
//!
//! - [`AppState`]: server state handed to every HTTP handler
//! - [`ProcessingRequest`] / [`Command`]: the request as the client builds it
//! - [`ProcessingTask`]: the same request as the server runs it
//! - [`ImageMetadataSnapshot`] / [`ProcessingResult`]: what a run reports back

mod state;
mod task;
mod types;

pub use state::AppState;
pub use task::{Command, OutputOptions, PipelineCommand, ProcessingRequest, ProcessingTask};
pub use types::{ImageMetadataSnapshot, ProcessResponse, ProcessingResult};
