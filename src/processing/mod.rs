//! Server-side command pipeline.

pub mod args;
pub mod dispatcher;
pub mod handle;
pub mod liquid;
pub mod output;
pub mod processor;
pub mod publisher;
pub mod raster;
pub mod resize;

#[cfg(test)]
pub(crate) mod mock;

pub use args::RawArgs;
pub use dispatcher::{FallbackPolicy, Handler, run_pipeline};
pub use handle::{HandleError, ImageHandle, Kwargs, ScopedHandle};
pub use processor::Processor;
pub use publisher::{publish, result_key};
pub use raster::RasterImage;
pub use resize::ResizeFilter;
