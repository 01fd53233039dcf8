//! The image handle the pipeline mutates, and its scoped-release guard.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use image::Rgba;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::args::CropBox;
use super::resize::ResizeFilter;
use crate::utils::{ImageFormat, ProcessorResult};

/// Keyword arguments in the handle's native form.
pub type Kwargs = Map<String, Value>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The handle has no capability with this name
    #[error("unsupported capability '{0}'")]
    Unsupported(String),
    /// The capability exists but rejected its arguments
    #[error("{0}")]
    InvalidArgument(String),
    /// The operation itself failed
    #[error("{0}")]
    Failed(String),
}

/// Bounded capability interface over one decoded image.
///
/// Specialised handlers call the typed primitives; fallback dispatch goes
/// through [`ImageHandle::invoke`] for the names listed by
/// [`ImageHandle::capabilities`].
pub trait ImageHandle {
    fn dimensions(&self) -> (u32, u32);
    fn format(&self) -> ImageFormat;
    fn mimetype(&self) -> &'static str {
        self.format().mimetype()
    }
    /// Bits per channel
    fn depth(&self) -> u8;
    fn metadata(&self) -> BTreeMap<String, String>;

    fn set_format(&mut self, format: ImageFormat);
    fn set_compression_quality(&mut self, quality: u8);

    /// Absent dimensions keep the current size.
    fn resize(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
        filter: ResizeFilter,
        blur: f64,
    ) -> Result<(), HandleError>;
    fn crop(&mut self, area: CropBox) -> Result<(), HandleError>;
    /// Clockwise rotation; the canvas grows to fit and is filled with `background`.
    fn rotate(&mut self, degree: f64, background: Option<Rgba<u8>>) -> Result<(), HandleError>;
    /// Mirror top to bottom
    fn flip(&mut self);
    /// Mirror left to right
    fn flop(&mut self);
    fn liquid_rescale(
        &mut self,
        width: u32,
        height: u32,
        delta_x: u32,
        rigidity: f64,
    ) -> Result<(), HandleError>;
    fn transparentize(&mut self, transparency: f64) -> Result<(), HandleError>;

    /// Names reachable through fallback dispatch.
    fn capabilities(&self) -> &'static [&'static str];
    fn invoke(&mut self, capability: &str, kwargs: &Kwargs) -> Result<(), HandleError>;

    /// Encodes the image in its current format and quality.
    fn to_blob(&self) -> ProcessorResult<Vec<u8>>;
    /// Releases pixel buffers. Called exactly once by [`ScopedHandle`].
    fn close(&mut self);
}

/// Owns a handle for the duration of one request and closes it on every exit path.
pub struct ScopedHandle<H: ImageHandle> {
    handle: H,
}

impl<H: ImageHandle> ScopedHandle<H> {
    pub fn new(handle: H) -> Self {
        Self { handle }
    }
}

impl<H: ImageHandle> Deref for ScopedHandle<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H: ImageHandle> DerefMut for ScopedHandle<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.handle
    }
}

impl<H: ImageHandle> Drop for ScopedHandle<H> {
    fn drop(&mut self) {
        self.handle.close();
        debug!("Image handle released");
    }
}

/// Reads typed keyword arguments for one capability and rejects leftovers.
pub struct KwargReader<'a> {
    capability: &'a str,
    kwargs: &'a Kwargs,
    seen: Vec<&'static str>,
}

impl<'a> KwargReader<'a> {
    pub fn new(capability: &'a str, kwargs: &'a Kwargs) -> Self {
        Self {
            capability,
            kwargs,
            seen: Vec::new(),
        }
    }

    fn lookup(&mut self, key: &'static str) -> Option<&'a Value> {
        self.seen.push(key);
        self.kwargs.get(key).filter(|v| !v.is_null())
    }

    fn invalid(&self, key: &str, expected: &str) -> HandleError {
        HandleError::InvalidArgument(format!(
            "{}() argument '{}' must be {}",
            self.capability, key, expected
        ))
    }

    pub fn optional_f32(&mut self, key: &'static str) -> Result<Option<f32>, HandleError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| Some(f as f32))
                .ok_or_else(|| self.invalid(key, "a number")),
        }
    }

    pub fn f32(&mut self, key: &'static str) -> Result<f32, HandleError> {
        self.optional_f32(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn optional_i32(&mut self, key: &'static str) -> Result<Option<i32>, HandleError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(key, "an integer")),
        }
    }

    pub fn i32(&mut self, key: &'static str) -> Result<i32, HandleError> {
        self.optional_i32(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn u32(&mut self, key: &'static str) -> Result<u32, HandleError> {
        let value = self.i32(key)?;
        u32::try_from(value)
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| self.invalid(key, "a positive integer"))
    }

    fn missing(&self, key: &str) -> HandleError {
        HandleError::InvalidArgument(format!(
            "{}() missing required argument '{}'",
            self.capability, key
        ))
    }

    /// Fails on any keyword that was never read.
    pub fn finish(self) -> Result<(), HandleError> {
        match self.kwargs.keys().find(|k| !self.seen.iter().any(|s| *s == k.as_str())) {
            Some(key) => Err(HandleError::InvalidArgument(format!(
                "{}() got an unexpected keyword argument '{}'",
                self.capability, key
            ))),
            None => Ok(()),
        }
    }
}
