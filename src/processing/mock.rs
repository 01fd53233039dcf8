//! Recording [`ImageHandle`] for pipeline tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::Rgba;

use super::args::CropBox;
use super::handle::{HandleError, ImageHandle, Kwargs};
use super::resize::ResizeFilter;
use crate::utils::{ImageFormat, ProcessorResult};

pub struct MockHandle {
    pub dimensions: (u32, u32),
    pub format: ImageFormat,
    pub calls: Vec<String>,
    pub closed: Arc<AtomicUsize>,
}

impl MockHandle {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dimensions: (width, height),
            format: ImageFormat::PNG,
            calls: Vec::new(),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ImageHandle for MockHandle {
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn format(&self) -> ImageFormat {
        self.format
    }

    fn depth(&self) -> u8 {
        8
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn set_format(&mut self, format: ImageFormat) {
        self.calls.push(format!("format:{}", format.name()));
        self.format = format;
    }

    fn set_compression_quality(&mut self, quality: u8) {
        self.calls.push(format!("quality:{quality}"));
    }

    fn resize(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
        _filter: ResizeFilter,
        _blur: f64,
    ) -> Result<(), HandleError> {
        self.calls.push("resize".to_string());
        self.dimensions = (
            width.unwrap_or(self.dimensions.0),
            height.unwrap_or(self.dimensions.1),
        );
        Ok(())
    }

    fn crop(&mut self, area: CropBox) -> Result<(), HandleError> {
        self.calls.push("crop".to_string());
        self.dimensions = (area.width, area.height);
        Ok(())
    }

    fn rotate(&mut self, degree: f64, _background: Option<Rgba<u8>>) -> Result<(), HandleError> {
        self.calls.push(format!("rotate:{degree}"));
        if (degree / 90.0).round() as i64 % 2 != 0 {
            self.dimensions = (self.dimensions.1, self.dimensions.0);
        }
        Ok(())
    }

    fn flip(&mut self) {
        self.calls.push("flip".to_string());
    }

    fn flop(&mut self) {
        self.calls.push("flop".to_string());
    }

    fn liquid_rescale(
        &mut self,
        width: u32,
        height: u32,
        _delta_x: u32,
        _rigidity: f64,
    ) -> Result<(), HandleError> {
        self.calls.push("liquid_rescale".to_string());
        self.dimensions = (width, height);
        Ok(())
    }

    fn transparentize(&mut self, _transparency: f64) -> Result<(), HandleError> {
        self.calls.push("transparentize".to_string());
        Ok(())
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &["sepia", "explode"]
    }

    fn invoke(&mut self, capability: &str, kwargs: &Kwargs) -> Result<(), HandleError> {
        match capability {
            "sepia" => {
                self.calls.push(format!("sepia:{}", kwargs.len()));
                Ok(())
            }
            "explode" => Err(HandleError::Failed("boom".to_string())),
            other => Err(HandleError::Unsupported(other.to_string())),
        }
    }

    fn to_blob(&self) -> ProcessorResult<Vec<u8>> {
        Ok(vec![0u8; 16])
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
