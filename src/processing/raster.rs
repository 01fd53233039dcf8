//! [`ImageHandle`] backed by the pure-Rust `image` crate.

use std::collections::BTreeMap;

use image::{ColorType, DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use super::args::CropBox;
use super::handle::{HandleError, ImageHandle, KwargReader, Kwargs};
use super::liquid;
use super::output;
use super::resize::ResizeFilter;
use crate::config::DEFAULT_MAX_PIXELS;
use crate::utils::{ImageFormat, ProcessorError, ProcessorResult};

/// Capabilities reachable by name through fallback dispatch.
const CAPABILITIES: &[&str] = &[
    "blur",
    "fast_blur",
    "unsharpen",
    "brighten",
    "adjust_contrast",
    "huerotate",
    "grayscale",
    "invert",
    "rotate90",
    "rotate180",
    "rotate270",
    "thumbnail",
    "thumbnail_exact",
];

/// A decoded raster image plus the output settings it will be encoded with.
///
/// Commands that would produce more than `max_pixels` pixels fail before
/// anything is allocated.
pub struct RasterImage {
    image: DynamicImage,
    format: ImageFormat,
    quality: Option<u8>,
    max_pixels: u64,
}

impl RasterImage {
    /// Decodes `bytes`, detecting the format from the data itself.
    pub fn open(bytes: &[u8]) -> ProcessorResult<Self> {
        let codec = image::guess_format(bytes)
            .map_err(|e| ProcessorError::source(format!("Unrecognised image data: {e}")))?;
        let format = ImageFormat::from_codec(codec)
            .ok_or_else(|| ProcessorError::source(format!("Unsupported source format: {codec:?}")))?;
        let image = image::load_from_memory_with_format(bytes, codec)
            .map_err(|e| ProcessorError::source(format!("Failed to decode source: {e}")))?;

        debug!(
            "Decoded {} source: {}x{}",
            format.name(),
            image.width(),
            image.height()
        );
        Ok(Self::from_image(image, format))
    }

    pub fn from_image(image: DynamicImage, format: ImageFormat) -> Self {
        Self {
            image,
            format,
            quality: None,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    fn check_size(&self, width: u32, height: u32) -> Result<(), HandleError> {
        let pixels = u64::from(width) * u64::from(height);
        if pixels > self.max_pixels {
            return Err(HandleError::Failed(format!(
                "{width}x{height} exceeds the {} pixel limit",
                self.max_pixels
            )));
        }
        Ok(())
    }

    /// Replaces the image with an RGBA result, dropping alpha again if the
    /// original had none and the result is fully opaque.
    fn replace_rgba(&mut self, rgba: RgbaImage) {
        let opaque = rgba.pixels().all(|p| p.0[3] == u8::MAX);
        self.image = if !self.image.color().has_alpha() && opaque {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8())
        } else {
            DynamicImage::ImageRgba8(rgba)
        };
    }

    fn rotate_arbitrary(
        &mut self,
        degree: f64,
        background: Option<Rgba<u8>>,
    ) -> Result<(), HandleError> {
        let (out_w, out_h) = rotated_size(self.image.width(), self.image.height(), degree);
        self.check_size(out_w, out_h)?;
        let fill = background.unwrap_or(if self.image.color().has_alpha() {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([255, 255, 255, 255])
        });
        let source = self.image.to_rgba8();
        let rotated = rotate_bilinear(&source, degree, fill);
        self.replace_rgba(rotated);
        Ok(())
    }
}

fn colorspace(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => "gray",
        ColorType::Rgb32F | ColorType::Rgba32F => "scrgb",
        _ => "srgb",
    }
}

/// Canvas that holds a `width` x `height` image turned by `degree`.
fn rotated_size(width: u32, height: u32, degree: f64) -> (u32, u32) {
    let (w, h) = (f64::from(width), f64::from(height));
    let (sin, cos) = degree.to_radians().sin_cos();
    let out_w = (w * cos.abs() + h * sin.abs()).round().max(1.0);
    let out_h = (w * sin.abs() + h * cos.abs()).round().max(1.0);
    (out_w as u32, out_h as u32)
}

/// Rotates clockwise by `degree` about the centre, growing the canvas to fit.
fn rotate_bilinear(source: &RgbaImage, degree: f64, fill: Rgba<u8>) -> RgbaImage {
    let (w, h) = (f64::from(source.width()), f64::from(source.height()));
    let (sin, cos) = degree.to_radians().sin_cos();
    let (width, height) = rotated_size(source.width(), source.height(), degree);
    let (out_w, out_h) = (f64::from(width), f64::from(height));

    RgbaImage::from_fn(width, height, |ox, oy| {
        let dx = f64::from(ox) + 0.5 - out_w / 2.0;
        let dy = f64::from(oy) + 0.5 - out_h / 2.0;
        let sx = dx * cos + dy * sin + w / 2.0;
        let sy = -dx * sin + dy * cos + h / 2.0;
        sample_bilinear(source, sx - 0.5, sy - 0.5, fill)
    })
}

fn sample_bilinear(source: &RgbaImage, x: f64, y: f64, fill: Rgba<u8>) -> Rgba<u8> {
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let fetch = |ix: f64, iy: f64| -> [u8; 4] {
        if ix < 0.0 || iy < 0.0 || ix >= f64::from(source.width()) || iy >= f64::from(source.height()) {
            fill.0
        } else {
            source.get_pixel(ix as u32, iy as u32).0
        }
    };
    let (p00, p10) = (fetch(x0, y0), fetch(x0 + 1.0, y0));
    let (p01, p11) = (fetch(x0, y0 + 1.0), fetch(x0 + 1.0, y0 + 1.0));

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = f64::from(p00[c]) * (1.0 - fx) + f64::from(p10[c]) * fx;
        let bottom = f64::from(p01[c]) * (1.0 - fx) + f64::from(p11[c]) * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

impl ImageHandle for RasterImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    fn format(&self) -> ImageFormat {
        self.format
    }

    fn depth(&self) -> u8 {
        let color = self.image.color();
        (color.bits_per_pixel() / u16::from(color.channel_count().max(1))) as u8
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        let color = self.image.color();
        BTreeMap::from([
            ("colorspace".to_string(), colorspace(color).to_string()),
            ("channels".to_string(), color.channel_count().to_string()),
            ("alpha".to_string(), color.has_alpha().to_string()),
        ])
    }

    fn set_format(&mut self, format: ImageFormat) {
        self.format = format;
    }

    fn set_compression_quality(&mut self, quality: u8) {
        self.quality = Some(quality);
    }

    fn resize(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
        filter: ResizeFilter,
        blur: f64,
    ) -> Result<(), HandleError> {
        let (current_w, current_h) = self.dimensions();
        let (w, h) = (width.unwrap_or(current_w), height.unwrap_or(current_h));
        if w == 0 || h == 0 {
            return Err(HandleError::InvalidArgument(format!("cannot resize to {w}x{h}")));
        }
        self.check_size(w, h)?;
        if (w, h) != (current_w, current_h) {
            self.image = self.image.resize_exact(w, h, filter.kernel());
        }
        if blur > 1.0 {
            self.image = self.image.blur((blur - 1.0) as f32);
        } else if blur < 1.0 {
            self.image = self.image.unsharpen((1.0 - blur) as f32 * 2.0, 0);
        }
        Ok(())
    }

    fn crop(&mut self, area: CropBox) -> Result<(), HandleError> {
        let (w, h) = self.dimensions();
        let inside = area.width > 0
            && area.height > 0
            && area.x.checked_add(area.width).is_some_and(|r| r <= w)
            && area.y.checked_add(area.height).is_some_and(|b| b <= h);
        if !inside {
            return Err(HandleError::Failed(format!(
                "box {}x{}+{}+{} lies outside the {w}x{h} image",
                area.width, area.height, area.x, area.y
            )));
        }
        self.image = self.image.crop_imm(area.x, area.y, area.width, area.height);
        Ok(())
    }

    fn rotate(&mut self, degree: f64, background: Option<Rgba<u8>>) -> Result<(), HandleError> {
        if !degree.is_finite() {
            return Err(HandleError::InvalidArgument(format!("invalid angle {degree}")));
        }
        let turn = degree.rem_euclid(360.0);
        let quarter = (turn / 90.0).round();
        if (turn - quarter * 90.0).abs() < 1e-9 {
            self.image = match quarter as u32 % 4 {
                1 => self.image.rotate90(),
                2 => self.image.rotate180(),
                3 => self.image.rotate270(),
                _ => return Ok(()),
            };
        } else {
            self.rotate_arbitrary(turn, background)?;
        }
        Ok(())
    }

    fn flip(&mut self) {
        self.image = self.image.flipv();
    }

    fn flop(&mut self) {
        self.image = self.image.fliph();
    }

    fn liquid_rescale(
        &mut self,
        width: u32,
        height: u32,
        delta_x: u32,
        rigidity: f64,
    ) -> Result<(), HandleError> {
        if width == 0 || height == 0 {
            return Err(HandleError::InvalidArgument(format!(
                "cannot rescale to {width}x{height}"
            )));
        }
        self.check_size(width, height)?;
        let cost = liquid::carve_cost(self.dimensions(), (width, height));
        if cost > liquid::MAX_CARVE_COST {
            return Err(HandleError::Failed(format!(
                "rescaling {}x{} to {width}x{height} is too much work for seam carving",
                self.image.width(),
                self.image.height()
            )));
        }
        let carved = liquid::liquid_rescale(&self.image.to_rgba8(), width, height, delta_x, rigidity);
        self.replace_rgba(carved);
        Ok(())
    }

    fn transparentize(&mut self, transparency: f64) -> Result<(), HandleError> {
        if !(0.0..=1.0).contains(&transparency) {
            return Err(HandleError::InvalidArgument(format!(
                "transparency {transparency} is outside 0.0-1.0"
            )));
        }
        let keep = 1.0 - transparency;
        let mut rgba = self.image.to_rgba8();
        for pixel in rgba.pixels_mut() {
            pixel.0[3] = (f64::from(pixel.0[3]) * keep).round() as u8;
        }
        self.image = DynamicImage::ImageRgba8(rgba);
        Ok(())
    }

    fn capabilities(&self) -> &'static [&'static str] {
        CAPABILITIES
    }

    fn invoke(&mut self, capability: &str, kwargs: &Kwargs) -> Result<(), HandleError> {
        let mut args = KwargReader::new(capability, kwargs);
        let image = &self.image;
        let next = match capability {
            "blur" => image.blur(args.f32("sigma")?),
            "fast_blur" => image.fast_blur(args.f32("sigma")?),
            "unsharpen" => image.unsharpen(args.f32("sigma")?, args.i32("threshold")?),
            "brighten" => image.brighten(args.i32("value")?),
            "adjust_contrast" => image.adjust_contrast(args.f32("contrast")?),
            "huerotate" => image.huerotate(args.i32("value")?),
            "grayscale" => image.grayscale(),
            "invert" => {
                let mut inverted = image.clone();
                inverted.invert();
                inverted
            }
            "rotate90" => image.rotate90(),
            "rotate180" => image.rotate180(),
            "rotate270" => image.rotate270(),
            "thumbnail" | "thumbnail_exact" => {
                let (width, height) = (args.u32("width")?, args.u32("height")?);
                self.check_size(width, height)?;
                if capability == "thumbnail" {
                    image.thumbnail(width, height)
                } else {
                    image.thumbnail_exact(width, height)
                }
            }
            other => return Err(HandleError::Unsupported(other.to_string())),
        };
        args.finish()?;
        self.image = next;
        Ok(())
    }

    fn to_blob(&self) -> ProcessorResult<Vec<u8>> {
        output::encode(&self.image, self.format, self.quality)
    }

    fn close(&mut self) {
        self.image = DynamicImage::new_rgb8(0, 0);
    }
}
