//! Encodes a decoded image in the requested output format and quality.
//!
//! Quality semantics differ per format:
//! - JPEG / AVIF: lossy quality, 1-100.
//! - PNG: zlib effort, 0-100. Higher values compress harder, never lossy.
//! - WebP: encoded lossless; quality is accepted but has no effect.
//! - GIF / BMP / TIFF: quality has no effect.

use std::io::Cursor;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageEncoder};

use crate::utils::{ImageFormat, ProcessorError, ProcessorResult};

// AVIF encoder speed, 1 (slow) - 10 (fast)
const AVIF_SPEED: u8 = 6;

/// Encodes `image` as `format`. `quality` defaults to the format's default quality.
pub fn encode(image: &DynamicImage, format: ImageFormat, quality: Option<u8>) -> ProcessorResult<Vec<u8>> {
    let quality = quality.unwrap_or_else(|| format.default_quality());
    let mut buffer = Vec::new();

    match format {
        ImageFormat::JPEG => encode_jpeg(image, quality, &mut buffer)?,
        ImageFormat::PNG => encode_png(image, quality, &mut buffer)?,
        ImageFormat::WebP => encode_webp(image, &mut buffer)?,
        ImageFormat::AVIF => encode_avif(image, quality, &mut buffer)?,
        ImageFormat::GIF | ImageFormat::BMP | ImageFormat::TIFF => {
            let image = flatten_if_needed(image, format);
            image
                .write_to(&mut Cursor::new(&mut buffer), format.codec())
                .map_err(|e| ProcessorError::encode(format!("{} encode failed: {e}", format.name())))?;
        }
    }

    Ok(buffer)
}

/// JPEG has no alpha channel and 8-bit samples only.
fn encode_jpeg(image: &DynamicImage, quality: u8, buffer: &mut Vec<u8>) -> ProcessorResult<()> {
    let encoder = JpegEncoder::new_with_quality(&mut *buffer, quality.clamp(1, 100));
    let result = if image.color().has_color() {
        encoder.write_image(
            image.to_rgb8().as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
    } else {
        encoder.write_image(
            image.to_luma8().as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::L8,
        )
    };
    result.map_err(|e| ProcessorError::encode(format!("JPEG encode failed: {e}")))
}

fn encode_png(image: &DynamicImage, quality: u8, buffer: &mut Vec<u8>) -> ProcessorResult<()> {
    // Lossless: quality only buys zlib effort, so higher never means larger.
    let compression = match quality {
        70.. => CompressionType::Best,
        40..=69 => CompressionType::Default,
        _ => CompressionType::Fast,
    };
    let encoder = PngEncoder::new_with_quality(&mut *buffer, compression, PngFilter::Adaptive);
    image
        .write_with_encoder(encoder)
        .map_err(|e| ProcessorError::encode(format!("PNG encode failed: {e}")))
}

fn encode_webp(image: &DynamicImage, buffer: &mut Vec<u8>) -> ProcessorResult<()> {
    // The encoder takes 8-bit RGB(A) only
    let image = if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };
    let encoder = WebPEncoder::new_lossless(&mut *buffer);
    image
        .write_with_encoder(encoder)
        .map_err(|e| ProcessorError::encode(format!("WebP encode failed: {e}")))
}

fn encode_avif(image: &DynamicImage, quality: u8, buffer: &mut Vec<u8>) -> ProcessorResult<()> {
    let image = if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };
    let encoder = AvifEncoder::new_with_speed_quality(&mut *buffer, AVIF_SPEED, quality.clamp(1, 100));
    image
        .write_with_encoder(encoder)
        .map_err(|e| ProcessorError::encode(format!("AVIF encode failed: {e}")))
}

/// Converts colour types a codec cannot store to the closest one it can.
fn flatten_if_needed(image: &DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::GIF => DynamicImage::ImageRgba8(image.to_rgba8()),
        ImageFormat::BMP if image.color().has_alpha() => DynamicImage::ImageRgba8(image.to_rgba8()),
        ImageFormat::BMP => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ if image.color().bits_per_pixel() / u16::from(image.color().channel_count()) > 8 => {
            DynamicImage::ImageRgba16(image.to_rgba16())
        }
        _ => image.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn noisy(width: u32, height: u32) -> DynamicImage {
        // Deterministic high-frequency content so lossy quality matters
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let v = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)).wrapping_mul(2_654_435_761);
            Rgb([(v >> 8) as u8, (v >> 16) as u8, (v >> 24) as u8])
        }))
    }

    #[test]
    fn jpeg_quality_controls_size() {
        let image = noisy(64, 64);
        let low = encode(&image, ImageFormat::JPEG, Some(20)).expect("low");
        let high = encode(&image, ImageFormat::JPEG, Some(90)).expect("high");
        assert!(low.len() < high.len());
        assert_eq!(image::guess_format(&low).expect("guess"), image::ImageFormat::Jpeg);
    }

    #[test]
    fn png_quality_is_compression_effort() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(96, 96, |x, y| {
            Rgb([(x * 2) as u8, (y * 2) as u8, ((x / 8 + y / 8) % 2 * 255) as u8])
        }));
        let low = encode(&image, ImageFormat::PNG, Some(20)).expect("low");
        let high = encode(&image, ImageFormat::PNG, Some(90)).expect("high");
        assert!(high.len() <= low.len(), "{} > {}", high.len(), low.len());

        let a = image::load_from_memory(&low).expect("decode low").to_rgb8();
        let b = image::load_from_memory(&high).expect("decode high").to_rgb8();
        assert_eq!(a, b);
    }

    #[test]
    fn every_format_round_trips_through_the_decoder() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([10, 20, 30, 128])));
        for format in [
            ImageFormat::JPEG,
            ImageFormat::PNG,
            ImageFormat::GIF,
            ImageFormat::BMP,
            ImageFormat::TIFF,
            ImageFormat::WebP,
        ] {
            let bytes = encode(&image, format, None).expect("encode");
            let decoded = image::load_from_memory(&bytes).expect("decode");
            assert_eq!((decoded.width(), decoded.height()), (8, 6), "{format:?}");
        }
    }
}
