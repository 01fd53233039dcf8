use std::str::FromStr;
use crate::utils::ProcessorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    JPEG,
    PNG,
    GIF,
    BMP,
    TIFF,
    WebP,
    AVIF,
}

impl ImageFormat {
    /// Quality used when the request sets a format but no compression quality
    pub fn default_quality(&self) -> u8 {
        match self {
            Self::JPEG => 92,
            Self::PNG => 75, // zlib effort, not lossy quality
            Self::AVIF => 70,
            _ => 100,
        }
    }

    /// Validate quality value for this format
    pub fn validate_quality(&self, quality: i64) -> bool {
        match self {
            Self::PNG => (0..=100).contains(&quality),
            _ => (1..=100).contains(&quality),
        }
    }

    /// Extension of stored result objects
    pub fn primary_extension(&self) -> &'static str {
        match self {
            Self::JPEG => "jpeg",
            Self::PNG => "png",
            Self::GIF => "gif",
            Self::BMP => "bmp",
            Self::TIFF => "tiff",
            Self::WebP => "webp",
            Self::AVIF => "avif",
        }
    }

    /// Upper-case format name as reported in metadata snapshots
    pub fn name(&self) -> &'static str {
        match self {
            Self::JPEG => "JPEG",
            Self::PNG => "PNG",
            Self::GIF => "GIF",
            Self::BMP => "BMP",
            Self::TIFF => "TIFF",
            Self::WebP => "WEBP",
            Self::AVIF => "AVIF",
        }
    }

    pub fn mimetype(&self) -> &'static str {
        match self {
            Self::JPEG => "image/jpeg",
            Self::PNG => "image/png",
            Self::GIF => "image/gif",
            Self::BMP => "image/bmp",
            Self::TIFF => "image/tiff",
            Self::WebP => "image/webp",
            Self::AVIF => "image/avif",
        }
    }

    pub fn codec(&self) -> image::ImageFormat {
        match self {
            Self::JPEG => image::ImageFormat::Jpeg,
            Self::PNG => image::ImageFormat::Png,
            Self::GIF => image::ImageFormat::Gif,
            Self::BMP => image::ImageFormat::Bmp,
            Self::TIFF => image::ImageFormat::Tiff,
            Self::WebP => image::ImageFormat::WebP,
            Self::AVIF => image::ImageFormat::Avif,
        }
    }

    pub fn from_codec(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::JPEG),
            image::ImageFormat::Png => Some(Self::PNG),
            image::ImageFormat::Gif => Some(Self::GIF),
            image::ImageFormat::Bmp => Some(Self::BMP),
            image::ImageFormat::Tiff => Some(Self::TIFF),
            image::ImageFormat::WebP => Some(Self::WebP),
            image::ImageFormat::Avif => Some(Self::AVIF),
            _ => None,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = ProcessorError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "jpg" | "jpeg" => Ok(Self::JPEG),
            "png" => Ok(Self::PNG),
            "gif" => Ok(Self::GIF),
            "bmp" => Ok(Self::BMP),
            "tif" | "tiff" => Ok(Self::TIFF),
            "webp" => Ok(Self::WebP),
            "avif" => Ok(Self::AVIF),
            _ => Err(ProcessorError::format(format!(
                "Unsupported image format: {}", name
            ))),
        }
    }
}
