//! Resize logic: ImageMagick filter names and geometry sizing rules mapped
//! onto the raster backend's resampling kernels.

use std::str::FromStr;

use image::imageops::FilterType;

use super::args::Geometry;

/// Resampling kernel selected by an ImageMagick filter name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    /// ImageMagick's `undefined` picks Lanczos for resizes
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    pub fn kernel(&self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "point" | "box" => Ok(Self::Nearest),
            "triangle" | "bartlett" | "hermite" | "quadratic" => Ok(Self::Triangle),
            "cubic" | "catrom" | "mitchell" | "robidoux" | "robidouxsharp" | "spline" => {
                Ok(Self::CatmullRom)
            }
            "gaussian" | "blackman" | "hanning" | "hamming" | "welsh" | "parzen" | "bohman"
            | "kaiser" | "cosine" => Ok(Self::Gaussian),
            "undefined" | "lanczos" | "lanczossharp" | "lanczos2" | "lanczos2sharp" | "sinc"
            | "sincfast" | "jinc" | "lagrange" => Ok(Self::Lanczos3),
            unknown => Err(format!("Unknown resize filter: {unknown}")),
        }
    }
}

/// Target size for a resize geometry applied to an image of `current` size.
///
/// - `N%` / `W%xH%` scale by percentage.
/// - `WxH!` forces the exact size.
/// - `WxH` fits inside the box keeping the aspect ratio, `W` / `xH` scale to one side.
pub fn geometry_target(geometry: &Geometry, current: (u32, u32)) -> (u32, u32) {
    let (cw, ch) = (f64::from(current.0), f64::from(current.1));

    let (w, h) = if geometry.percent {
        let wp = geometry.width.unwrap_or(100.0);
        let hp = geometry.height.unwrap_or(wp);
        (cw * wp / 100.0, ch * hp / 100.0)
    } else if geometry.exact {
        (geometry.width.unwrap_or(cw), geometry.height.unwrap_or(ch))
    } else {
        let scale = match (geometry.width, geometry.height) {
            (Some(w), Some(h)) => (w / cw).min(h / ch),
            (Some(w), None) => w / cw,
            (None, Some(h)) => h / ch,
            (None, None) => 1.0,
        };
        (cw * scale, ch * scale)
    };

    (to_pixels(w), to_pixels(h))
}

fn to_pixels(value: f64) -> u32 {
    value.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(text: &str) -> Geometry {
        text.parse().expect("geometry")
    }

    #[test]
    fn undefined_filter_is_lanczos() {
        assert_eq!("undefined".parse::<ResizeFilter>(), Ok(ResizeFilter::Lanczos3));
        assert_eq!("Point".parse::<ResizeFilter>(), Ok(ResizeFilter::Nearest));
        assert!("bogus".parse::<ResizeFilter>().is_err());
    }

    #[test]
    fn fit_geometry_keeps_aspect_ratio() {
        assert_eq!(geometry_target(&geometry("200x200"), (400, 200)), (200, 100));
        assert_eq!(geometry_target(&geometry("100"), (400, 200)), (100, 50));
        assert_eq!(geometry_target(&geometry("x50"), (400, 200)), (100, 50));
    }

    #[test]
    fn exact_and_percent_geometry() {
        assert_eq!(geometry_target(&geometry("200x200!"), (400, 200)), (200, 200));
        assert_eq!(geometry_target(&geometry("50%"), (400, 200)), (200, 100));
        assert_eq!(geometry_target(&geometry("1%"), (10, 10)), (1, 1));
    }
}
