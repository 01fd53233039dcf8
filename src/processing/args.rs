//! Argument normalization.
//!
//! A command's raw argument value may arrive as a delimited string
//! (`"640x480"`), an ordered sequence (`[640, 480]`) or a keyed mapping
//! (`{"width": 640, "height": 480}`). Each operation reduces whichever shape it
//! got to one canonical parameter struct, or fails with
//! [`ProcessorError::InvalidArgumentShape`] naming the command and the shape.

use std::ops::RangeInclusive;
use std::str::FromStr;

use image::Rgba;
use serde_json::{Map, Value};

use super::resize::ResizeFilter;
use crate::utils::{ProcessorError, ProcessorResult};

/// Raw argument value of one command, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawArgs {
    /// `null` or absent: no arguments
    Empty,
    Delimited(String),
    Sequence(Vec<Value>),
    Keyed(Map<String, Value>),
    /// A bare number or boolean, treated as a one-element sequence
    Scalar(Value),
}

impl From<Value> for RawArgs {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::String(s) => Self::Delimited(s),
            Value::Array(values) => Self::Sequence(values),
            Value::Object(map) => Self::Keyed(map),
            scalar @ (Value::Bool(_) | Value::Number(_)) => Self::Scalar(scalar),
        }
    }
}

impl RawArgs {
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Delimited(_) => "delimited string",
            Self::Sequence(_) => "sequence",
            Self::Keyed(_) => "keyed mapping",
            Self::Scalar(_) => "scalar",
        }
    }

    /// Keyword arguments for fallback capabilities, which take no other shape.
    pub fn into_kwargs(self, command: &str) -> ProcessorResult<Map<String, Value>> {
        match self {
            Self::Empty => Ok(Map::new()),
            Self::Keyed(map) => Ok(map),
            other => Err(ProcessorError::shape(
                command,
                other.shape(),
                "capabilities without a dedicated handler take keyword arguments only",
            )),
        }
    }
}

/// How one operation accepts positional shapes.
struct Layout {
    command: &'static str,
    /// Parameter names in positional order; also the accepted mapping keys
    names: &'static [&'static str],
    /// Accepted number of positional values
    arity: RangeInclusive<usize>,
    delimiter: fn(char) -> bool,
}

/// Raw values bound to parameter names, prior to typing.
struct Slots<'a> {
    layout: &'a Layout,
    shape: &'static str,
    values: Vec<Value>,
}

impl Layout {
    fn bind(&self, args: &RawArgs) -> ProcessorResult<Slots<'_>> {
        let shape = args.shape();
        let positional = match args {
            RawArgs::Empty => Vec::new(),
            RawArgs::Keyed(map) => {
                let mut values = vec![Value::Null; self.names.len()];
                for (key, value) in map {
                    let index = self.names.iter().position(|n| *n == key.as_str()).ok_or_else(|| {
                        ProcessorError::shape(
                            self.command,
                            shape,
                            format!("unexpected key '{key}'"),
                        )
                    })?;
                    values[index] = value.clone();
                }
                return Ok(Slots {
                    layout: self,
                    shape,
                    values,
                });
            }
            RawArgs::Delimited(text) => split(text, self.delimiter),
            RawArgs::Sequence(values) => values.clone(),
            RawArgs::Scalar(value) => vec![value.clone()],
        };

        if !matches!(args, RawArgs::Empty) && !self.arity.contains(&positional.len()) {
            let expected = if self.arity.start() == self.arity.end() {
                format!("{}", self.arity.start())
            } else {
                format!("{} to {}", self.arity.start(), self.arity.end())
            };
            return Err(ProcessorError::shape(
                self.command,
                shape,
                format!("expected {expected} values, got {}", positional.len()),
            ));
        }

        let mut values = positional;
        values.resize(self.names.len(), Value::Null);
        Ok(Slots {
            layout: self,
            shape,
            values,
        })
    }
}

fn split(text: &str, delimiter: fn(char) -> bool) -> Vec<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.split(delimiter)
        .map(|part| match part.trim() {
            "" => Value::Null,
            part => Value::String(part.to_string()),
        })
        .collect()
}

fn dimension_delimiter(c: char) -> bool {
    c == 'x' || c == 'X'
}

fn list_delimiter(c: char) -> bool {
    c == ','
}

impl Slots<'_> {
    fn error(&self, reason: impl Into<String>) -> ProcessorError {
        ProcessorError::shape(self.layout.command, self.shape, reason)
    }

    fn name(&self, index: usize) -> &'static str {
        self.layout.names[index]
    }

    fn int(&self, index: usize) -> ProcessorResult<Option<i64>> {
        let parsed = match &self.values[index] {
            Value::Null => return Ok(None),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| self.error(format!("'{}' must be an integer", self.name(index))))
    }

    fn uint(&self, index: usize) -> ProcessorResult<Option<u32>> {
        match self.int(index)? {
            None => Ok(None),
            Some(n) => u32::try_from(n).map(Some).map_err(|_| {
                self.error(format!("'{}' must be a non-negative integer", self.name(index)))
            }),
        }
    }

    fn dimension(&self, index: usize) -> ProcessorResult<Option<u32>> {
        match self.uint(index)? {
            Some(0) => Err(self.error(format!("'{}' must be positive", self.name(index)))),
            other => Ok(other),
        }
    }

    fn required<T>(&self, index: usize, value: Option<T>) -> ProcessorResult<T> {
        value.ok_or_else(|| self.error(format!("missing '{}'", self.name(index))))
    }

    fn float(&self, index: usize) -> ProcessorResult<Option<f64>> {
        let parsed = match &self.values[index] {
            Value::Null => return Ok(None),
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or_else(|| self.error(format!("'{}' must be a number", self.name(index))))
    }

    fn boolean(&self, index: usize) -> ProcessorResult<Option<bool>> {
        let parsed = match &self.values[index] {
            Value::Null => return Ok(None),
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| self.error(format!("'{}' must be a boolean", self.name(index))))
    }

    fn string(&self, index: usize) -> ProcessorResult<Option<String>> {
        match &self.values[index] {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => Ok(Some(s.trim().to_string())),
            _ => Err(self.error(format!("'{}' must be a string", self.name(index)))),
        }
    }
}

/// Canonical `resize` parameters. Absent dimensions keep the current size.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub filter: ResizeFilter,
    /// Above 1 softens, below 1 sharpens
    pub blur: f64,
}

impl ResizeParams {
    const LAYOUT: Layout = Layout {
        command: "resize",
        names: &["width", "height", "filter", "blur"],
        arity: 2..=2,
        delimiter: dimension_delimiter,
    };

    pub fn normalize(args: &RawArgs) -> ProcessorResult<Self> {
        let layout = Self::LAYOUT;
        let slots = layout.bind(args)?;
        let filter = match slots.string(2)? {
            Some(name) => ResizeFilter::from_str(&name).map_err(|e| slots.error(e))?,
            None => ResizeFilter::default(),
        };
        let blur = slots.float(3)?.unwrap_or(1.0);
        if blur <= 0.0 {
            return Err(slots.error("'blur' must be greater than 0"));
        }
        Ok(Self {
            width: slots.dimension(0)?,
            height: slots.dimension(1)?,
            filter,
            blur,
        })
    }
}

/// Canonical `liquid_rescale` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidRescaleParams {
    pub width: u32,
    pub height: u32,
    /// Largest horizontal step a seam may take between rows
    pub delta_x: u32,
    /// Penalty for non-vertical seam steps
    pub rigidity: f64,
}

impl LiquidRescaleParams {
    const LAYOUT: Layout = Layout {
        command: "liquid_rescale",
        names: &["width", "height", "delta_x", "rigidity"],
        arity: 2..=2,
        delimiter: dimension_delimiter,
    };

    pub fn normalize(args: &RawArgs) -> ProcessorResult<Self> {
        let layout = Self::LAYOUT;
        let slots = layout.bind(args)?;
        let rigidity = slots.float(3)?.unwrap_or(0.0);
        if rigidity < 0.0 {
            return Err(slots.error("'rigidity' must not be negative"));
        }
        Ok(Self {
            width: slots.required(0, slots.dimension(0)?)?,
            height: slots.required(1, slots.dimension(1)?)?,
            delta_x: slots.uint(2)?.unwrap_or(0),
            rigidity,
        })
    }
}

/// Canonical `crop` parameters, before resolution against the image size.
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams {
    pub left: u32,
    pub top: u32,
    pub right: Option<u32>,
    pub bottom: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub reset_coords: bool,
}

/// A resolved pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropParams {
    const LAYOUT: Layout = Layout {
        command: "crop",
        names: &[
            "left",
            "top",
            "right",
            "bottom",
            "width",
            "height",
            "reset_coords",
        ],
        arity: 4..=4,
        delimiter: list_delimiter,
    };

    pub fn normalize(args: &RawArgs) -> ProcessorResult<Self> {
        let layout = Self::LAYOUT;
        let slots = layout.bind(args)?;
        let params = Self {
            left: slots.uint(0)?.unwrap_or(0),
            top: slots.uint(1)?.unwrap_or(0),
            right: slots.uint(2)?,
            bottom: slots.uint(3)?,
            width: slots.dimension(4)?,
            height: slots.dimension(5)?,
            reset_coords: slots.boolean(6)?.unwrap_or(true),
        };
        if params.right.is_some() && params.width.is_some() {
            return Err(slots.error("'right' and 'width' are mutually exclusive"));
        }
        if params.bottom.is_some() && params.height.is_some() {
            return Err(slots.error("'bottom' and 'height' are mutually exclusive"));
        }
        Ok(params)
    }

    /// Resolves the box against an image of `dimensions`, clamping the far
    /// edges to the image. Fails when nothing of the image remains.
    pub fn resolve(&self, dimensions: (u32, u32)) -> Result<CropBox, String> {
        let (image_w, image_h) = dimensions;
        let right = self
            .right
            .or(self.width.map(|w| self.left.saturating_add(w)))
            .unwrap_or(image_w)
            .min(image_w);
        let bottom = self
            .bottom
            .or(self.height.map(|h| self.top.saturating_add(h)))
            .unwrap_or(image_h)
            .min(image_h);

        if self.left >= right || self.top >= bottom {
            return Err(format!(
                "box ({}, {}, {}, {}) is empty within a {}x{} image",
                self.left, self.top, right, bottom, image_w, image_h
            ));
        }
        Ok(CropBox {
            x: self.left,
            y: self.top,
            width: right - self.left,
            height: bottom - self.top,
        })
    }
}

/// ImageMagick-style geometry: `WxH+X+Y`, `WxH!`, `N%`, `W`, `xH`.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub x: i64,
    pub y: i64,
    pub percent: bool,
    /// `!`: ignore aspect ratio
    pub exact: bool,
}

impl FromStr for Geometry {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let percent = text.contains('%');
        let exact = text.contains('!');
        let body: String = text.chars().filter(|c| !matches!(c, '%' | '!')).collect();

        let (size, offset) = match body.find(['+', '-']) {
            Some(index) => body.split_at(index),
            None => (body.as_str(), ""),
        };

        let number = |part: &str| -> Result<Option<f64>, String> {
            let part = part.trim();
            if part.is_empty() {
                return Ok(None);
            }
            part.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && *n > 0.0)
                .map(Some)
                .ok_or_else(|| format!("invalid geometry size '{part}' in '{text}'"))
        };
        let (width, height) = match size.find(['x', 'X']) {
            Some(index) => (number(&size[..index])?, number(&size[index + 1..])?),
            None => (number(size)?, None),
        };

        let mut offsets = Vec::new();
        let mut rest = offset;
        while !rest.is_empty() {
            let sign = if rest.starts_with('-') { -1 } else { 1 };
            let digits = &rest[1..];
            let end = digits.find(['+', '-']).unwrap_or(digits.len());
            let value: i64 = digits[..end]
                .trim()
                .parse()
                .map_err(|_| format!("invalid geometry offset in '{text}'"))?;
            offsets.push(sign * value);
            rest = &digits[end..];
        }
        if offsets.len() > 2 {
            return Err(format!("too many offsets in geometry '{text}'"));
        }
        if width.is_none() && height.is_none() && offsets.is_empty() {
            return Err(format!("empty geometry '{text}'"));
        }

        Ok(Self {
            width,
            height,
            x: offsets.first().copied().unwrap_or(0),
            y: offsets.get(1).copied().unwrap_or(0),
            percent,
            exact,
        })
    }
}

impl Geometry {
    /// Pixel box described by a crop geometry. Missing sizes extend to the image edge.
    pub fn crop_box(&self, dimensions: (u32, u32)) -> Result<CropBox, String> {
        if self.percent {
            return Err("percentage crop geometry is not supported".to_string());
        }
        let left = u32::try_from(self.x).map_err(|_| "negative crop offset".to_string())?;
        let top = u32::try_from(self.y).map_err(|_| "negative crop offset".to_string())?;
        CropParams {
            left,
            top,
            right: None,
            bottom: None,
            width: self.width.map(|w| w.round() as u32),
            height: self.height.map(|h| h.round() as u32),
            reset_coords: true,
        }
        .resolve(dimensions)
    }
}

/// Canonical `transform` parameters; `None` skips that step.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformParams {
    pub crop: Option<Geometry>,
    pub resize: Option<Geometry>,
}

impl TransformParams {
    const LAYOUT: Layout = Layout {
        command: "transform",
        names: &["crop", "resize"],
        arity: 1..=2,
        delimiter: list_delimiter,
    };

    pub fn normalize(args: &RawArgs) -> ProcessorResult<Self> {
        let layout = Self::LAYOUT;
        let slots = layout.bind(args)?;
        let geometry = |index: usize| -> ProcessorResult<Option<Geometry>> {
            slots
                .string(index)?
                .map(|text| Geometry::from_str(&text).map_err(|e| slots.error(e)))
                .transpose()
        };
        Ok(Self {
            crop: geometry(0)?,
            resize: geometry(1)?,
        })
    }
}

/// Canonical `rotate` parameters. Positive degrees turn clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct RotateParams {
    pub degree: f64,
    pub background: Option<Rgba<u8>>,
    pub reset_coords: bool,
}

impl RotateParams {
    const LAYOUT: Layout = Layout {
        command: "rotate",
        names: &["degree", "background", "reset_coords"],
        arity: 1..=3,
        delimiter: list_delimiter,
    };

    pub fn normalize(args: &RawArgs) -> ProcessorResult<Self> {
        let layout = Self::LAYOUT;
        let slots = layout.bind(args)?;
        let background = match slots.string(1)? {
            Some(name) => Some(
                parse_color(&name)
                    .ok_or_else(|| slots.error(format!("unknown colour '{name}'")))?,
            ),
            None => None,
        };
        Ok(Self {
            degree: slots.required(0, slots.float(0)?)?,
            background,
            reset_coords: slots.boolean(2)?.unwrap_or(true),
        })
    }
}

/// Canonical `transparentize` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TransparentizeParams {
    /// 0.0 leaves the image opaque, 1.0 makes it fully transparent
    pub transparency: f64,
}

impl TransparentizeParams {
    const LAYOUT: Layout = Layout {
        command: "transparentize",
        names: &["transparency"],
        arity: 1..=1,
        delimiter: list_delimiter,
    };

    pub fn normalize(args: &RawArgs) -> ProcessorResult<Self> {
        let layout = Self::LAYOUT;
        let slots = layout.bind(args)?;
        let transparency = slots.required(0, slots.float(0)?)?;
        if !(0.0..=1.0).contains(&transparency) {
            return Err(slots.error("'transparency' must be between 0.0 and 1.0"));
        }
        Ok(Self { transparency })
    }
}

/// Checks that a parameterless command (`flip`, `flop`) received no arguments.
pub fn expect_no_args(command: &'static str, args: &RawArgs) -> ProcessorResult<()> {
    let empty = match args {
        RawArgs::Empty => true,
        RawArgs::Delimited(s) => s.trim().is_empty(),
        RawArgs::Sequence(values) => values.is_empty(),
        RawArgs::Keyed(map) => map.is_empty(),
        RawArgs::Scalar(_) => false,
    };
    if empty {
        Ok(())
    } else {
        Err(ProcessorError::shape(command, args.shape(), "takes no arguments"))
    }
}

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` or a basic colour name.
pub fn parse_color(text: &str) -> Option<Rgba<u8>> {
    let text = text.trim().to_ascii_lowercase();
    let named = match text.as_str() {
        "white" => Some([255, 255, 255, 255]),
        "black" => Some([0, 0, 0, 255]),
        "red" => Some([255, 0, 0, 255]),
        "green" => Some([0, 128, 0, 255]),
        "lime" => Some([0, 255, 0, 255]),
        "blue" => Some([0, 0, 255, 255]),
        "yellow" => Some([255, 255, 0, 255]),
        "gray" | "grey" => Some([128, 128, 128, 255]),
        "transparent" | "none" => Some([0, 0, 0, 0]),
        _ => None,
    };
    if let Some(rgba) = named {
        return Some(Rgba(rgba));
    }

    let hex = text.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize, len: usize| u8::from_str_radix(&hex[i * len..(i + 1) * len], 16).ok();
    match hex.len() {
        3 => {
            let expand = |i| channel(i, 1).map(|v| v * 17);
            Some(Rgba([expand(0)?, expand(1)?, expand(2)?, 255]))
        }
        6 => Some(Rgba([channel(0, 2)?, channel(1, 2)?, channel(2, 2)?, 255])),
        8 => Some(Rgba([
            channel(0, 2)?,
            channel(1, 2)?,
            channel(2, 2)?,
            channel(3, 2)?,
        ])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawArgs {
        RawArgs::from(value)
    }

    #[test]
    fn resize_shapes_normalize_identically() {
        let from_string = ResizeParams::normalize(&raw(json!("640x480"))).expect("string");
        let from_sequence = ResizeParams::normalize(&raw(json!([640, 480]))).expect("sequence");
        let from_map =
            ResizeParams::normalize(&raw(json!({ "width": 640, "height": 480 }))).expect("map");

        assert_eq!(from_string, from_sequence);
        assert_eq!(from_sequence, from_map);
        assert_eq!(from_map.width, Some(640));
        assert_eq!(from_map.height, Some(480));
        assert_eq!(from_map.blur, 1.0);
    }

    #[test]
    fn liquid_rescale_shapes_normalize_identically() {
        let expected = LiquidRescaleParams {
            width: 640,
            height: 480,
            delta_x: 0,
            rigidity: 0.0,
        };
        for args in [json!("640x480"), json!([640, 480]), json!({"width": 640, "height": 480})] {
            assert_eq!(LiquidRescaleParams::normalize(&raw(args)).expect("params"), expected);
        }
    }

    #[test]
    fn crop_string_binds_left_top_right_bottom() {
        let params = CropParams::normalize(&raw(json!("10,20,300,400"))).expect("crop");
        assert_eq!(
            (params.left, params.top, params.right, params.bottom),
            (10, 20, Some(300), Some(400))
        );
        assert_eq!(params.width, None);
        assert!(params.reset_coords);
    }

    #[test]
    fn client_defaults_for_resize_are_accepted() {
        let params = ResizeParams::normalize(&raw(json!({
            "width": 200, "height": null, "filter": "undefined", "blur": 1
        })))
        .expect("resize");
        assert_eq!(params.width, Some(200));
        assert_eq!(params.height, None);
    }

    #[test]
    fn wrong_arity_names_command_and_shape() {
        let err = ResizeParams::normalize(&raw(json!([640, 480, 2]))).unwrap_err();
        match err {
            ProcessorError::InvalidArgumentShape { command, shape, .. } => {
                assert_eq!(command, "resize");
                assert_eq!(shape, "sequence");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(CropParams::normalize(&raw(json!("10,20,300"))).is_err());
        assert!(ResizeParams::normalize(&raw(json!(640))).is_err());
    }

    #[test]
    fn non_numeric_values_are_shape_errors() {
        assert!(matches!(
            ResizeParams::normalize(&raw(json!("wide x 480"))),
            Err(ProcessorError::InvalidArgumentShape { .. })
        ));
        assert!(matches!(
            CropParams::normalize(&raw(json!(["a", 0, 1, 1]))),
            Err(ProcessorError::InvalidArgumentShape { .. })
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ResizeParams::normalize(&raw(json!({"width": 1, "depth": 8}))).unwrap_err();
        assert!(err.to_string().contains("unexpected key 'depth'"));
    }

    #[test]
    fn liquid_rescale_requires_both_dimensions() {
        assert!(LiquidRescaleParams::normalize(&raw(json!({"width": 10}))).is_err());
    }

    #[test]
    fn crop_resolves_width_and_clamps_to_image() {
        let params =
            CropParams::normalize(&raw(json!({"left": 10, "top": 5, "width": 500}))).expect("crop");
        let crop_box = params.resolve((100, 50)).expect("box");
        assert_eq!(
            crop_box,
            CropBox {
                x: 10,
                y: 5,
                width: 90,
                height: 45
            }
        );
        assert!(params.resolve((10, 10)).is_err());
    }

    #[test]
    fn crop_rejects_conflicting_edges() {
        assert!(CropParams::normalize(&raw(json!({"right": 10, "width": 5}))).is_err());
    }

    #[test]
    fn geometry_parses_imagemagick_forms() {
        let g: Geometry = "100x50+10+20".parse().expect("geometry");
        assert_eq!((g.width, g.height, g.x, g.y), (Some(100.0), Some(50.0), 10, 20));

        let g: Geometry = "50%".parse().expect("geometry");
        assert!(g.percent);
        assert_eq!(g.width, Some(50.0));

        let g: Geometry = "x300!".parse().expect("geometry");
        assert!(g.exact);
        assert_eq!((g.width, g.height), (None, Some(300.0)));

        assert!("".parse::<Geometry>().is_err());
        assert!("axb".parse::<Geometry>().is_err());
    }

    #[test]
    fn transform_accepts_all_shapes() {
        let keyed = TransformParams::normalize(&raw(json!({"crop": "10x10+0+0", "resize": ""})))
            .expect("keyed");
        assert!(keyed.crop.is_some());
        assert!(keyed.resize.is_none());

        let delimited = TransformParams::normalize(&raw(json!("10x10+0+0,50%"))).expect("string");
        assert!(delimited.resize.expect("resize").percent);

        let sequence = TransformParams::normalize(&raw(json!(["", "200x100"]))).expect("sequence");
        assert!(sequence.crop.is_none());
    }

    #[test]
    fn rotate_accepts_scalar_and_background() {
        let params = RotateParams::normalize(&raw(json!(90))).expect("scalar");
        assert_eq!(params.degree, 90.0);
        assert_eq!(params.background, None);

        let params = RotateParams::normalize(&raw(json!({"degree": 45, "background": "#ff0000"})))
            .expect("keyed");
        assert_eq!(params.background, Some(Rgba([255, 0, 0, 255])));

        assert!(RotateParams::normalize(&raw(json!({"background": "red"}))).is_err());
        assert!(RotateParams::normalize(&raw(json!({"degree": 1, "background": "plaid"}))).is_err());
    }

    #[test]
    fn transparentize_is_bounded() {
        assert_eq!(
            TransparentizeParams::normalize(&raw(json!("0.25")))
                .expect("string")
                .transparency,
            0.25
        );
        assert!(TransparentizeParams::normalize(&raw(json!(1.5))).is_err());
    }

    #[test]
    fn parameterless_commands_reject_arguments() {
        assert!(expect_no_args("flip", &RawArgs::Empty).is_ok());
        assert!(expect_no_args("flip", &raw(json!({}))).is_ok());
        assert!(expect_no_args("flip", &raw(json!([]))).is_ok());
        assert!(expect_no_args("flop", &raw(json!([1]))).is_err());
    }

    #[test]
    fn fallback_requires_keyword_form() {
        assert!(raw(json!({"sigma": 2.0})).into_kwargs("blur").is_ok());
        assert!(raw(json!(null)).into_kwargs("grayscale").expect("empty").is_empty());
        assert!(matches!(
            raw(json!("2.0")).into_kwargs("blur"),
            Err(ProcessorError::InvalidArgumentShape { .. })
        ));
    }

    #[test]
    fn colours_parse() {
        assert_eq!(parse_color("#fff"), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(parse_color("#00000080"), Some(Rgba([0, 0, 0, 128])));
        assert_eq!(parse_color("transparent"), Some(Rgba([0, 0, 0, 0])));
        assert_eq!(parse_color("#12"), None);
    }
}
