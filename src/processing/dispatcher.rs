//! Command dispatch.
//!
//! Walks a task's commands in declared order against one image handle. Each
//! command resolves to a specialised [`Handler`] that normalizes its argument
//! shape, or falls back to invoking a capability the handle exposes by name.

use std::collections::HashSet;

use tracing::debug;

use super::args::{
    CropParams, LiquidRescaleParams, RawArgs, ResizeParams, RotateParams, TransformParams,
    TransparentizeParams, expect_no_args,
};
use super::handle::{HandleError, ImageHandle};
use super::resize::{ResizeFilter, geometry_target};
use crate::core::{ImageMetadataSnapshot, OutputOptions, PipelineCommand, ProcessingTask};
use crate::utils::{ImageFormat, ProcessorError, ProcessorResult, ValidationError};

/// Operations with a dedicated handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Crop,
    Resize,
    LiquidRescale,
    Rotate,
    Flip,
    Flop,
    Transform,
    Transparentize,
}

impl Handler {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "crop" => Some(Self::Crop),
            "resize" => Some(Self::Resize),
            "liquid_rescale" => Some(Self::LiquidRescale),
            "rotate" => Some(Self::Rotate),
            "flip" => Some(Self::Flip),
            "flop" => Some(Self::Flop),
            "transform" => Some(Self::Transform),
            "transparentize" => Some(Self::Transparentize),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::Resize => "resize",
            Self::LiquidRescale => "liquid_rescale",
            Self::Rotate => "rotate",
            Self::Flip => "flip",
            Self::Flop => "flop",
            Self::Transform => "transform",
            Self::Transparentize => "transparentize",
        }
    }

    fn apply(&self, image: &mut dyn ImageHandle, args: &RawArgs) -> ProcessorResult<()> {
        let command = self.name();
        let shape = args.shape();
        let lift = |err: HandleError| handle_error(command, shape, err);

        match self {
            Self::Crop => {
                let params = CropParams::normalize(args)?;
                let area = params
                    .resolve(image.dimensions())
                    .map_err(|reason| ProcessorError::operation(command, reason))?;
                image.crop(area).map_err(lift)
            }
            Self::Resize => {
                let params = ResizeParams::normalize(args)?;
                image
                    .resize(params.width, params.height, params.filter, params.blur)
                    .map_err(lift)
            }
            Self::LiquidRescale => {
                let params = LiquidRescaleParams::normalize(args)?;
                image
                    .liquid_rescale(params.width, params.height, params.delta_x, params.rigidity)
                    .map_err(lift)
            }
            Self::Rotate => {
                let params = RotateParams::normalize(args)?;
                image.rotate(params.degree, params.background).map_err(lift)
            }
            Self::Flip => {
                expect_no_args(command, args)?;
                image.flip();
                Ok(())
            }
            Self::Flop => {
                expect_no_args(command, args)?;
                image.flop();
                Ok(())
            }
            Self::Transform => {
                let params = TransformParams::normalize(args)?;
                if let Some(crop) = &params.crop {
                    let area = crop
                        .crop_box(image.dimensions())
                        .map_err(|reason| ProcessorError::operation(command, reason))?;
                    image.crop(area).map_err(lift)?;
                }
                if let Some(resize) = &params.resize {
                    let (width, height) = geometry_target(resize, image.dimensions());
                    image
                        .resize(Some(width), Some(height), ResizeFilter::default(), 1.0)
                        .map_err(lift)?;
                }
                Ok(())
            }
            Self::Transparentize => {
                let params = TransparentizeParams::normalize(args)?;
                image.transparentize(params.transparency).map_err(lift)
            }
        }
    }
}

fn handle_error(command: &str, shape: &str, err: HandleError) -> ProcessorError {
    match err {
        HandleError::Unsupported(name) => ProcessorError::UnknownCommand(name),
        HandleError::InvalidArgument(reason) => ProcessorError::shape(command, shape, reason),
        HandleError::Failed(reason) => ProcessorError::operation(command, reason),
    }
}

/// Which handle capabilities fallback dispatch may reach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Every capability the handle declares
    #[default]
    Open,
    /// Only declared capabilities that are also in this set
    AllowList(HashSet<String>),
}

impl FallbackPolicy {
    pub fn from_allow_list(allow_list: Option<HashSet<String>>) -> Self {
        allow_list.map_or(Self::Open, Self::AllowList)
    }

    pub fn permits(&self, capability: &str) -> bool {
        match self {
            Self::Open => true,
            Self::AllowList(names) => names.contains(capability),
        }
    }
}

fn dispatch(
    image: &mut dyn ImageHandle,
    command: &PipelineCommand,
    fallback: &FallbackPolicy,
) -> ProcessorResult<()> {
    if let Some(handler) = Handler::lookup(&command.name) {
        return handler.apply(image, &command.args);
    }

    let name = command.name.as_str();
    if !fallback.permits(name) || !image.capabilities().contains(&name) {
        return Err(ProcessorError::UnknownCommand(command.name.clone()));
    }
    let shape = command.args.shape();
    let kwargs = command.args.clone().into_kwargs(name)?;
    image
        .invoke(name, &kwargs)
        .map_err(|err| handle_error(name, shape, err))
}

/// Sets the output format, then the compression quality, which is validated
/// against the format in effect at that point.
fn apply_options(image: &mut dyn ImageHandle, opts: &OutputOptions) -> ProcessorResult<()> {
    if let Some(name) = &opts.format {
        let format: ImageFormat = name.parse()?;
        image.set_format(format);
    }
    if let Some(quality) = opts.compression_quality {
        let format = image.format();
        if !format.validate_quality(quality) {
            return Err(ValidationError::Option(format!(
                "compression_quality {quality} is out of range for {}",
                format.name()
            ))
            .into());
        }
        image.set_compression_quality(quality as u8);
    }
    Ok(())
}

/// Runs every command of `task` in order, then applies its output options.
///
/// Returns the metadata snapshots taken before the first command and after the
/// output options. The first failing command aborts the rest; mutations already
/// applied to `image` are not rolled back.
pub fn run_pipeline(
    image: &mut dyn ImageHandle,
    task: &ProcessingTask,
    fallback: &FallbackPolicy,
) -> ProcessorResult<(ImageMetadataSnapshot, ImageMetadataSnapshot)> {
    let original = ImageMetadataSnapshot::capture(image);
    debug!(
        "Original captured: {}x{} {}",
        original.dimensions.0, original.dimensions.1, original.format
    );

    for (index, command) in task.commands.iter().enumerate() {
        dispatch(image, command, fallback)?;
        let (width, height) = image.dimensions();
        debug!("[{}] {} -> {}x{}", index, command.name, width, height);
    }

    apply_options(image, &task.opts)?;
    let result = ImageMetadataSnapshot::capture(image);
    debug!(
        "Result captured: {}x{} {}",
        result.dimensions.0, result.dimensions.1, result.format
    );
    Ok((original, result))
}
