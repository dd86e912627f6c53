use thiserror::Error;

use crate::view::PixelFormat;

/// Unified matching error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    /// Row stride shorter than a row of pixels
    #[error("Invalid stride: {stride} bytes for {width} {format} pixels per row")]
    InvalidStride {
        stride: usize,
        width: u32,
        format: PixelFormat,
    },

    /// Pixel buffer too small for the declared shape
    #[error("Buffer too small: {actual} bytes, {expected} required")]
    BufferTooSmall { expected: usize, actual: usize },

    /// Array shape that does not describe a 2D image
    #[error("Unsupported image shape: {0:?}")]
    UnsupportedShape(Vec<usize>),

    /// Template does not fit inside the source image
    #[error(
        "Template ({template_width}x{template_height}) is larger than source ({source_width}x{source_height})"
    )]
    TemplateTooLarge {
        source_width: u32,
        source_height: u32,
        template_width: u32,
        template_height: u32,
    },

    /// Multi-scale parameters that do not describe a usable range
    #[error("Invalid scale range: min {min_scale}, max {max_scale}, step {step}")]
    InvalidScaleRange {
        min_scale: f32,
        max_scale: f32,
        step: f32,
    },
}

/// Matching result type alias
pub type CvResult<T> = Result<T, MatchError>;
