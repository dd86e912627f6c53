//! Template matching for screen automation.
//!
//! [`match_template`] is the single-call entry point used across the foreign-function
//! boundary: it borrows two pixel buffers and returns the best correlation score together with
//! the top-left location of the best window. Response surfaces are computed by
//! [`core::template_matching`] on top of [`imageproc::template_matching`].
pub mod core;
pub mod error;
pub mod matcher;
pub mod view;

pub use error::{CvResult, MatchError};
pub use matcher::{
    MatchResult, MatcherOptions, MultiScaleMatcher, MultiScaleOptions, MultiScaleResult,
    SingleMatcher,
};
pub use view::{ImageView, PixelFormat, pack_pixels};

/// Normalized cross-correlation match of `template` inside `source`.
///
/// Empty inputs give [`MatchResult::ZERO`]; a template larger than the source is an error.
pub fn match_template(source: &ImageView<'_>, template: &ImageView<'_>) -> CvResult<MatchResult> {
    SingleMatcher::match_template(source, template, &MatcherOptions::default())
}
