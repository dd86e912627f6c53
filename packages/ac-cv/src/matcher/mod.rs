//! Image matching based on template matching
//!
//! [`SingleMatcher`]: Match one template on an image to get the best location.
//! [`MultiScaleMatcher`]: Match one template at several sizes and keep the best one.

pub mod multi_scale;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    core::template_matching::{MatchTemplateMethod, best_match, match_template},
    error::CvResult,
    view::ImageView,
};

pub use multi_scale::{MultiScaleMatcher, MultiScaleOptions, MultiScaleResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherOptions {
    pub method: MatchTemplateMethod,
    pub threshold: f32,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self::method_default(MatchTemplateMethod::default())
    }
}

impl MatcherOptions {
    /// Options with a threshold suited to `method`.
    ///
    /// The raw methods have no scale-free threshold, so they accept every match.
    pub fn method_default(method: MatchTemplateMethod) -> Self {
        let threshold = match method {
            MatchTemplateMethod::SumOfSquaredErrors => f32::INFINITY,
            MatchTemplateMethod::CrossCorrelation => f32::NEG_INFINITY,
            MatchTemplateMethod::SumOfSquaredErrorsNormed => 0.2,
            // No mean subtraction: unrelated bright content already scores 0.8 to 0.9.
            MatchTemplateMethod::CrossCorrelationNormed => 0.95,
        };
        Self { method, threshold }
    }
    pub fn with_method(mut self, method: MatchTemplateMethod) -> Self {
        self.method = method;
        self
    }
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Whether `score` is at least as good as the threshold.
    pub fn accepts(&self, score: f32) -> bool {
        if self.method.lower_is_better() {
            score <= self.threshold
        } else {
            score >= self.threshold
        }
    }
}

/// Best match of a template inside a source image.
///
/// `x` and `y` are the top-left corner of the matching window, widened to `f32`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: f32,
    pub x: f32,
    pub y: f32,
}

impl MatchResult {
    /// Returned for empty inputs.
    pub const ZERO: MatchResult = MatchResult {
        score: 0.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn to_array(&self) -> [f32; 3] {
        [self.score, self.x, self.y]
    }

    pub fn location(&self) -> (u32, u32) {
        (self.x as u32, self.y as u32)
    }
}

impl From<MatchResult> for [f32; 3] {
    fn from(result: MatchResult) -> Self {
        result.to_array()
    }
}

/// Match one template on an image to get one result.
pub struct SingleMatcher;

impl SingleMatcher {
    /// Finds the best location of `template` in `source`.
    ///
    /// An empty source or template is not an error: it yields [`MatchResult::ZERO`].
    pub fn match_template(
        source: &ImageView<'_>,
        template: &ImageView<'_>,
        options: &MatcherOptions,
    ) -> CvResult<MatchResult> {
        if source.is_empty() || template.is_empty() {
            debug!(
                "empty input ({}x{} source, {}x{} template), returning zero result",
                source.width(),
                source.height(),
                template.width(),
                template.height()
            );
            return Ok(MatchResult::ZERO);
        }
        let source = source.to_luma8()?;
        let template = template.to_luma8()?;
        Self::match_gray(&source, &template, options.method)
    }

    /// Same as [`Self::match_template`] for images that are already grayscale.
    pub fn match_gray(
        source: &GrayImage,
        template: &GrayImage,
        method: MatchTemplateMethod,
    ) -> CvResult<MatchResult> {
        let is_empty = |image: &GrayImage| image.width() == 0 || image.height() == 0;
        if is_empty(source) || is_empty(template) {
            return Ok(MatchResult::ZERO);
        }

        let surface = match_template(source, template, method)?;
        let (score, (x, y)) = best_match(&surface, method);
        trace!("{method}: best {score} at ({x}, {y})");

        Ok(MatchResult {
            score,
            x: x as f32,
            y: y as f32,
        })
    }

    /// Returns the best match only if it passes `options.threshold`.
    pub fn find(
        source: &ImageView<'_>,
        template: &ImageView<'_>,
        options: &MatcherOptions,
    ) -> CvResult<Option<MatchResult>> {
        let result = Self::match_template(source, template, options)?;
        Ok(options.accepts(result.score).then_some(result))
    }
}
