//! Matching a template that may appear larger or smaller than it was captured.
use image::{
    GrayImage,
    imageops::{self, FilterType},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{MatchResult, MatcherOptions, SingleMatcher};
use crate::{
    core::template_matching::is_a_more_match_than_b,
    error::{CvResult, MatchError},
    view::ImageView,
};

/// Slack on the upper bound so accumulated float error keeps `max_scale` in range.
const SCALE_EPSILON: f32 = 1e-3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiScaleOptions {
    pub min_scale: f32,
    pub max_scale: f32,
    pub step: f32,
}

impl Default for MultiScaleOptions {
    fn default() -> Self {
        Self {
            min_scale: 0.8,
            max_scale: 1.2,
            step: 0.05,
        }
    }
}

impl MultiScaleOptions {
    pub fn new(min_scale: f32, max_scale: f32, step: f32) -> Self {
        Self {
            min_scale,
            max_scale,
            step,
        }
    }

    pub fn validate(&self) -> CvResult<()> {
        let Self {
            min_scale,
            max_scale,
            step,
        } = *self;
        let finite = min_scale.is_finite() && max_scale.is_finite() && step.is_finite();
        if !finite || min_scale <= 0.0 || min_scale > max_scale || step <= 0.0 {
            return Err(MatchError::InvalidScaleRange {
                min_scale,
                max_scale,
                step,
            });
        }
        Ok(())
    }

    /// Scales from `min_scale` to `max_scale` inclusive.
    pub fn scales(&self) -> CvResult<Vec<f32>> {
        self.validate()?;
        let scales = (0..)
            .map(|i| self.min_scale + i as f32 * self.step)
            .take_while(|scale| *scale <= self.max_scale + SCALE_EPSILON)
            .collect();
        Ok(scales)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiScaleResult {
    pub score: f32,
    pub x: f32,
    pub y: f32,
    /// Template scale that produced the match.
    pub scale: f32,
}

impl MultiScaleResult {
    pub fn match_result(&self) -> MatchResult {
        MatchResult {
            score: self.score,
            x: self.x,
            y: self.y,
        }
    }
}

fn scaled_size(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (
        ((width as f32 * scale) as u32).max(1),
        ((height as f32 * scale) as u32).max(1),
    )
}

/// Match one template at several scales and keep the best result.
pub struct MultiScaleMatcher;

impl MultiScaleMatcher {
    /// Ties keep the smaller scale. Scales that make the template larger than the source are
    /// skipped; if none is left the size error is returned.
    pub fn match_template(
        source: &ImageView<'_>,
        template: &ImageView<'_>,
        options: &MatcherOptions,
        scales: &MultiScaleOptions,
    ) -> CvResult<MultiScaleResult> {
        Self::match_gray(&source.to_luma8()?, &template.to_luma8()?, options, scales)
    }

    /// Same as [`Self::match_template`] for images that are already grayscale.
    pub fn match_gray(
        source: &GrayImage,
        template: &GrayImage,
        options: &MatcherOptions,
        scales: &MultiScaleOptions,
    ) -> CvResult<MultiScaleResult> {
        let is_empty = |image: &GrayImage| image.width() == 0 || image.height() == 0;
        if is_empty(source) || is_empty(template) {
            debug!("empty input, returning zero result");
            return Ok(MultiScaleResult {
                score: 0.0,
                x: 0.0,
                y: 0.0,
                scale: 1.0,
            });
        }
        let scales = scales.scales()?;

        let mut best: Option<MultiScaleResult> = None;
        let mut last_error = None;
        for scale in scales {
            let (width, height) = scaled_size(template.width(), template.height(), scale);
            if width > source.width() || height > source.height() {
                debug!(
                    "skipping scale {scale}: {width}x{height} template exceeds {}x{} source",
                    source.width(),
                    source.height()
                );
                last_error = Some(MatchError::TemplateTooLarge {
                    source_width: source.width(),
                    source_height: source.height(),
                    template_width: width,
                    template_height: height,
                });
                continue;
            }

            let scaled = imageops::resize(template, width, height, FilterType::Triangle);
            let result = SingleMatcher::match_gray(source, &scaled, options.method)?;
            trace!("scale {scale}: {result:?}");

            if best.is_none_or(|b| is_a_more_match_than_b(result.score, b.score, options.method))
            {
                best = Some(MultiScaleResult {
                    score: result.score,
                    x: result.x,
                    y: result.y,
                    scale,
                });
            }
        }

        match (best, last_error) {
            (Some(best), _) => Ok(best),
            (None, Some(err)) => Err(err),
            (None, None) => Err(MatchError::TemplateTooLarge {
                source_width: source.width(),
                source_height: source.height(),
                template_width: template.width(),
                template_height: template.height(),
            }),
        }
    }
}
