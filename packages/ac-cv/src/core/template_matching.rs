//! Template matching on 8-bit grayscale images.
//!
//! The response surface and its extremum search come from [`imageproc::template_matching`];
//! this module validates sizes, fills in the all-black template case and picks the right
//! extremum for each method.
use std::fmt::Display;

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::{
    integral_image::{integral_image, sum_image_pixels},
    template_matching::{self as backend, Extremes},
};
use serde::{Deserialize, Serialize};

use crate::error::{CvResult, MatchError};

pub use imageproc::template_matching::find_extremes;

/// Response surface: one score per valid top-left template position.
pub type ResponseSurface = ImageBuffer<Luma<f32>, Vec<f32>>;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTemplateMethod {
    SumOfSquaredErrors,
    SumOfSquaredErrorsNormed,
    CrossCorrelation,
    #[default]
    CrossCorrelationNormed,
}

impl MatchTemplateMethod {
    pub const ALL: [MatchTemplateMethod; 4] = [
        MatchTemplateMethod::SumOfSquaredErrors,
        MatchTemplateMethod::SumOfSquaredErrorsNormed,
        MatchTemplateMethod::CrossCorrelation,
        MatchTemplateMethod::CrossCorrelationNormed,
    ];

    /// Squared-error methods score a perfect match lowest.
    pub fn lower_is_better(&self) -> bool {
        matches!(
            self,
            MatchTemplateMethod::SumOfSquaredErrors | MatchTemplateMethod::SumOfSquaredErrorsNormed
        )
    }
}

impl From<MatchTemplateMethod> for backend::MatchTemplateMethod {
    fn from(method: MatchTemplateMethod) -> Self {
        match method {
            MatchTemplateMethod::SumOfSquaredErrors => {
                backend::MatchTemplateMethod::SumOfSquaredErrors
            }
            MatchTemplateMethod::SumOfSquaredErrorsNormed => {
                backend::MatchTemplateMethod::SumOfSquaredErrorsNormalized
            }
            MatchTemplateMethod::CrossCorrelation => backend::MatchTemplateMethod::CrossCorrelation,
            MatchTemplateMethod::CrossCorrelationNormed => {
                backend::MatchTemplateMethod::CrossCorrelationNormalized
            }
        }
    }
}

impl Display for MatchTemplateMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchTemplateMethod::SumOfSquaredErrors => "sqdiff",
            MatchTemplateMethod::SumOfSquaredErrorsNormed => "sqdiff_normed",
            MatchTemplateMethod::CrossCorrelation => "ccorr",
            MatchTemplateMethod::CrossCorrelationNormed => "ccorr_normed",
        };
        f.write_str(s)
    }
}

pub fn is_a_more_match_than_b(a: f32, b: f32, method: MatchTemplateMethod) -> bool {
    if method.lower_is_better() { a < b } else { a > b }
}

/// Computes the response surface of `template` slid over `image`.
///
/// Both images must be non-empty and the template must fit inside the image.
pub fn match_template(
    image: &GrayImage,
    template: &GrayImage,
    method: MatchTemplateMethod,
) -> CvResult<ResponseSurface> {
    if template.width() > image.width() || template.height() > image.height() {
        return Err(MatchError::TemplateTooLarge {
            source_width: image.width(),
            source_height: image.height(),
            template_width: template.width(),
            template_height: template.height(),
        });
    }
    if method == MatchTemplateMethod::CrossCorrelationNormed
        && !template.is_empty()
        && template.pixels().all(|p| p.0[0] == 0)
    {
        return Ok(match_black_template(image, template));
    }
    Ok(backend::match_template(image, template, method.into()))
}

/// Normalized cross-correlation of an all-black template.
///
/// The template has no energy so imageproc scores every window 0. All-black windows are
/// identical to the template and score 1 here instead.
fn match_black_template(image: &GrayImage, template: &GrayImage) -> ResponseSurface {
    let integral: ImageBuffer<Luma<u64>, Vec<u64>> = integral_image(image);
    let (tw, th) = template.dimensions();
    ImageBuffer::from_fn(
        image.width() - tw + 1,
        image.height() - th + 1,
        |x, y| {
            let sum = sum_image_pixels(&integral, x, y, x + tw - 1, y + th - 1)[0];
            Luma([if sum == 0 { 1.0 } else { 0.0 }])
        },
    )
}

/// Returns the best score on the surface and its location.
pub fn best_match(surface: &ResponseSurface, method: MatchTemplateMethod) -> (f32, (u32, u32)) {
    let Extremes {
        max_value,
        min_value,
        max_value_location,
        min_value_location,
    } = find_extremes(surface);
    if method.lower_is_better() {
        (min_value, min_value_location)
    } else {
        (max_value, max_value_location)
    }
}
