pub use ac_cv as cv;

pub mod config;

pub use config::Config;
pub use image::DynamicImage;

// Export CV related options and results
pub use cv::core::template_matching::MatchTemplateMethod;
pub use cv::{MatchResult, MatcherOptions, MultiScaleOptions, MultiScaleResult};

use std::path::Path;

use anyhow::Context;
use cv::{ImageView, MultiScaleMatcher, SingleMatcher};

/// Decodes an image file.
pub fn load_image(path: impl AsRef<Path>) -> anyhow::Result<DynamicImage> {
    let path = path.as_ref();
    image::open(path).with_context(|| format!("failed to load image {}", path.display()))
}

/// Best location of `template` on `screen`.
///
/// Both images are matched as RGBA, the layout screen captures arrive in, and converted to gray
/// by the matcher.
pub fn match_image(
    screen: &DynamicImage,
    template: &DynamicImage,
    options: &MatcherOptions,
) -> anyhow::Result<MatchResult> {
    let screen = screen.to_rgba8();
    let template = template.to_rgba8();
    let res = SingleMatcher::match_template(
        &ImageView::from_rgba(&screen),
        &ImageView::from_rgba(&template),
        options,
    )?;
    Ok(res)
}

/// Searches for a template image on the screen.
///
/// Returns the match if its score passes `options.threshold`, or `None`.
pub fn find_image(
    screen: &DynamicImage,
    template: &DynamicImage,
    options: &MatcherOptions,
) -> anyhow::Result<Option<MatchResult>> {
    let res = match_image(screen, template, options)?;
    Ok(options.accepts(res.score).then_some(res))
}

/// A shortcut for [`find_image`] using default options.
pub fn find_image_default(
    screen: &DynamicImage,
    template: &DynamicImage,
) -> anyhow::Result<Option<MatchResult>> {
    find_image(screen, template, &MatcherOptions::default())
}

/// Best location of `template` on `screen` across the configured template scales.
pub fn match_image_multi_scale(
    screen: &DynamicImage,
    template: &DynamicImage,
    config: &Config,
) -> anyhow::Result<MultiScaleResult> {
    let res = MultiScaleMatcher::match_gray(
        &screen.to_luma8(),
        &template.to_luma8(),
        &config.matcher,
        &config.multi_scale,
    )?;
    Ok(res)
}
