use ac_cv::{
    ImageView, MatcherOptions, MultiScaleMatcher, MultiScaleOptions, SingleMatcher,
    core::template_matching::{MatchTemplateMethod, find_extremes, match_template},
};
use criterion::{Criterion, criterion_group, criterion_main};
use image::{GrayImage, ImageBuffer, Luma, imageops};

fn screen(width: u32, height: u32) -> GrayImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Luma([((x * x * 31 + y * 17 + x * y * 7) % 211 + 20) as u8])
    })
}

fn bench_template_matching(c: &mut Criterion) {
    let image = screen(480, 270);
    let template = imageops::crop_imm(&image, 200, 100, 32, 32).to_image();

    {
        let mut group = c.benchmark_group("match_template");
        for method in MatchTemplateMethod::ALL {
            group.bench_function(method.to_string(), |b| {
                b.iter(|| match_template(&image, &template, method));
            });
        }
    }

    {
        let mut group = c.benchmark_group("find_extremes");
        for method in MatchTemplateMethod::ALL {
            let Ok(res) = match_template(&image, &template, method) else {
                continue;
            };
            group.bench_function(method.to_string(), |b| {
                b.iter(|| find_extremes(&res));
            });
        }
    }

    {
        let source = ImageView::from_gray(&image);
        let template = ImageView::from_gray(&template);
        let options = MatcherOptions::default();

        let mut group = c.benchmark_group("matcher");
        group.bench_function("single", |b| {
            b.iter(|| SingleMatcher::match_template(&source, &template, &options));
        });
        group.sample_size(10);
        group.bench_function("multi_scale", |b| {
            b.iter(|| {
                MultiScaleMatcher::match_template(
                    &source,
                    &template,
                    &options,
                    &MultiScaleOptions::default(),
                )
            });
        });
    }
}

criterion_group!(benches, bench_template_matching);
criterion_main!(benches);
