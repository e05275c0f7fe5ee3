use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ecosort::{preprocess, BuiltinCatalog, Classifier, ClassifierError, Scorer};
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::ArrayView4;
use std::sync::Arc;

/// Stands in for a real model so the benchmark measures the pipeline only.
struct MeanScorer;

impl Scorer for MeanScorer {
    fn infer(&self, batch: ArrayView4<'_, f32>) -> Result<Vec<f32>, ClassifierError> {
        let mean = batch.mean().unwrap_or(0.0);
        Ok(vec![mean, 1.0 - mean, 0.5, 0.25])
    }
}

fn test_image(size: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    }))
}

fn bench_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("Preprocess");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    // Camera-sized inputs down to already-small thumbnails
    for size in [150u32, 300, 1024] {
        let image = test_image(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &image, |b, image| {
            b.iter(|| preprocess(black_box(image), 150).unwrap())
        });
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("Classify");
    group.sample_size(50);

    let classifier = Classifier::builder()
        .with_builtin_catalog(BuiltinCatalog::FourClass)
        .with_scorer(Arc::new(MeanScorer))
        .unwrap()
        .build()
        .unwrap();
    let image = test_image(300);

    group.bench_function("stub_model_300px", |b| {
        b.iter(|| classifier.classify(black_box(&image)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_preprocess, bench_classify);
criterion_main!(benches);
