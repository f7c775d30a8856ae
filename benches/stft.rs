use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array3;
use specgram::{ExtractorParams, SpectrogramExtractor};

const BATCH: usize = 8;
const NUM_SAMPLES: usize = 80_000;

fn waveform_batch() -> Array3<f32> {
    Array3::from_shape_fn((BATCH, NUM_SAMPLES, 1), |(b, i, _)| {
        let t = i as f32 / 16_000.0;
        (2.0 * std::f32::consts::PI * (220.0 + 110.0 * b as f32) * t).sin()
    })
}

fn bench_extract(c: &mut Criterion) {
    let batch = waveform_batch();
    let mut group = c.benchmark_group("extract");
    for trainable in [false, true] {
        let extractor = SpectrogramExtractor::new(ExtractorParams {
            trainable,
            ..ExtractorParams::default()
        })
        .expect("extractor");
        let label = if trainable { "projected" } else { "fft" };
        group.bench_with_input(BenchmarkId::new(label, BATCH), &batch, |b, batch| {
            b.iter(|| {
                extractor
                    .extract(black_box(batch.view()))
                    .expect("extract");
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
