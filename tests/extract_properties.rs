use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use specgram::spectrogram::{DEFAULT_LOG_EPS, stack_channels};
use specgram::{ExtractorParams, Padding, SpectrogramExtractor, SpectrogramMode, WindowKind};

fn noise(seed: u64, len: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(-1.0f32..1.0)).collect()
}

fn params(frame_length: usize, frame_step: usize, padding: Padding) -> ExtractorParams {
    ExtractorParams {
        frame_length,
        frame_step,
        fft_length: frame_length.next_power_of_two(),
        padding,
        mode: SpectrogramMode::Magnitude,
        expand_dims: false,
        ..ExtractorParams::default()
    }
}

#[test]
fn valid_padding_frame_count_formula() {
    for (frame_length, frame_step, num_samples) in
        [(320, 80, 80_000), (64, 16, 64), (64, 16, 65), (50, 7, 1_000), (8, 8, 31)]
    {
        let extractor = SpectrogramExtractor::new(params(frame_length, frame_step, Padding::Valid))
            .unwrap();
        let out = extractor.extract_signal(&vec![0.1; num_samples]).unwrap();
        assert_eq!(
            out.num_frames(),
            (num_samples - frame_length) / frame_step + 1,
            "frame_length={frame_length} frame_step={frame_step} num_samples={num_samples}"
        );
    }
}

#[test]
fn five_seconds_at_sixteen_khz_yields_997_valid_frames() {
    let extractor = SpectrogramExtractor::new(ExtractorParams {
        padding: Padding::Valid,
        ..ExtractorParams::default()
    })
    .unwrap();
    assert_eq!(extractor.num_frames(80_000), 997);
    let out = extractor.extract_signal(&noise(7, 80_000)).unwrap();
    assert_eq!(out.shape(), &[1, 997, 257, 1]);
}

#[test]
fn valid_padding_with_short_input_has_no_frames() {
    let extractor = SpectrogramExtractor::new(params(64, 16, Padding::Valid)).unwrap();
    let out = extractor.extract_signal(&[0.5; 63]).unwrap();
    assert_eq!(out.shape(), &[1, 0, 33]);
}

#[test]
fn same_padding_frame_count_ignores_frame_length() {
    let frame_step: usize = 80;
    for num_samples in [1usize, 79, 80, 81, 1_000, 16_001] {
        let expected = num_samples.div_ceil(frame_step);
        for frame_length in [40, 80, 320, 400] {
            let extractor =
                SpectrogramExtractor::new(params(frame_length, frame_step, Padding::Same)).unwrap();
            let out = extractor.extract_signal(&vec![0.25; num_samples]).unwrap();
            assert_eq!(out.num_frames(), expected, "frame_length={frame_length}");
        }
    }
}

#[test]
fn bin_count_is_half_fft_plus_one_for_every_mode() {
    let samples = noise(1, 500);
    for fft_length in [64, 100, 128] {
        for mode in [
            SpectrogramMode::Magnitude,
            SpectrogramMode::Log,
            SpectrogramMode::Power,
            SpectrogramMode::LogPower,
            SpectrogramMode::Complex,
        ] {
            let extractor = SpectrogramExtractor::new(ExtractorParams {
                fft_length,
                mode,
                ..params(64, 32, Padding::Same)
            })
            .unwrap();
            let out = extractor.extract_signal(&samples).unwrap();
            assert_eq!(out.num_bins(), fft_length / 2 + 1, "{mode}");
        }
    }
}

#[test]
fn power_is_magnitude_squared() {
    let samples = noise(2, 1_200);
    let magnitude = SpectrogramExtractor::new(params(256, 64, Padding::Same))
        .unwrap()
        .extract_signal(&samples)
        .unwrap();
    let power = SpectrogramExtractor::new(ExtractorParams {
        mode: SpectrogramMode::Power,
        ..params(256, 64, Padding::Same)
    })
    .unwrap()
    .extract_signal(&samples)
    .unwrap();
    for (m, p) in magnitude
        .real()
        .unwrap()
        .iter()
        .zip(power.real().unwrap().iter())
    {
        assert!((m * m - p).abs() <= 1e-4 * p.max(1.0), "{m}^2 vs {p}");
    }
}

#[test]
fn log_is_log_of_magnitude_plus_eps() {
    let samples = noise(3, 900);
    let eps = 1e-6;
    let magnitude = SpectrogramExtractor::new(params(128, 32, Padding::Valid))
        .unwrap()
        .extract_signal(&samples)
        .unwrap();
    let log = SpectrogramExtractor::new(ExtractorParams {
        mode: SpectrogramMode::Log,
        eps,
        ..params(128, 32, Padding::Valid)
    })
    .unwrap()
    .extract_signal(&samples)
    .unwrap();
    for (m, l) in magnitude
        .real()
        .unwrap()
        .iter()
        .zip(log.real().unwrap().iter())
    {
        assert!(((m + eps).ln() - l).abs() < 1e-4);
    }
}

#[test]
fn log_output_grows_with_amplitude() {
    let base = noise(4, 600);
    let extractor = SpectrogramExtractor::new(ExtractorParams {
        mode: SpectrogramMode::Log,
        ..params(128, 64, Padding::Same)
    })
    .unwrap();
    let mut previous: Option<Vec<f32>> = None;
    for gain in [0.01f32, 0.1, 1.0, 10.0] {
        let scaled: Vec<f32> = base.iter().map(|s| s * gain).collect();
        let out = extractor.extract_signal(&scaled).unwrap();
        let values: Vec<f32> = out.real().unwrap().iter().copied().collect();
        if let Some(previous) = &previous {
            for (before, after) in previous.iter().zip(&values) {
                assert!(after >= before);
            }
        }
        previous = Some(values);
    }
}

#[test]
fn silence_stays_finite_in_log_modes() {
    for mode in [SpectrogramMode::Log, SpectrogramMode::LogPower] {
        let extractor = SpectrogramExtractor::new(ExtractorParams {
            mode,
            ..ExtractorParams::default()
        })
        .unwrap();
        let out = extractor.extract_signal(&vec![0.0; 4_000]).unwrap();
        let floor = DEFAULT_LOG_EPS.ln();
        assert!(
            out.real()
                .unwrap()
                .iter()
                .all(|v| v.is_finite() && (v - floor).abs() < 1e-4)
        );
    }
}

#[test]
fn non_finite_samples_are_treated_as_silence() {
    let extractor = SpectrogramExtractor::new(params(32, 16, Padding::Same)).unwrap();
    let mut samples = noise(5, 256);
    let clean = extractor.extract_signal(&samples).unwrap();
    samples[10] = f32::NAN;
    samples[200] = f32::INFINITY;
    let dirty = extractor.extract_signal(&samples).unwrap();
    assert!(dirty.real().unwrap().iter().all(|v| v.is_finite()));
    assert_eq!(clean.shape(), dirty.shape());
}

#[test]
fn multi_bandwidth_outputs_align_and_stack() {
    let samples = noise(6, 16_000);
    let base = ExtractorParams {
        mode: SpectrogramMode::Log,
        ..ExtractorParams::default()
    };
    let outputs: Vec<_> = [160, 320, 480]
        .into_iter()
        .map(|frame_length| {
            SpectrogramExtractor::new(base.with_frame_length(frame_length))
                .unwrap()
                .extract_signal(&samples)
                .unwrap()
        })
        .collect();
    for out in &outputs {
        assert_eq!(out.shape(), outputs[0].shape());
    }
    assert_ne!(outputs[0].real(), outputs[1].real());
    let stacked = stack_channels(&outputs).unwrap();
    assert_eq!(stacked.dim(), (1, 200, 257, 3));
}

#[test]
fn repeated_extraction_is_deterministic() {
    let mut batch = Array3::<f32>::zeros((3, 2_000, 1));
    for (slot, value) in batch.iter_mut().zip(noise(8, 6_000)) {
        *slot = value;
    }
    for window in [WindowKind::Hann, WindowKind::Hamming, WindowKind::Rectangular] {
        let params = ExtractorParams {
            window,
            ..ExtractorParams::default()
        };
        let first = SpectrogramExtractor::new(params.clone())
            .unwrap()
            .extract(batch.view())
            .unwrap();
        let second = SpectrogramExtractor::new(params)
            .unwrap()
            .extract(batch.view())
            .unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn batch_rows_are_independent() {
    let a = noise(9, 700);
    let b = noise(10, 700);
    let mut batch = Array3::<f32>::zeros((2, 700, 1));
    for (i, (&x, &y)) in a.iter().zip(&b).enumerate() {
        batch[[0, i, 0]] = x;
        batch[[1, i, 0]] = y;
    }
    let extractor = SpectrogramExtractor::new(params(100, 50, Padding::Same)).unwrap();
    let together = extractor.extract(batch.view()).unwrap();
    let alone = extractor.extract_signal(&b).unwrap();
    let together = together.real().unwrap();
    let alone = alone.real().unwrap();
    let row = together.index_axis(ndarray::Axis(0), 1);
    let single = alone.index_axis(ndarray::Axis(0), 0);
    assert_eq!(row, single);
}
