use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

/// Write mono 32-bit float samples.
pub fn write_float_wav(path: &Path, samples: &[f32], sample_rate: u32) {
    write_wav(path, sample_rate, 1, |writer| {
        for &sample in samples {
            writer.write_sample(sample).expect("write wav sample");
        }
    });
}

/// Write interleaved 16-bit PCM samples.
pub fn write_pcm16_wav(path: &Path, samples: &[i16], channels: u16, sample_rate: u32) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    create_parent(path);
    let mut writer = WavWriter::create(path, spec).expect("create wav writer");
    for &sample in samples {
        writer.write_sample(sample).expect("write wav sample");
    }
    writer.finalize().expect("finalize wav");
}

/// Sine tone of `seconds` at `frequency` Hz.
pub fn sine(frequency: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
    let len = (seconds * sample_rate as f32).round() as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.5 * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

fn write_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    write: impl FnOnce(&mut WavWriter<std::io::BufWriter<std::fs::File>>),
) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    create_parent(path);
    let mut writer = WavWriter::create(path, spec).expect("create wav writer");
    write(&mut writer);
    writer.finalize().expect("finalize wav");
}

fn create_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create wav parent dirs");
    }
}
