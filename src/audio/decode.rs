use std::io::BufReader;
use std::path::Path;

use hound::SampleFormat;

use super::{AudioError, Waveform};

/// Decode a WAV file to mono `f32` samples in `[-1, 1]`.
///
/// Integer PCM is scaled by its bit depth, channels are averaged and
/// non-finite samples become silence.
pub fn decode_wav(path: &Path) -> Result<Waveform, AudioError> {
    let wav_error = |source| AudioError::Wav {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = hound::WavReader::open(path).map_err(wav_error)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::NoChannels {
            path: path.to_path_buf(),
        });
    }
    let interleaved = read_samples(&mut reader, spec).map_err(wav_error)?;
    Ok(Waveform::new(
        downmix_to_mono(&interleaved, spec.channels),
        spec.sample_rate.max(1),
    ))
}

fn read_samples(
    reader: &mut hound::WavReader<BufReader<std::fs::File>>,
    spec: hound::WavSpec,
) -> Result<Vec<f32>, hound::Error> {
    match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect(),
        SampleFormat::Int => {
            let scale = (1i64 << spec.bits_per_sample.saturating_sub(1)).max(1) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 / scale))
                .collect()
        }
    }
}

fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().copied().map(sanitize_sample).sum::<f32>() / channels as f32)
        .collect()
}

fn sanitize_sample(sample: f32) -> f32 {
    if sample.is_finite() { sample } else { 0.0 }
}
