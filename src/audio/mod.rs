//! Waveform loading and batching ahead of spectrogram extraction.

mod decode;
mod resample;

use std::path::{Path, PathBuf};

use ndarray::{Array3, Axis};
use thiserror::Error;
use tracing::debug;

pub use decode::decode_wav;
pub use resample::{resample_linear, resample_linear_into};

/// Mono samples plus the rate they were captured at.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate.max(1) as f32
    }

    /// Linear-interpolated copy at `target_rate`.
    pub fn resampled(&self, target_rate: u32) -> Self {
        Self::new(
            resample_linear(&self.samples, self.sample_rate, target_rate),
            target_rate.max(1),
        )
    }
}

/// Errors raised while reading or batching audio.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The WAV file could not be opened or parsed.
    #[error("Failed to read WAV {path}: {source}")]
    Wav {
        /// File being read.
        path: PathBuf,
        /// Underlying decoder error.
        source: hound::Error,
    },
    /// The WAV header advertised no channels.
    #[error("WAV {path} declares zero channels")]
    NoChannels {
        /// File being read.
        path: PathBuf,
    },
    /// Waveforms in one batch had different lengths.
    #[error("Waveform {index} has {actual} samples, expected {expected}")]
    LengthMismatch {
        /// Position in the batch.
        index: usize,
        /// Length of the first waveform.
        expected: usize,
        /// Length of the offending waveform.
        actual: usize,
    },
}

/// Decode a WAV file and resample it to `target_rate`.
pub fn load_waveform(path: &Path, target_rate: u32) -> Result<Waveform, AudioError> {
    let decoded = decode_wav(path)?;
    let source_rate = decoded.sample_rate;
    let waveform = decoded.resampled(target_rate);
    debug!(
        path = %path.display(),
        source_rate,
        target_rate,
        samples = waveform.samples.len(),
        "Loaded waveform"
    );
    Ok(waveform)
}

/// Zero-pad or truncate `samples` to exactly `len`.
pub fn fit_length(samples: &mut Vec<f32>, len: usize) {
    samples.resize(len, 0.0);
}

/// Samples in a clip of `seconds` at `sample_rate`.
pub fn clip_samples(seconds: f32, sample_rate: u32) -> usize {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * sample_rate as f32).round() as usize
}

/// Stack equal-length waveforms into a `(batch, num_samples, 1)` array.
pub fn batch_waveforms<S: AsRef<[f32]>>(waveforms: &[S]) -> Result<Array3<f32>, AudioError> {
    let expected = waveforms.first().map_or(0, |w| w.as_ref().len());
    let mut batch = Array3::<f32>::zeros((waveforms.len(), expected, 1));
    for (index, (waveform, mut row)) in waveforms
        .iter()
        .zip(batch.axis_iter_mut(Axis(0)))
        .enumerate()
    {
        let samples = waveform.as_ref();
        if samples.len() != expected {
            return Err(AudioError::LengthMismatch {
                index,
                expected,
                actual: samples.len(),
            });
        }
        for (slot, &sample) in row.iter_mut().zip(samples) {
            *slot = sample;
        }
    }
    Ok(batch)
}
