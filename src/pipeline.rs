//! WAV files in, JSON-ready spectrogram documents out.

use std::path::{Path, PathBuf};

use ndarray::{Array3, ArrayView3};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::audio::{self, AudioError};
use crate::config::{ConfigError, Settings};
use crate::spectrogram::{
    Spectrogram, SpectrogramData, SpectrogramError, SpectrogramExtractor, SpectrogramMode,
    stack_channels,
};

/// Errors raised while turning audio files into spectrograms.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No input files given")]
    NoInputs,
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Spectrogram(#[from] SpectrogramError),
}

/// Serialized form of one extracted batch.
///
/// `values` holds the array in row-major order. Complex output gains a
/// trailing axis of length 2 holding real and imaginary parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrogramDocument {
    pub shape: Vec<usize>,
    pub frame_step: usize,
    pub fft_length: usize,
    pub frame_lengths: Vec<usize>,
    pub sample_rate: u32,
    pub mode: SpectrogramMode,
    pub inputs: Vec<String>,
    pub values: Vec<f32>,
}

/// One extractor per configured bandwidth plus the audio settings.
#[derive(Debug)]
pub struct Pipeline {
    settings: Settings,
    extractors: Vec<SpectrogramExtractor>,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Result<Self, PipelineError> {
        let settings = settings.normalized();
        let extractors = settings
            .bandwidth_params()?
            .into_iter()
            .map(SpectrogramExtractor::new)
            .collect::<Result<Vec<_>, _>>()?;
        if extractors.len() > 1 && settings.extractor.mode.is_complex() {
            return Err(SpectrogramError::ComplexStack.into());
        }
        Ok(Self {
            settings,
            extractors,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Decode, resample and length-align `paths` into one batch.
    ///
    /// Without a configured clip length every waveform is zero-padded to
    /// the longest input.
    pub fn load_batch(&self, paths: &[PathBuf]) -> Result<Array3<f32>, PipelineError> {
        if paths.is_empty() {
            return Err(PipelineError::NoInputs);
        }
        let rate = self.settings.audio.sample_rate;
        let mut waveforms = paths
            .iter()
            .map(|path| audio::load_waveform(path, rate).map(|waveform| waveform.samples))
            .collect::<Result<Vec<_>, _>>()?;
        let target = self.settings.clip_samples().unwrap_or_else(|| {
            waveforms
                .iter()
                .map(Vec::len)
                .max()
                .unwrap_or_default()
        });
        for samples in &mut waveforms {
            audio::fit_length(samples, target);
        }
        Ok(audio::batch_waveforms(&waveforms)?)
    }

    /// Extract every bandwidth and stack them when there is more than one.
    pub fn run(
        &self,
        batch: ArrayView3<'_, f32>,
        inputs: Vec<String>,
    ) -> Result<SpectrogramDocument, PipelineError> {
        let spectrograms = self
            .extractors
            .iter()
            .map(|extractor| extractor.extract(batch))
            .collect::<Result<Vec<_>, _>>()?;
        let (shape, values) = match spectrograms.as_slice() {
            [single] => flatten(single),
            many => {
                let stacked = stack_channels(many)?;
                (stacked.shape().to_vec(), stacked.iter().copied().collect())
            }
        };
        let params = &self.settings.extractor;
        info!(
            inputs = inputs.len(),
            shape = ?shape,
            "Extracted spectrograms"
        );
        Ok(SpectrogramDocument {
            shape,
            frame_step: params.frame_step,
            fft_length: params.fft_length,
            frame_lengths: self
                .extractors
                .iter()
                .map(|extractor| extractor.params().frame_length)
                .collect(),
            sample_rate: self.settings.audio.sample_rate,
            mode: params.mode,
            inputs,
            values,
        })
    }

    /// [`Pipeline::load_batch`] followed by [`Pipeline::run`].
    pub fn process_files(&self, paths: &[PathBuf]) -> Result<SpectrogramDocument, PipelineError> {
        let batch = self.load_batch(paths)?;
        let inputs = paths.iter().map(|path| display_name(path)).collect();
        self.run(batch.view(), inputs)
    }
}

fn flatten(spectrogram: &Spectrogram) -> (Vec<usize>, Vec<f32>) {
    match spectrogram.data() {
        SpectrogramData::Real(values) => (values.shape().to_vec(), values.iter().copied().collect()),
        SpectrogramData::Complex(values) => {
            let mut shape = values.shape().to_vec();
            shape.push(2);
            let flat = values.iter().flat_map(|value| [value.re, value.im]).collect();
            (shape, flat)
        }
    }
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}
