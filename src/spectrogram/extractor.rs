use std::sync::Arc;

use ndarray::{Array2, Array3, ArrayD, ArrayView3, ArrayViewD, Axis, Ix3, Zip};
use rustfft::{Fft, FftPlanner};
use tracing::{debug, warn};

use super::filters::AnalysisFilters;
use super::framing::{FramePlan, padded_signal};
use super::output::{Spectrogram, SpectrogramData};
use super::{Complex32, ExtractorParams, SpectrogramError};

/// Batched STFT spectrogram extractor.
///
/// Fixed filters are evaluated with a planned FFT. Trainable filters are
/// evaluated by projecting frames onto their current coefficients, so
/// updated filters take effect on the next call.
pub struct SpectrogramExtractor {
    params: ExtractorParams,
    filters: AnalysisFilters,
    fft: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for SpectrogramExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrogramExtractor")
            .field("params", &self.params)
            .field("filters", &self.filters.init())
            .finish()
    }
}

impl SpectrogramExtractor {
    /// Validate `params` and build the analysis filters.
    pub fn new(params: ExtractorParams) -> Result<Self, SpectrogramError> {
        let filters = AnalysisFilters::new(&params)?;
        Self::with_filters(params, filters)
    }

    /// Use previously built (possibly trained) filters.
    pub fn with_filters(
        params: ExtractorParams,
        filters: AnalysisFilters,
    ) -> Result<Self, SpectrogramError> {
        params.validate()?;
        filters.check_compatible(&params)?;
        let fft = FftPlanner::<f32>::new().plan_fft_forward(params.fft_length);
        debug!(
            frame_length = params.frame_length,
            frame_step = params.frame_step,
            fft_length = params.fft_length,
            padding = %params.padding,
            mode = %params.mode,
            "Spectrogram extractor ready"
        );
        Ok(Self {
            params,
            filters,
            fft,
        })
    }

    pub fn params(&self) -> &ExtractorParams {
        &self.params
    }

    pub fn filters(&self) -> &AnalysisFilters {
        &self.filters
    }

    /// Mutable access for training loops that own the filters.
    pub fn filters_mut(&mut self) -> &mut AnalysisFilters {
        &mut self.filters
    }

    /// Frames produced for signals of `num_samples`.
    pub fn num_frames(&self, num_samples: usize) -> usize {
        self.params.num_frames(num_samples)
    }

    /// Extract spectrograms from a `(batch, num_samples, 1)` waveform batch.
    pub fn extract(&self, waveform: ArrayView3<'_, f32>) -> Result<Spectrogram, SpectrogramError> {
        let (batch, num_samples, channels) = waveform.dim();
        if channels != 1 {
            return Err(SpectrogramError::ChannelCount(channels));
        }
        let plan = self.params.frame_plan(num_samples);
        let num_bins = self.params.num_bins();
        let mut coefficients =
            Array3::<Complex32>::zeros((batch, plan.num_frames, num_bins));
        let mut sanitized = 0usize;
        for (signal, mut out) in waveform
            .axis_iter(Axis(0))
            .zip(coefficients.axis_iter_mut(Axis(0)))
        {
            let (padded, replaced) = padded_signal(signal.index_axis(Axis(1), 0), &plan);
            sanitized += replaced;
            let frames = self.transform(&padded, &plan);
            out.assign(&frames);
        }
        if sanitized > 0 {
            warn!("Replaced {sanitized} non-finite samples with silence before STFT");
        }
        debug!(
            batch,
            num_samples,
            num_frames = plan.num_frames,
            num_bins,
            "Extracted spectrogram batch"
        );
        Ok(Spectrogram::new(self.finish(coefficients), &self.params))
    }

    /// Extract from a dynamic-rank array, rejecting anything but rank 3.
    pub fn extract_dyn(&self, waveform: ArrayViewD<'_, f32>) -> Result<Spectrogram, SpectrogramError> {
        let rank = waveform.ndim();
        if rank != 3 {
            return Err(SpectrogramError::InputRank(rank));
        }
        let waveform = waveform.into_dimensionality::<Ix3>()?;
        self.extract(waveform)
    }

    /// Extract from a single mono signal as a batch of one.
    pub fn extract_signal(&self, samples: &[f32]) -> Result<Spectrogram, SpectrogramError> {
        let view = ArrayView3::from_shape((1, samples.len(), 1), samples)?;
        self.extract(view)
    }

    fn transform(&self, padded: &[f32], plan: &FramePlan) -> Array2<Complex32> {
        if self.filters.is_trainable() {
            self.transform_projected(padded, plan)
        } else {
            self.transform_fft(padded, plan)
        }
    }

    fn transform_fft(&self, padded: &[f32], plan: &FramePlan) -> Array2<Complex32> {
        let frame_length = self.params.frame_length;
        let num_bins = self.params.num_bins();
        let window = self.filters.window();
        let mut out = Array2::<Complex32>::zeros((plan.num_frames, num_bins));
        let mut buffer = vec![Complex32::default(); self.params.fft_length];
        let mut scratch = vec![Complex32::default(); self.fft.get_inplace_scratch_len()];
        for (frame_idx, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
            let start = frame_idx * self.params.frame_step;
            fill_windowed(&mut buffer, &padded[start..start + frame_length], window);
            self.fft.process_with_scratch(&mut buffer, &mut scratch);
            for (slot, value) in row.iter_mut().zip(buffer[..num_bins].iter()) {
                *slot = *value;
            }
        }
        out
    }

    fn transform_projected(&self, padded: &[f32], plan: &FramePlan) -> Array2<Complex32> {
        let frame_length = self.params.frame_length;
        let step = self.params.frame_step;
        let frames = Array2::from_shape_fn((plan.num_frames, frame_length), |(frame, i)| {
            padded[frame * step + i]
        });
        let (real, imag) = self.filters.project(frames.view());
        Zip::from(&real)
            .and(&imag)
            .map_collect(|&re, &im| Complex32::new(re, im))
    }

    fn finish(&self, coefficients: Array3<Complex32>) -> SpectrogramData {
        let mode = self.params.mode;
        let eps = self.params.eps;
        if mode.is_complex() {
            SpectrogramData::Complex(expand(coefficients, self.params.expand_dims))
        } else {
            let values = coefficients.mapv(|value| mode.scale(value, eps).unwrap_or(0.0));
            SpectrogramData::Real(expand(values, self.params.expand_dims))
        }
    }
}

fn fill_windowed(target: &mut [Complex32], frame: &[f32], window: &[f32]) {
    for (i, cell) in target.iter_mut().enumerate() {
        *cell = match (frame.get(i), window.get(i)) {
            (Some(&sample), Some(&weight)) => Complex32::new(sample * weight, 0.0),
            _ => Complex32::default(),
        };
    }
}

fn expand<T>(values: Array3<T>, expand_dims: bool) -> ArrayD<T> {
    if expand_dims {
        values.insert_axis(Axis(3)).into_dyn()
    } else {
        values.into_dyn()
    }
}

