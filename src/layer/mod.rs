//! Differentiable STFT layer for `burn` models.
//!
//! The windowed DFT basis is applied as a strided 1-D convolution with one
//! output channel per frequency bin. Kernels are `Param` tensors, so a
//! trainable layer participates in the enclosing model's gradient updates
//! while a fixed layer is frozen with `no_grad`.

use burn::module::{Ignored, Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::module::conv1d;
use burn::tensor::ops::ConvOptions;
use burn::tensor::{Tensor, TensorData};
use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::spectrogram::{
    AnalysisFilters, ExtractorParams, FilterInit, Padding, SpectrogramError, SpectrogramMode,
    frame_plan,
};

/// Configuration carried by the layer outside of its parameters.
#[derive(Debug, Clone)]
pub struct LayerSettings {
    frame_length: usize,
    frame_step: usize,
    fft_length: usize,
    padding: Padding,
    mode: SpectrogramMode,
    eps: f32,
    window: Vec<f32>,
    init: FilterInit,
}

/// STFT front end producing `[batch, num_frames, num_bins, channels]`.
#[derive(Module, Debug)]
pub struct StftLayer<B: Backend> {
    real_kernel: Param<Tensor<B, 3>>,
    imag_kernel: Param<Tensor<B, 3>>,
    settings: Ignored<LayerSettings>,
}

impl<B: Backend> StftLayer<B> {
    /// Build the layer with freshly initialized filters.
    pub fn new(params: &ExtractorParams, device: &B::Device) -> Result<Self, SpectrogramError> {
        let filters = AnalysisFilters::new(params)?;
        Self::from_filters(params, &filters, device)
    }

    /// Build the layer around existing filters, e.g. ones trained earlier.
    pub fn from_filters(
        params: &ExtractorParams,
        filters: &AnalysisFilters,
        device: &B::Device,
    ) -> Result<Self, SpectrogramError> {
        params.validate()?;
        filters.check_compatible(params)?;
        let layer = Self {
            real_kernel: Param::from_tensor(kernel_tensor(filters.real(), device)),
            imag_kernel: Param::from_tensor(kernel_tensor(filters.imag(), device)),
            settings: Ignored(LayerSettings {
                frame_length: params.frame_length,
                frame_step: params.frame_step,
                fft_length: params.fft_length,
                padding: params.padding,
                mode: params.mode,
                eps: params.eps,
                window: filters.window().to_vec(),
                init: filters.init(),
            }),
        };
        debug!(
            frame_length = params.frame_length,
            num_bins = params.num_bins(),
            init = ?filters.init(),
            "Built STFT layer"
        );
        Ok(match filters.init() {
            FilterInit::Trainable => layer,
            FilterInit::Fixed => layer.no_grad(),
        })
    }

    pub fn is_trainable(&self) -> bool {
        self.settings.0.init == FilterInit::Trainable
    }

    /// Current real-part kernel, `[num_bins, 1, frame_length]`.
    pub fn real_kernel(&self) -> Tensor<B, 3> {
        self.real_kernel.val()
    }

    /// Current imaginary-part kernel, `[num_bins, 1, frame_length]`.
    pub fn imag_kernel(&self) -> Tensor<B, 3> {
        self.imag_kernel.val()
    }

    /// `[batch, num_samples, 1]` to `[batch, num_frames, num_bins, C]`.
    ///
    /// `C` is 1 for the real-valued modes and 2 (real, imaginary) in
    /// complex mode. The channel axis is always present whatever
    /// `expand_dims` says; use [`StftLayer::forward_flat`] for 3-D output.
    pub fn forward(&self, waveform: Tensor<B, 3>) -> Result<Tensor<B, 4>, SpectrogramError> {
        let (real, imag) = self.project(waveform)?;
        if self.settings.0.mode.is_complex() {
            return Ok(Tensor::stack::<4>(vec![real, imag], 3));
        }
        Ok(self.scale(real, imag).unsqueeze_dim::<4>(3))
    }

    /// `[batch, num_samples, 1]` to `[batch, num_frames, num_bins]`.
    pub fn forward_flat(&self, waveform: Tensor<B, 3>) -> Result<Tensor<B, 3>, SpectrogramError> {
        if self.settings.0.mode.is_complex() {
            return Err(SpectrogramError::ComplexFlat);
        }
        let (real, imag) = self.project(waveform)?;
        Ok(self.scale(real, imag))
    }

    /// Read the current kernels back as CPU analysis filters.
    pub fn filters(&self) -> Result<AnalysisFilters, SpectrogramError> {
        let settings = &self.settings.0;
        let num_bins = settings.fft_length / 2 + 1;
        let real = kernel_array(self.real_kernel.val(), settings.frame_length, num_bins)?;
        let imag = kernel_array(self.imag_kernel.val(), settings.frame_length, num_bins)?;
        AnalysisFilters::from_parts(
            settings.init,
            settings.fft_length,
            settings.window.clone(),
            real,
            imag,
        )
    }

    fn project(
        &self,
        waveform: Tensor<B, 3>,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 3>), SpectrogramError> {
        let settings = &self.settings.0;
        let [batch, num_samples, channels] = waveform.dims();
        if channels != 1 {
            return Err(SpectrogramError::ChannelCount(channels));
        }
        let plan = frame_plan(
            num_samples,
            settings.frame_length,
            settings.frame_step,
            settings.padding,
        );
        if plan.num_frames == 0 {
            return Err(SpectrogramError::NoFrames {
                num_samples,
                frame_length: settings.frame_length,
            });
        }
        let device = waveform.device();
        let mut signal = waveform.swap_dims(1, 2);
        if plan.pad_before > 0 || plan.pad_after > 0 {
            let mut parts = Vec::with_capacity(3);
            if plan.pad_before > 0 {
                parts.push(Tensor::zeros([batch, 1, plan.pad_before], &device));
            }
            parts.push(signal);
            if plan.pad_after > 0 {
                parts.push(Tensor::zeros([batch, 1, plan.pad_after], &device));
            }
            signal = Tensor::cat(parts, 2);
        }
        let options = ConvOptions::new([settings.frame_step], [0], [1], 1);
        let real = conv1d(signal.clone(), self.real_kernel.val(), None, options.clone());
        let imag = conv1d(signal, self.imag_kernel.val(), None, options);
        Ok((real.swap_dims(1, 2), imag.swap_dims(1, 2)))
    }

    fn scale(&self, real: Tensor<B, 3>, imag: Tensor<B, 3>) -> Tensor<B, 3> {
        let eps = self.settings.0.eps;
        let power = real.clone() * real + imag.clone() * imag;
        // Flooring the power keeps d(sqrt)/d(power) finite at silent bins.
        let magnitude = |power: Tensor<B, 3>| power.clamp_min(f32::MIN_POSITIVE).sqrt();
        match self.settings.0.mode {
            SpectrogramMode::Power => power,
            SpectrogramMode::LogPower => power.add_scalar(eps).log(),
            SpectrogramMode::Log => magnitude(power).add_scalar(eps).log(),
            SpectrogramMode::Magnitude | SpectrogramMode::Complex => magnitude(power),
        }
    }
}

/// `(frame_length, num_bins)` basis to a `[num_bins, 1, frame_length]` kernel.
fn kernel_tensor<B: Backend>(basis: ArrayView2<'_, f32>, device: &B::Device) -> Tensor<B, 3> {
    let (frame_length, num_bins) = basis.dim();
    let values: Vec<f32> = basis.t().iter().copied().collect();
    Tensor::from_data(TensorData::new(values, [num_bins, 1, frame_length]), device)
}

fn kernel_array<B: Backend>(
    kernel: Tensor<B, 3>,
    frame_length: usize,
    num_bins: usize,
) -> Result<Array2<f32>, SpectrogramError> {
    let values = kernel
        .into_data()
        .to_vec::<f32>()
        .map_err(|err| SpectrogramError::TensorData(format!("{err:?}")))?;
    let by_bin = Array2::from_shape_vec((num_bins, frame_length), values)?;
    Ok(by_bin.reversed_axes().as_standard_layout().into_owned())
}
