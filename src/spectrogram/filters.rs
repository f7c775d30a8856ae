use std::f64::consts::PI;

use ndarray::{Array2, ArrayView2};
use tracing::debug;

use super::{ExtractorParams, SpectrogramError};

/// How the analysis filters are owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterInit {
    /// Constant windowed DFT basis.
    Fixed,
    /// Learnable parameters initialized from the windowed DFT basis.
    Trainable,
}

/// Windowed DFT basis used to project frames onto frequency bins.
///
/// `real` and `imag` are shaped `(frame_length, num_bins)` so a matrix of
/// raw frames `(num_frames, frame_length)` maps to the real and imaginary
/// parts of the spectrum by matrix product. Zero-padding to `fft_length`
/// is folded into the basis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFilters {
    init: FilterInit,
    fft_length: usize,
    window: Vec<f32>,
    real: Array2<f32>,
    imag: Array2<f32>,
}

impl AnalysisFilters {
    /// Build the basis described by `params`.
    pub fn new(params: &ExtractorParams) -> Result<Self, SpectrogramError> {
        params.validate()?;
        let init = if params.trainable {
            FilterInit::Trainable
        } else {
            FilterInit::Fixed
        };
        let window = params.window.coefficients(params.frame_length);
        let (real, imag) = windowed_dft_basis(&window, params.fft_length);
        debug!(
            frame_length = params.frame_length,
            fft_length = params.fft_length,
            window = %params.window,
            ?init,
            "Built analysis filters"
        );
        Ok(Self {
            init,
            fft_length: params.fft_length,
            window,
            real,
            imag,
        })
    }

    /// Reassemble filters from coefficients produced elsewhere.
    pub fn from_parts(
        init: FilterInit,
        fft_length: usize,
        window: Vec<f32>,
        real: Array2<f32>,
        imag: Array2<f32>,
    ) -> Result<Self, SpectrogramError> {
        let expected = (window.len(), fft_length / 2 + 1);
        if window.is_empty() {
            return Err(SpectrogramError::ZeroFrameLength);
        }
        if fft_length < window.len() {
            return Err(SpectrogramError::FftTooShort {
                fft_length,
                frame_length: window.len(),
            });
        }
        check_shape(expected, &real)?;
        check_shape(expected, &imag)?;
        check_finite(&real, &imag)?;
        Ok(Self {
            init,
            fft_length,
            window,
            real,
            imag,
        })
    }

    pub fn init(&self) -> FilterInit {
        self.init
    }

    pub fn is_trainable(&self) -> bool {
        self.init == FilterInit::Trainable
    }

    pub fn frame_length(&self) -> usize {
        self.window.len()
    }

    pub fn fft_length(&self) -> usize {
        self.fft_length
    }

    pub fn num_bins(&self) -> usize {
        self.fft_length / 2 + 1
    }

    /// Window the basis was initialized with.
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Real-part projection, `(frame_length, num_bins)`.
    pub fn real(&self) -> ArrayView2<'_, f32> {
        self.real.view()
    }

    /// Imaginary-part projection, `(frame_length, num_bins)`.
    pub fn imag(&self) -> ArrayView2<'_, f32> {
        self.imag.view()
    }

    /// Check that these filters fit `params`: same basis shape, FFT length
    /// and trainability.
    pub fn check_compatible(&self, params: &ExtractorParams) -> Result<(), SpectrogramError> {
        let expected = (params.frame_length, params.num_bins());
        let actual = (self.frame_length(), self.num_bins());
        if expected != actual || self.fft_length() != params.fft_length {
            return Err(SpectrogramError::FilterShape { expected, actual });
        }
        if params.trainable != self.is_trainable() {
            return Err(SpectrogramError::FilterInitMismatch {
                requested: params.trainable,
                actual: self.is_trainable(),
            });
        }
        Ok(())
    }

    /// Replace the coefficients of trainable filters.
    pub fn set_coefficients(
        &mut self,
        real: Array2<f32>,
        imag: Array2<f32>,
    ) -> Result<(), SpectrogramError> {
        if !self.is_trainable() {
            return Err(SpectrogramError::FiltersFrozen);
        }
        let expected = self.real.dim();
        check_shape(expected, &real)?;
        check_shape(expected, &imag)?;
        check_finite(&real, &imag)?;
        self.real = real;
        self.imag = imag;
        Ok(())
    }

    /// Plain gradient-descent step on trainable filters.
    pub fn apply_gradients(
        &mut self,
        grad_real: ArrayView2<'_, f32>,
        grad_imag: ArrayView2<'_, f32>,
        learning_rate: f32,
    ) -> Result<(), SpectrogramError> {
        if !self.is_trainable() {
            return Err(SpectrogramError::FiltersFrozen);
        }
        let expected = self.real.dim();
        for actual in [grad_real.dim(), grad_imag.dim()] {
            if actual != expected {
                return Err(SpectrogramError::FilterShape { expected, actual });
            }
        }
        let real = &self.real - &(&grad_real * learning_rate);
        let imag = &self.imag - &(&grad_imag * learning_rate);
        self.set_coefficients(real, imag)
    }

    /// Project raw frames `(num_frames, frame_length)` onto the basis.
    pub(super) fn project(&self, frames: ArrayView2<'_, f32>) -> (Array2<f32>, Array2<f32>) {
        (frames.dot(&self.real), frames.dot(&self.imag))
    }
}

fn windowed_dft_basis(window: &[f32], fft_length: usize) -> (Array2<f32>, Array2<f32>) {
    let num_bins = fft_length / 2 + 1;
    let n_fft = fft_length.max(1) as u64;
    let mut real = Array2::<f32>::zeros((window.len(), num_bins));
    let mut imag = Array2::<f32>::zeros((window.len(), num_bins));
    for (n, &w) in window.iter().enumerate() {
        for k in 0..num_bins {
            // k * n is reduced modulo the FFT length before scaling.
            let phase = (k as u64 * n as u64) % n_fft;
            let angle = 2.0 * PI * phase as f64 / n_fft as f64;
            real[[n, k]] = (w as f64 * angle.cos()) as f32;
            imag[[n, k]] = (-(w as f64) * angle.sin()) as f32;
        }
    }
    (real, imag)
}

fn check_shape(expected: (usize, usize), actual: &Array2<f32>) -> Result<(), SpectrogramError> {
    if actual.dim() != expected {
        return Err(SpectrogramError::FilterShape {
            expected,
            actual: actual.dim(),
        });
    }
    Ok(())
}

fn check_finite(real: &Array2<f32>, imag: &Array2<f32>) -> Result<(), SpectrogramError> {
    if real.iter().chain(imag.iter()).all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SpectrogramError::NonFiniteFilters)
    }
}
