use ndarray::{Array4, ArrayD, ArrayView4, Axis, Ix4};

use super::{Complex32, ExtractorParams, Padding, SpectrogramError, SpectrogramMode};

/// Spectrogram values, real-valued or complex depending on the mode.
#[derive(Debug, Clone, PartialEq)]
pub enum SpectrogramData {
    /// `(batch, num_frames, num_bins)` or `(batch, num_frames, num_bins, 1)`.
    Real(ArrayD<f32>),
    /// Same layout holding raw DFT coefficients.
    Complex(ArrayD<Complex32>),
}

/// One batch of spectrograms plus the configuration that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    data: SpectrogramData,
    frame_length: usize,
    frame_step: usize,
    fft_length: usize,
    padding: Padding,
    mode: SpectrogramMode,
    expanded: bool,
}

impl Spectrogram {
    pub(super) fn new(data: SpectrogramData, params: &ExtractorParams) -> Self {
        Self {
            data,
            frame_length: params.frame_length,
            frame_step: params.frame_step,
            fft_length: params.fft_length,
            padding: params.padding,
            mode: params.mode,
            expanded: params.expand_dims,
        }
    }

    pub fn data(&self) -> &SpectrogramData {
        &self.data
    }

    pub fn into_data(self) -> SpectrogramData {
        self.data
    }

    /// Real values, or `None` in complex mode.
    pub fn real(&self) -> Option<&ArrayD<f32>> {
        match &self.data {
            SpectrogramData::Real(values) => Some(values),
            SpectrogramData::Complex(_) => None,
        }
    }

    /// Complex coefficients, or `None` for the real-valued modes.
    pub fn complex(&self) -> Option<&ArrayD<Complex32>> {
        match &self.data {
            SpectrogramData::Real(_) => None,
            SpectrogramData::Complex(values) => Some(values),
        }
    }

    /// Output array shape.
    pub fn shape(&self) -> &[usize] {
        match &self.data {
            SpectrogramData::Real(values) => values.shape(),
            SpectrogramData::Complex(values) => values.shape(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.shape()[0]
    }

    pub fn num_frames(&self) -> usize {
        self.shape()[1]
    }

    pub fn num_bins(&self) -> usize {
        self.shape()[2]
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    pub fn frame_step(&self) -> usize {
        self.frame_step
    }

    pub fn fft_length(&self) -> usize {
        self.fft_length
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn mode(&self) -> SpectrogramMode {
        self.mode
    }

    /// Whether a trailing channel axis is present.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Real values as `(batch, num_frames, num_bins, 1)`.
    pub fn channels_last(&self) -> Result<ArrayView4<'_, f32>, SpectrogramError> {
        let values = self.real().ok_or(SpectrogramError::ComplexStack)?;
        let view = values.view();
        let view = if self.expanded {
            view
        } else {
            view.insert_axis(Axis(3))
        };
        Ok(view.into_dimensionality::<Ix4>()?)
    }
}

/// Stack real spectrograms along a trailing channel axis.
///
/// Every input must share `fft_length`, `frame_step` and padding with the
/// first one, and agree on batch size, frame count and bin count.
pub fn stack_channels(spectrograms: &[Spectrogram]) -> Result<Array4<f32>, SpectrogramError> {
    let first = spectrograms.first().ok_or(SpectrogramError::EmptyStack)?;
    let mut views = Vec::with_capacity(spectrograms.len());
    for (index, spectrogram) in spectrograms.iter().enumerate() {
        if let Some(reason) = stack_mismatch(first, spectrogram) {
            return Err(SpectrogramError::StackMismatch { index, reason });
        }
        views.push(spectrogram.channels_last()?);
    }
    Ok(ndarray::concatenate(Axis(3), &views)?)
}

fn stack_mismatch(first: &Spectrogram, other: &Spectrogram) -> Option<String> {
    if other.fft_length != first.fft_length {
        return Some(format!(
            "fft_length {} != {}",
            other.fft_length, first.fft_length
        ));
    }
    if other.frame_step != first.frame_step {
        return Some(format!(
            "frame_step {} != {}",
            other.frame_step, first.frame_step
        ));
    }
    if other.padding != first.padding {
        return Some(format!("padding {} != {}", other.padding, first.padding));
    }
    let (a, b) = (first.shape(), other.shape());
    if a[..3] != b[..3] {
        return Some(format!(
            "shape {:?} != {:?}",
            &b[..3],
            &a[..3]
        ));
    }
    None
}
