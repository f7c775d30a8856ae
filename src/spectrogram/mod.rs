//! Short-time Fourier transform spectrogram extraction.
//!
//! Waveform batches shaped `(batch, num_samples, 1)` are padded, sliced into
//! overlapping frames, windowed, zero-padded to `fft_length` and transformed
//! with a real-input DFT. Each of the `fft_length / 2 + 1` bins is then
//! scaled according to [`SpectrogramMode`].

mod error;
mod extractor;
mod filters;
mod framing;
mod output;
mod window;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use error::SpectrogramError;
pub use extractor::SpectrogramExtractor;
pub use filters::{AnalysisFilters, FilterInit};
pub use framing::{FramePlan, frame_plan};
pub use output::{Spectrogram, SpectrogramData, stack_channels};
pub use rustfft::num_complex::Complex32;
pub use window::WindowKind;

/// Default epsilon added before taking logarithms.
pub const DEFAULT_LOG_EPS: f32 = 1e-10;

/// How the waveform is extended before framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Drop trailing samples that do not fill a whole frame.
    Valid,
    /// Zero-pad so `num_frames == ceil(num_samples / frame_step)`.
    #[default]
    Same,
}

impl Padding {
    fn as_str(self) -> &'static str {
        match self {
            Padding::Valid => "valid",
            Padding::Same => "same",
        }
    }
}

impl fmt::Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Padding {
    type Err = SpectrogramError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "valid" => Ok(Padding::Valid),
            "same" => Ok(Padding::Same),
            _ => Err(SpectrogramError::UnknownVariant {
                kind: "padding",
                value: value.to_string(),
            }),
        }
    }
}

/// Post-transform scaling of each frequency bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrogramMode {
    /// `|X|`.
    Magnitude,
    /// `ln(|X| + eps)`.
    #[default]
    Log,
    /// `|X|²`.
    Power,
    /// `ln(|X|² + eps)`.
    #[serde(alias = "log-power")]
    LogPower,
    /// Raw complex coefficients.
    Complex,
}

impl SpectrogramMode {
    /// True when the output keeps complex coefficients.
    pub fn is_complex(self) -> bool {
        matches!(self, SpectrogramMode::Complex)
    }

    /// Real-valued scaling of one bin; `None` for [`SpectrogramMode::Complex`].
    pub fn scale(self, value: Complex32, eps: f32) -> Option<f32> {
        match self {
            SpectrogramMode::Magnitude => Some(value.norm()),
            SpectrogramMode::Log => Some((value.norm() + eps).ln()),
            SpectrogramMode::Power => Some(value.norm_sqr()),
            SpectrogramMode::LogPower => Some((value.norm_sqr() + eps).ln()),
            SpectrogramMode::Complex => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SpectrogramMode::Magnitude => "magnitude",
            SpectrogramMode::Log => "log",
            SpectrogramMode::Power => "power",
            SpectrogramMode::LogPower => "log_power",
            SpectrogramMode::Complex => "complex",
        }
    }
}

impl fmt::Display for SpectrogramMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpectrogramMode {
    type Err = SpectrogramError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "magnitude" | "mag" => Ok(SpectrogramMode::Magnitude),
            "log" | "log_magnitude" => Ok(SpectrogramMode::Log),
            "power" => Ok(SpectrogramMode::Power),
            "log_power" => Ok(SpectrogramMode::LogPower),
            "complex" => Ok(SpectrogramMode::Complex),
            _ => Err(SpectrogramError::UnknownVariant {
                kind: "mode",
                value: value.to_string(),
            }),
        }
    }
}

/// Full extractor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorParams {
    /// Samples per analysis frame.
    pub frame_length: usize,
    /// Samples between successive frame starts.
    pub frame_step: usize,
    /// DFT length; frames shorter than this are zero-padded.
    pub fft_length: usize,
    /// Waveform padding policy.
    pub padding: Padding,
    /// Bin scaling.
    pub mode: SpectrogramMode,
    /// Frame weighting.
    pub window: WindowKind,
    /// Append a trailing singleton channel axis.
    pub expand_dims: bool,
    /// Expose the analysis filters as learnable parameters.
    pub trainable: bool,
    /// Added before taking logarithms in the log modes.
    pub eps: f32,
}

impl Default for ExtractorParams {
    fn default() -> Self {
        Self {
            frame_length: 320,
            frame_step: 80,
            fft_length: 512,
            padding: Padding::Same,
            mode: SpectrogramMode::Log,
            window: WindowKind::Hann,
            expand_dims: true,
            trainable: false,
            eps: DEFAULT_LOG_EPS,
        }
    }
}

impl ExtractorParams {
    /// Reject configurations that cannot produce a spectrogram.
    pub fn validate(&self) -> Result<(), SpectrogramError> {
        if self.frame_length == 0 {
            return Err(SpectrogramError::ZeroFrameLength);
        }
        if self.frame_step == 0 {
            return Err(SpectrogramError::ZeroFrameStep);
        }
        if self.fft_length < self.frame_length {
            return Err(SpectrogramError::FftTooShort {
                fft_length: self.fft_length,
                frame_length: self.frame_length,
            });
        }
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(SpectrogramError::InvalidEpsilon(self.eps));
        }
        Ok(())
    }

    /// Frequency bins per frame.
    pub fn num_bins(&self) -> usize {
        self.fft_length / 2 + 1
    }

    /// Frames produced for a signal of `num_samples`.
    pub fn num_frames(&self, num_samples: usize) -> usize {
        self.frame_plan(num_samples).num_frames
    }

    /// Padding and frame count for a signal of `num_samples`.
    pub fn frame_plan(&self, num_samples: usize) -> FramePlan {
        frame_plan(num_samples, self.frame_length, self.frame_step, self.padding)
    }

    /// Sibling configuration analysing a different bandwidth.
    ///
    /// Step, FFT length and padding are kept so outputs stay stackable.
    pub fn with_frame_length(&self, frame_length: usize) -> Self {
        Self {
            frame_length,
            ..self.clone()
        }
    }
}
