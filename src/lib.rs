//! STFT spectrogram extraction for batched waveforms.
/// Application directory resolution.
pub mod app_dirs;
/// WAV decoding, resampling and batching.
pub mod audio;
/// TOML settings.
pub mod config;
/// Differentiable STFT layer for `burn` models.
pub mod layer;
/// Tracing subscriber setup.
pub mod logging;
/// Files-to-document extraction used by the CLI.
pub mod pipeline;
/// Core spectrogram extraction.
pub mod spectrogram;

pub use layer::StftLayer;
pub use spectrogram::{
    ExtractorParams, Padding, Spectrogram, SpectrogramError, SpectrogramExtractor,
    SpectrogramMode, WindowKind,
};
