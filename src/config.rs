//! TOML settings for the `specgram` tool.
//!
//! Settings live in `specgram.toml` inside the application directory. A
//! missing file yields defaults; values are normalized on load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs::{self, AppDirError};
use crate::spectrogram::{ExtractorParams, SpectrogramError};

/// File name of the settings file inside the app directory.
pub const CONFIG_FILE_NAME: &str = "specgram.toml";
/// Rate waveforms are resampled to when nothing else is configured.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Errors raised while loading, saving or applying settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The application directory could not be prepared.
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    /// Failed to read the settings file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to write the settings file.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The settings file was not valid TOML for [`Settings`].
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// Settings could not be serialized.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML serialization error.
        source: toml::ser::Error,
    },
    /// Extractor settings did not describe a usable configuration.
    #[error("Invalid extractor settings: {0}")]
    Extractor(#[from] SpectrogramError),
}

/// Audio preparation ahead of extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Rate every input is resampled to.
    pub sample_rate: u32,
    /// Fixed clip length; inputs are zero-padded or truncated to it.
    pub clip_seconds: Option<f32>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            clip_seconds: None,
        }
    }
}

/// Everything stored in `specgram.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Additional frame lengths stacked as channels after the base one.
    pub extra_frame_lengths: Vec<usize>,
    pub audio: AudioSettings,
    pub extractor: ExtractorParams,
}

impl Settings {
    /// Clamp out-of-range values and drop duplicate bandwidths.
    pub fn normalized(mut self) -> Self {
        if self.audio.sample_rate == 0 {
            self.audio.sample_rate = DEFAULT_SAMPLE_RATE;
        }
        self.audio.clip_seconds = self
            .audio
            .clip_seconds
            .filter(|seconds| seconds.is_finite() && *seconds > 0.0);
        let base = self.extractor.frame_length;
        let mut seen = vec![base];
        self.extra_frame_lengths.retain(|&length| {
            if length == 0 || seen.contains(&length) {
                return false;
            }
            seen.push(length);
            true
        });
        self
    }

    /// Validated extractor parameters for the base bandwidth.
    pub fn extractor_params(&self) -> Result<ExtractorParams, ConfigError> {
        self.extractor.validate()?;
        Ok(self.extractor.clone())
    }

    /// Base parameters followed by one sibling per extra frame length.
    ///
    /// Siblings share step, FFT length and padding, so their outputs stack.
    pub fn bandwidth_params(&self) -> Result<Vec<ExtractorParams>, ConfigError> {
        let base = self.extractor_params()?;
        let mut all = Vec::with_capacity(1 + self.extra_frame_lengths.len());
        for &frame_length in &self.extra_frame_lengths {
            let sibling = base.with_frame_length(frame_length);
            sibling.validate()?;
            all.push(sibling);
        }
        all.insert(0, base);
        Ok(all)
    }

    /// Fixed clip length in samples, if one is configured.
    pub fn clip_samples(&self) -> Option<usize> {
        self.audio
            .clip_seconds
            .map(|seconds| crate::audio::clip_samples(seconds, self.audio.sample_rate))
    }
}

/// Path of `specgram.toml`, creating the app directory if needed.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load settings from the default location, or defaults if absent.
pub fn load_or_default() -> Result<Settings, ConfigError> {
    load_settings_from(&config_path()?)
}

/// Load settings from `path`; a missing file yields defaults.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<Settings>(&text)
        .map(Settings::normalized)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `settings` to `path` as TOML, creating parent directories.
pub fn save_settings_to_path(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        app_dirs::ensure_dir(parent.to_path_buf())?;
    }
    let text = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, text).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrogram::{Padding, SpectrogramMode, WindowKind};
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.audio.sample_rate, 16_000);
        assert_eq!(settings.extractor.frame_length, 320);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "extra_frame_lengths = [160, 320, 0, 160]\n\n[audio]\nclip_seconds = 5.0\n\n\
             [extractor]\nmode = \"log_power\"\npadding = \"valid\"\nwindow = \"hamming\"\n",
        )
        .unwrap();
        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.audio.sample_rate, 16_000);
        assert_eq!(settings.clip_samples(), Some(80_000));
        assert_eq!(settings.extractor.mode, SpectrogramMode::LogPower);
        assert_eq!(settings.extractor.padding, Padding::Valid);
        assert_eq!(settings.extractor.window, WindowKind::Hamming);
        assert_eq!(settings.extractor.frame_step, 80);
        assert_eq!(settings.extra_frame_lengths, vec![160]);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut settings = Settings::default();
        settings.audio.clip_seconds = Some(2.5);
        settings.extractor.trainable = true;
        settings.extra_frame_lengths = vec![400];
        save_settings_to_path(&settings, &path).unwrap();
        assert_eq!(load_settings_from(&path).unwrap(), settings);
    }

    #[test]
    fn mode_accepts_the_hyphenated_cli_spelling() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[extractor]\nmode = \"log-power\"\n").unwrap();
        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.extractor.mode, SpectrogramMode::LogPower);
        assert_eq!("log-power".parse::<SpectrogramMode>().unwrap(), settings.extractor.mode);
    }

    #[test]
    fn malformed_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[extractor]\nmode = \"loud\"\n").unwrap();
        let err = load_settings_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn normalized_discards_bad_audio_values() {
        let settings = Settings {
            audio: AudioSettings {
                sample_rate: 0,
                clip_seconds: Some(-3.0),
            },
            ..Settings::default()
        }
        .normalized();
        assert_eq!(settings.audio.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(settings.clip_samples(), None);
    }

    #[test]
    fn bandwidth_params_share_step_and_fft() {
        let settings = Settings {
            extra_frame_lengths: vec![160, 480],
            ..Settings::default()
        };
        let params = settings.bandwidth_params().unwrap();
        let lengths: Vec<usize> = params.iter().map(|p| p.frame_length).collect();
        assert_eq!(lengths, vec![320, 160, 480]);
        assert!(params.iter().all(|p| p.fft_length == 512 && p.frame_step == 80));

        let too_wide = Settings {
            extra_frame_lengths: vec![1024],
            ..Settings::default()
        };
        assert!(matches!(
            too_wide.bandwidth_params(),
            Err(ConfigError::Extractor(SpectrogramError::FftTooShort { .. }))
        ));
    }
}
