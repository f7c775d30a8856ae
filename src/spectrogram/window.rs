use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SpectrogramError;

/// Weighting applied to each frame before the DFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Periodic Hann window, the usual choice for spectral analysis.
    #[default]
    Hann,
    /// Symmetric Hann window (zero at both edges).
    HannSymmetric,
    /// Periodic Hamming window.
    Hamming,
    /// No weighting.
    Rectangular,
}

impl WindowKind {
    /// Window coefficients of the given length.
    pub fn coefficients(self, length: usize) -> Vec<f32> {
        match self {
            WindowKind::Hann => cosine_window(length, length, 0.5, 0.5),
            WindowKind::HannSymmetric => {
                cosine_window(length, length.saturating_sub(1), 0.5, 0.5)
            }
            WindowKind::Hamming => cosine_window(length, length, 0.54, 0.46),
            WindowKind::Rectangular => vec![1.0_f32; length],
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            WindowKind::Hann => "hann",
            WindowKind::HannSymmetric => "hann_symmetric",
            WindowKind::Hamming => "hamming",
            WindowKind::Rectangular => "rectangular",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowKind {
    type Err = SpectrogramError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "hann" | "hanning" => Ok(WindowKind::Hann),
            "hann_symmetric" => Ok(WindowKind::HannSymmetric),
            "hamming" => Ok(WindowKind::Hamming),
            "rectangular" | "boxcar" | "none" => Ok(WindowKind::Rectangular),
            _ => Err(SpectrogramError::UnknownVariant {
                kind: "window",
                value: value.to_string(),
            }),
        }
    }
}

/// `a - b * cos(2πn / denom)`; windows of one sample are unity.
fn cosine_window(length: usize, denom: usize, a: f32, b: f32) -> Vec<f32> {
    if length <= 1 || denom == 0 {
        return vec![1.0_f32; length];
    }
    let denom = denom as f32;
    (0..length)
        .map(|n| a - b * (2.0 * PI * n as f32 / denom).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_hann_is_zero_at_both_edges() {
        let w = WindowKind::HannSymmetric.coefficients(8);
        assert!(w[0].abs() < 1e-6);
        assert!(w[7].abs() < 1e-6);
        assert!((w[1] - w[6]).abs() < 1e-6);
    }

    #[test]
    fn periodic_hann_peaks_at_center() {
        let w = WindowKind::Hann.coefficients(8);
        assert!(w[0].abs() < 1e-6);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!((w[1] - w[7]).abs() < 1e-6);
    }

    #[test]
    fn single_sample_windows_are_unity() {
        for kind in [
            WindowKind::Hann,
            WindowKind::HannSymmetric,
            WindowKind::Hamming,
            WindowKind::Rectangular,
        ] {
            let w = kind.coefficients(1);
            assert_eq!(w, vec![1.0], "{kind}");
        }
    }

    #[test]
    fn names_parse_back() {
        for kind in [
            WindowKind::Hann,
            WindowKind::HannSymmetric,
            WindowKind::Hamming,
            WindowKind::Rectangular,
        ] {
            assert_eq!(kind.to_string().parse::<WindowKind>().unwrap(), kind);
        }
        assert!("triangle".parse::<WindowKind>().is_err());
    }
}
