use thiserror::Error;

/// Errors raised while configuring or running spectrogram extraction.
#[derive(Debug, Error)]
pub enum SpectrogramError {
    /// `frame_length` was zero.
    #[error("frame_length must be positive")]
    ZeroFrameLength,
    /// `frame_step` was zero.
    #[error("frame_step must be positive")]
    ZeroFrameStep,
    /// The FFT is too short to hold one analysis frame.
    #[error("fft_length {fft_length} is shorter than frame_length {frame_length}")]
    FftTooShort {
        /// Requested FFT length.
        fft_length: usize,
        /// Requested frame length.
        frame_length: usize,
    },
    /// Log compression epsilon was zero, negative or non-finite.
    #[error("eps must be positive and finite, got {0}")]
    InvalidEpsilon(f32),
    /// Dynamic-rank input was not `(batch, num_samples, channels)`.
    #[error("expected input rank 3 (batch, num_samples, channels), got rank {0}")]
    InputRank(usize),
    /// Input carried more or fewer than one channel.
    #[error("expected 1 input channel, got {0}")]
    ChannelCount(usize),
    /// The tensor layer cannot emit an empty frame axis.
    #[error("{num_samples} samples yield no frames of length {frame_length}")]
    NoFrames {
        /// Samples in each input signal.
        num_samples: usize,
        /// Analysis frame length.
        frame_length: usize,
    },
    /// Attempted to update fixed analysis filters.
    #[error("analysis filters are fixed; build them as trainable to update them")]
    FiltersFrozen,
    /// Parameters and filters disagree on whether the filters train.
    #[error("extractor requested trainable={requested} but filters are trainable={actual}")]
    FilterInitMismatch {
        /// `trainable` from the extractor parameters.
        requested: bool,
        /// Whether the supplied filters are trainable.
        actual: bool,
    },
    /// Filter coefficients did not match `(frame_length, num_bins)`.
    #[error("filter shape mismatch: expected {expected:?}, got {actual:?}")]
    FilterShape {
        /// Expected `(frame_length, num_bins)`.
        expected: (usize, usize),
        /// Shape that was supplied.
        actual: (usize, usize),
    },
    /// Filter coefficients contained NaN or infinity.
    #[error("filter coefficients must be finite")]
    NonFiniteFilters,
    /// `stack_channels` was called with nothing to stack.
    #[error("cannot stack an empty list of spectrograms")]
    EmptyStack,
    /// Complex spectrograms have no single real channel to stack.
    #[error("complex spectrograms cannot be stacked as channels")]
    ComplexStack,
    /// Complex output has no layout without a channel axis.
    #[error("complex output needs a trailing channel axis")]
    ComplexFlat,
    /// A spectrogram disagreed with the first one in a stack.
    #[error("spectrogram {index} cannot be stacked with the first: {reason}")]
    StackMismatch {
        /// Position of the offending spectrogram.
        index: usize,
        /// Which property differed.
        reason: String,
    },
    /// A textual option did not name a known variant.
    #[error("unknown {kind} '{value}'")]
    UnknownVariant {
        /// Option family, e.g. `padding`.
        kind: &'static str,
        /// Value that failed to parse.
        value: String,
    },
    /// Tensor contents could not be read back from the backend.
    #[error("tensor data error: {0}")]
    TensorData(String),
    /// Array reshaping failed.
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
