use ndarray::ArrayView1;

use super::Padding;

/// Frame count and zero padding applied around one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// Number of analysis frames.
    pub num_frames: usize,
    /// Zeros inserted before the first sample.
    pub pad_before: usize,
    /// Zeros appended after the last sample.
    pub pad_after: usize,
}

/// Compute the frame layout for a signal.
///
/// `Valid` keeps only whole frames. `Same` produces `ceil(num_samples /
/// frame_step)` frames and splits the required zeros with the smaller half
/// in front, matching strided-convolution `same` padding.
pub fn frame_plan(
    num_samples: usize,
    frame_length: usize,
    frame_step: usize,
    padding: Padding,
) -> FramePlan {
    let frame_step = frame_step.max(1);
    match padding {
        Padding::Valid => FramePlan {
            num_frames: if num_samples < frame_length || frame_length == 0 {
                0
            } else {
                (num_samples - frame_length) / frame_step + 1
            },
            pad_before: 0,
            pad_after: 0,
        },
        Padding::Same => {
            let num_frames = num_samples.div_ceil(frame_step);
            if num_frames == 0 {
                return FramePlan {
                    num_frames,
                    pad_before: 0,
                    pad_after: 0,
                };
            }
            let needed = (num_frames - 1) * frame_step + frame_length;
            let total = needed.saturating_sub(num_samples);
            let pad_before = total / 2;
            FramePlan {
                num_frames,
                pad_before,
                pad_after: total - pad_before,
            }
        }
    }
}

/// Copy `samples` into a zero-padded buffer, zeroing non-finite values.
///
/// Returns the buffer and the number of samples that had to be sanitized.
pub(super) fn padded_signal(samples: ArrayView1<'_, f32>, plan: &FramePlan) -> (Vec<f32>, usize) {
    let mut out = Vec::with_capacity(plan.pad_before + samples.len() + plan.pad_after);
    let mut replaced = 0usize;
    out.resize(plan.pad_before, 0.0);
    for &sample in samples.iter() {
        if sample.is_finite() {
            out.push(sample);
        } else {
            replaced += 1;
            out.push(0.0);
        }
    }
    out.resize(out.len() + plan.pad_after, 0.0);
    (out, replaced)
}
