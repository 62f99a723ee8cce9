//! DSP primitives - stateless operations over sample spans
//!
//! Everything here works on borrowed slices and owns no buffers:
//! - Gain mix/copy, RMS, peak and clear go through a [`DspBackend`]
//! - Fades, crossfades, soft clipping and interpolation are plain functions
//!
//! # Backends
//!
//! The bulk math is behind the [`DspBackend`] trait so an accelerated
//! implementation can be swapped in at build time:
//! - [`ScalarBackend`]: straightforward per-sample loops (default)
//! - [`ChunkedBackend`]: fixed-width lane accumulation the compiler can
//!   auto-vectorize (selected with the `vectorized` feature)
//!
//! The free functions in this module always dispatch to [`DefaultBackend`].

mod chunked;
mod scalar;

pub use chunked::ChunkedBackend;
pub use scalar::ScalarBackend;

use crate::types::{Sample, MAX_PITCH_SEMITONES, SOFT_CLIP_DRIVE};

/// Bulk buffer math with portable default bodies
///
/// Implementors override whichever operations they can accelerate; anything
/// left alone falls back to the scalar loop.
pub trait DspBackend {
    /// `dest[i] += src[i] * gain` over the common length
    fn mix_with_gain(dest: &mut [Sample], src: &[Sample], gain: Sample) {
        for (d, s) in dest.iter_mut().zip(src) {
            *d += *s * gain;
        }
    }

    /// `dest[i] = src[i] * gain` over the common length
    fn copy_with_gain(dest: &mut [Sample], src: &[Sample], gain: Sample) {
        for (d, s) in dest.iter_mut().zip(src) {
            *d = *s * gain;
        }
    }

    /// Root mean square of the span (0.0 when empty)
    fn rms(buffer: &[Sample]) -> Sample {
        if buffer.is_empty() {
            return 0.0;
        }
        let sum_squares: Sample = buffer.iter().map(|s| s * s).sum();
        (sum_squares / buffer.len() as Sample).sqrt()
    }

    /// Largest absolute value in the span (0.0 when empty)
    fn peak(buffer: &[Sample]) -> Sample {
        buffer.iter().fold(0.0, |peak: Sample, s| peak.max(s.abs()))
    }

    /// Zero the span
    fn clear(buffer: &mut [Sample]) {
        buffer.fill(0.0);
    }
}

/// Backend used by the free functions of this module
#[cfg(not(feature = "vectorized"))]
pub type DefaultBackend = ScalarBackend;

/// Backend used by the free functions of this module
#[cfg(feature = "vectorized")]
pub type DefaultBackend = ChunkedBackend;

/// Mix `src` into `dest` with a gain: `dest += src * gain`
#[inline]
pub fn mix_with_gain(dest: &mut [Sample], src: &[Sample], gain: Sample) {
    DefaultBackend::mix_with_gain(dest, src, gain);
}

/// Copy `src` into `dest` with a gain: `dest = src * gain`
#[inline]
pub fn copy_with_gain(dest: &mut [Sample], src: &[Sample], gain: Sample) {
    DefaultBackend::copy_with_gain(dest, src, gain);
}

/// Root mean square level of a span
#[inline]
pub fn rms(buffer: &[Sample]) -> Sample {
    DefaultBackend::rms(buffer)
}

/// Peak absolute level of a span
#[inline]
pub fn peak(buffer: &[Sample]) -> Sample {
    DefaultBackend::peak(buffer)
}

/// Zero a span
#[inline]
pub fn clear(buffer: &mut [Sample]) {
    DefaultBackend::clear(buffer);
}

/// Apply a linear fade in place
///
/// The fade factor runs from 0 to 1 (fade in) or 1 to 0 (fade out) across
/// the span, hitting both end points exactly. Spans shorter than two samples
/// have no ramp and are left untouched.
pub fn apply_linear_fade(buffer: &mut [Sample], fade_in: bool) {
    if buffer.len() < 2 {
        return;
    }
    let last = (buffer.len() - 1) as Sample;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let ramp = i as Sample / last;
        let factor = if fade_in { ramp } else { 1.0 - ramp };
        *sample *= factor;
    }
}

/// tanh soft clipper: `tanh(x * k) / k`
#[inline]
pub fn soft_clip(x: Sample) -> Sample {
    (x * SOFT_CLIP_DRIVE).tanh() / SOFT_CLIP_DRIVE
}

/// Soft clip a span in place, shaping only samples above `threshold`
///
/// `threshold` doubles as the drive constant, so `soft_clip_buffer(buf,
/// SOFT_CLIP_DRIVE)` matches [`soft_clip`] for every shaped sample.
/// Non-positive thresholds leave the span untouched.
pub fn soft_clip_buffer(buffer: &mut [Sample], threshold: Sample) {
    if threshold <= 0.0 {
        return;
    }
    let inv_threshold = 1.0 / threshold;
    for sample in buffer.iter_mut() {
        if sample.abs() > threshold {
            *sample = (*sample * threshold).tanh() * inv_threshold;
        }
    }
}

/// Linear crossfade from `a` to `b` into `dest`
///
/// Weight of `a` falls from 1 to 0 across the common length. A single sample
/// span takes `a` unchanged.
pub fn crossfade(a: &[Sample], b: &[Sample], dest: &mut [Sample]) {
    let len = a.len().min(b.len()).min(dest.len());
    if len == 0 {
        return;
    }
    if len == 1 {
        dest[0] = a[0];
        return;
    }
    let last = (len - 1) as Sample;
    for i in 0..len {
        let fade = i as Sample / last;
        dest[i] = a[i] * (1.0 - fade) + b[i] * fade;
    }
}

/// Blend a loop's tail into its head across the common length
///
/// `dest[i] = head[i] * i/len + tail[i] * (1 - i/len)`: the first sample is
/// pure tail and the head never reaches full weight, so the sample after the
/// window continues the head unchanged.
pub fn seam_blend(head: &[Sample], tail: &[Sample], dest: &mut [Sample]) {
    let len = head.len().min(tail.len()).min(dest.len());
    if len == 0 {
        return;
    }
    let inv_len = 1.0 / len as Sample;
    for i in 0..len {
        let fade = i as Sample * inv_len;
        dest[i] = head[i] * fade + tail[i] * (1.0 - fade);
    }
}

/// Linear interpolation at a fractional position, clamped to the span ends
///
/// No wraparound: positions at or past the last sample return the last
/// sample, positions at or before 0 return the first. Empty spans read 0.0.
pub fn linear_interpolate(buffer: &[Sample], position: f32) -> Sample {
    let Some(&last) = buffer.last() else {
        return 0.0;
    };
    if position >= (buffer.len() - 1) as f32 {
        return last;
    }
    if position <= 0.0 {
        return buffer[0];
    }
    let index = position as usize;
    let frac = position - index as f32;
    buffer[index] + frac * (buffer[index + 1] - buffer[index])
}

/// Read a span back to front: position 0 reads the last sample
///
/// Positions past the end read the first sample. Empty spans read 0.0.
pub fn reverse_read(buffer: &[Sample], position: usize) -> Sample {
    if buffer.is_empty() {
        return 0.0;
    }
    let index = buffer.len() - 1 - position.min(buffer.len() - 1);
    buffer[index]
}

/// Gain ratio used for the gain-based pitch control
///
/// `2^(semitones / 12)`, with semitones clamped to ±12.
#[inline]
pub fn pitch_ratio(semitones: f32) -> Sample {
    let semitones = semitones.clamp(-MAX_PITCH_SEMITONES, MAX_PITCH_SEMITONES);
    2.0_f32.powf(semitones / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn test_mix_and_copy_with_gain() {
        let mut dest = [1.0, 1.0, 1.0];
        mix_with_gain(&mut dest, &[1.0, 2.0, 3.0], 0.5);
        assert_eq!(dest, [1.5, 2.0, 2.5]);

        copy_with_gain(&mut dest, &[1.0, -2.0, 4.0], 0.25);
        assert_eq!(dest, [0.25, -0.5, 1.0]);
    }

    #[test]
    fn test_mix_uses_common_length() {
        let mut dest = [0.0; 4];
        mix_with_gain(&mut dest, &[1.0, 1.0], 2.0);
        assert_eq!(dest, [2.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rms_and_peak() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(peak(&[]), 0.0);
        assert!((rms(&[1.0, -1.0, 1.0, -1.0]) - 1.0).abs() < EPS);
        assert!((rms(&[3.0, 4.0]) - (12.5_f32).sqrt()).abs() < EPS);
        assert_eq!(peak(&[0.2, -0.9, 0.5]), 0.9);
    }

    #[test]
    fn test_clear() {
        let mut buffer = [0.3, -0.1, 1.0];
        clear(&mut buffer);
        assert_eq!(buffer, [0.0; 3]);
    }

    #[test]
    fn test_linear_fade_in_and_out() {
        let mut up = [1.0; 5];
        apply_linear_fade(&mut up, true);
        assert_eq!(up, [0.0, 0.25, 0.5, 0.75, 1.0]);

        let mut down = [2.0; 3];
        apply_linear_fade(&mut down, false);
        assert_eq!(down, [2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_linear_fade_short_spans_untouched() {
        let mut one = [0.8];
        apply_linear_fade(&mut one, true);
        assert_eq!(one, [0.8]);
        apply_linear_fade(&mut [], false);
    }

    #[test]
    fn test_soft_clip_bounds_and_small_signal() {
        // Output can never exceed 1/k in magnitude
        let ceiling = 1.0 / SOFT_CLIP_DRIVE;
        for x in [-100.0, -3.0, 3.0, 100.0] {
            assert!(soft_clip(x).abs() <= ceiling + EPS);
        }
        // Near zero the clipper is almost transparent
        assert!((soft_clip(0.01) - 0.01).abs() < 1e-4);
        assert_eq!(soft_clip(0.0), 0.0);
        assert!((soft_clip(-0.5) + soft_clip(0.5)).abs() < EPS);
    }

    #[test]
    fn test_soft_clip_buffer_only_shapes_loud_samples() {
        let mut buffer = [0.5, 2.0, -2.0];
        soft_clip_buffer(&mut buffer, SOFT_CLIP_DRIVE);
        assert_eq!(buffer[0], 0.5);
        assert!((buffer[1] - soft_clip(2.0)).abs() < EPS);
        assert!((buffer[2] - soft_clip(-2.0)).abs() < EPS);
    }

    #[test]
    fn test_crossfade() {
        let a = [1.0; 3];
        let b = [0.0; 3];
        let mut dest = [9.0; 3];
        crossfade(&a, &b, &mut dest);
        assert_eq!(dest, [1.0, 0.5, 0.0]);

        let mut single = [0.0];
        crossfade(&[0.7], &[0.1], &mut single);
        assert_eq!(single, [0.7]);
    }

    #[test]
    fn test_seam_blend() {
        let head = [1.0; 4];
        let tail = [0.0; 4];
        let mut dest = [9.0; 4];
        seam_blend(&head, &tail, &mut dest);
        assert_eq!(dest, [0.0, 0.25, 0.5, 0.75]);

        // Shortest input bounds the blend
        let mut dest = [9.0; 4];
        seam_blend(&[2.0, 2.0], &[4.0; 4], &mut dest);
        assert_eq!(dest, [4.0, 3.0, 9.0, 9.0]);
    }

    #[test]
    fn test_linear_interpolate_clamps() {
        let buffer = [0.0, 1.0, 3.0];
        assert_eq!(linear_interpolate(&buffer, -1.0), 0.0);
        assert_eq!(linear_interpolate(&buffer, 0.5), 0.5);
        assert_eq!(linear_interpolate(&buffer, 1.5), 2.0);
        assert_eq!(linear_interpolate(&buffer, 2.0), 3.0);
        assert_eq!(linear_interpolate(&buffer, 10.0), 3.0);
        assert_eq!(linear_interpolate(&[], 0.5), 0.0);
        assert_eq!(linear_interpolate(&[4.0], 0.5), 4.0);
    }

    #[test]
    fn test_reverse_read() {
        let buffer = [1.0, 2.0, 3.0];
        assert_eq!(reverse_read(&buffer, 0), 3.0);
        assert_eq!(reverse_read(&buffer, 2), 1.0);
        assert_eq!(reverse_read(&buffer, 7), 1.0);
        assert_eq!(reverse_read(&[], 0), 0.0);
    }

    #[test]
    fn test_pitch_ratio() {
        assert!((pitch_ratio(0.0) - 1.0).abs() < EPS);
        assert!((pitch_ratio(12.0) - 2.0).abs() < EPS);
        assert!((pitch_ratio(-12.0) - 0.5).abs() < EPS);
        assert!((pitch_ratio(48.0) - 2.0).abs() < EPS);
    }
}
