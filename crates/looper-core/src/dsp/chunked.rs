//! Lane-chunked backend
//!
//! Processes fixed-width chunks with independent accumulators so the loop
//! bodies have no cross-iteration dependency and vectorize cleanly.
//! Results can differ from the scalar backend in the last bits of RMS
//! because the summation order differs.

use super::DspBackend;
use crate::types::Sample;

/// Chunk width (8 × f32 = one 256-bit register)
const LANES: usize = 8;

/// Fixed-width lane backend, selected by the `vectorized` feature
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkedBackend;

impl DspBackend for ChunkedBackend {
    fn mix_with_gain(dest: &mut [Sample], src: &[Sample], gain: Sample) {
        let len = dest.len().min(src.len());
        let mut dest_chunks = dest[..len].chunks_exact_mut(LANES);
        let mut src_chunks = src[..len].chunks_exact(LANES);
        for (d, s) in (&mut dest_chunks).zip(&mut src_chunks) {
            for lane in 0..LANES {
                d[lane] += s[lane] * gain;
            }
        }
        for (d, s) in dest_chunks.into_remainder().iter_mut().zip(src_chunks.remainder()) {
            *d += *s * gain;
        }
    }

    fn copy_with_gain(dest: &mut [Sample], src: &[Sample], gain: Sample) {
        let len = dest.len().min(src.len());
        let mut dest_chunks = dest[..len].chunks_exact_mut(LANES);
        let mut src_chunks = src[..len].chunks_exact(LANES);
        for (d, s) in (&mut dest_chunks).zip(&mut src_chunks) {
            for lane in 0..LANES {
                d[lane] = s[lane] * gain;
            }
        }
        for (d, s) in dest_chunks.into_remainder().iter_mut().zip(src_chunks.remainder()) {
            *d = *s * gain;
        }
    }

    fn rms(buffer: &[Sample]) -> Sample {
        if buffer.is_empty() {
            return 0.0;
        }
        let chunks = buffer.chunks_exact(LANES);
        let remainder = chunks.remainder();
        let mut acc = [0.0 as Sample; LANES];
        for chunk in chunks {
            for lane in 0..LANES {
                acc[lane] += chunk[lane] * chunk[lane];
            }
        }
        let sum_squares: Sample =
            acc.iter().sum::<Sample>() + remainder.iter().map(|s| s * s).sum::<Sample>();
        (sum_squares / buffer.len() as Sample).sqrt()
    }

    fn peak(buffer: &[Sample]) -> Sample {
        let chunks = buffer.chunks_exact(LANES);
        let remainder = chunks.remainder();
        let mut acc = [0.0 as Sample; LANES];
        for chunk in chunks {
            for lane in 0..LANES {
                acc[lane] = acc[lane].max(chunk[lane].abs());
            }
        }
        remainder
            .iter()
            .fold(acc.iter().fold(0.0, |p: Sample, a| p.max(*a)), |p, s| p.max(s.abs()))
    }
}
