//! Loop sample storage and region addressing
//!
//! The loop lives in one fixed-capacity buffer allocated at setup. The active
//! loop is a [`LoopRegion`] window into it, addressed with wraparound so a
//! region may start near the end of the buffer and continue at index 0.
//!
//! Every raw index is folded through [`SampleBuffer::wrap`]; nothing else in the
//! crate computes `index % capacity` on its own.

use std::ops::Range;

use crate::error::{LooperError, LooperResult};
use crate::types::Sample;

/// Active loop window: `length` samples starting at `start`
///
/// `length` is always at least 1. Offsets are taken modulo the buffer
/// capacity, so `start + length` may exceed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopRegion {
    start: usize,
    length: usize,
}

impl Default for LoopRegion {
    fn default() -> Self {
        Self { start: 0, length: 1 }
    }
}

impl LoopRegion {
    /// Create a region, clamping the length to at least one sample
    pub fn new(start: usize, length: usize) -> Self {
        Self {
            start,
            length: length.max(1),
        }
    }

    /// Create a region from an inclusive `[start, end]` sample range
    ///
    /// Returns `None` when `end < start`. The length saturates at `usize::MAX`.
    pub fn from_inclusive(start: usize, end: usize) -> Option<Self> {
        if end < start {
            return None;
        }
        Some(Self::new(start, (end - start).saturating_add(1)))
    }

    /// First sample of the region (buffer index before wrapping)
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of samples in the region
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Inclusive end sample (buffer index before wrapping)
    #[inline]
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.length - 1)
    }
}

/// Fixed-capacity, zero-initialised sample storage
///
/// Allocated once and never resized. Capacity is guaranteed non-zero.
#[derive(Debug)]
pub struct SampleBuffer {
    samples: Box<[Sample]>,
}

impl SampleBuffer {
    /// Take ownership of a caller-provided buffer and zero it
    pub fn new(samples: Vec<Sample>) -> LooperResult<Self> {
        if samples.is_empty() {
            return Err(LooperError::EmptyBuffer);
        }
        let mut samples = samples.into_boxed_slice();
        samples.fill(0.0);
        Ok(Self { samples })
    }

    /// Allocate a silent buffer of the given capacity
    pub fn silence(capacity: usize) -> LooperResult<Self> {
        Self::new(vec![0.0; capacity])
    }

    /// Number of samples the buffer holds
    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Fold any raw index into `[0, capacity)`
    #[inline]
    pub fn wrap(&self, index: usize) -> usize {
        index % self.samples.len()
    }

    /// Read a sample at a wrapped index
    #[inline]
    pub fn get(&self, index: usize) -> Sample {
        self.samples[self.wrap(index)]
    }

    /// Write a sample at a wrapped index
    #[inline]
    pub fn set(&mut self, index: usize, value: Sample) {
        let idx = self.wrap(index);
        self.samples[idx] = value;
    }

    /// Buffer index of `offset` samples into `region`
    #[inline]
    pub fn region_index(&self, region: &LoopRegion, offset: usize) -> usize {
        self.wrap(region.start + offset)
    }

    /// Raw view of the whole buffer
    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    /// Zero the whole buffer
    pub fn clear(&mut self) {
        crate::dsp::clear(&mut self.samples);
    }

    /// Copy the region's content into the front of `dest`
    ///
    /// Copies `min(region length, capacity, dest.len())` samples.
    pub fn copy_region_into(&self, region: &LoopRegion, dest: &mut [Sample]) {
        let (head, tail) = self.region_runs(region, dest.len());
        let split = head.len();
        let total = split + tail.len();
        dest[..split].copy_from_slice(&self.samples[head]);
        dest[split..total].copy_from_slice(&self.samples[tail]);
    }

    /// Overwrite the region with the front of `src`
    ///
    /// Writes `min(region length, capacity, src.len())` samples.
    pub fn write_region_from(&mut self, region: &LoopRegion, src: &[Sample]) {
        let (head, tail) = self.region_runs(region, src.len());
        let split = head.len();
        let total = split + tail.len();
        self.samples[head].copy_from_slice(&src[..split]);
        self.samples[tail].copy_from_slice(&src[split..total]);
    }

    /// Zero the samples covered by the region
    pub fn clear_region(&mut self, region: &LoopRegion) {
        let (head, tail) = self.region_runs(region, usize::MAX);
        crate::dsp::clear(&mut self.samples[head]);
        crate::dsp::clear(&mut self.samples[tail]);
    }

    /// Exchange the region's content with the front of `slot`
    ///
    /// Swapping (rather than copying) leaves the replaced loop content in the
    /// slot, so the same slot can restore it later.
    pub fn swap_region(&mut self, region: &LoopRegion, slot: &mut [Sample]) {
        let (head, tail) = self.region_runs(region, slot.len());
        let split = head.len();
        let total = split + tail.len();
        self.samples[head].swap_with_slice(&mut slot[..split]);
        self.samples[tail].swap_with_slice(&mut slot[split..total]);
    }

    /// Split a region into at most two contiguous runs of the buffer
    fn region_runs(&self, region: &LoopRegion, limit: usize) -> (Range<usize>, Range<usize>) {
        let capacity = self.capacity();
        let start = self.wrap(region.start);
        let len = region.length.min(capacity).min(limit);
        let head = len.min(capacity - start);
        (start..start + head, 0..len - head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(capacity: usize) -> SampleBuffer {
        let mut buffer = SampleBuffer::silence(capacity).unwrap();
        for i in 0..capacity {
            buffer.set(i, i as f32);
        }
        buffer
    }

    #[test]
    fn test_empty_buffer_rejected() {
        assert_eq!(SampleBuffer::new(Vec::new()).unwrap_err(), LooperError::EmptyBuffer);
    }

    #[test]
    fn test_new_zeroes_content() {
        let buffer = SampleBuffer::new(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(buffer.as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_wrap_and_region_index() {
        let buffer = SampleBuffer::silence(10).unwrap();
        assert_eq!(buffer.wrap(9), 9);
        assert_eq!(buffer.wrap(10), 0);
        assert_eq!(buffer.wrap(23), 3);

        let region = LoopRegion::new(8, 4);
        assert_eq!(buffer.region_index(&region, 0), 8);
        assert_eq!(buffer.region_index(&region, 2), 0);
        assert_eq!(buffer.region_index(&region, 3), 1);
    }

    #[test]
    fn test_region_from_inclusive() {
        let region = LoopRegion::from_inclusive(2, 6).unwrap();
        assert_eq!(region.start(), 2);
        assert_eq!(region.length(), 5);
        assert_eq!(region.end(), 6);

        assert_eq!(LoopRegion::from_inclusive(3, 3).unwrap().length(), 1);
        assert!(LoopRegion::from_inclusive(4, 3).is_none());
        assert_eq!(LoopRegion::new(0, 0).length(), 1);
    }

    #[test]
    fn test_region_from_inclusive_full_range() {
        let region = LoopRegion::from_inclusive(0, usize::MAX).unwrap();
        assert_eq!(region.length(), usize::MAX);
        assert_eq!(region.end(), usize::MAX - 1);

        let region = LoopRegion::from_inclusive(5, usize::MAX).unwrap();
        assert_eq!(region.length(), usize::MAX - 4);
        assert_eq!(region.end(), usize::MAX);
    }

    #[test]
    fn test_copy_wrapping_region() {
        let buffer = ramp(10);
        let region = LoopRegion::new(8, 4);
        let mut dest = [0.0; 10];
        buffer.copy_region_into(&region, &mut dest);
        assert_eq!(&dest[..4], &[8.0, 9.0, 0.0, 1.0]);
        assert_eq!(dest[4], 0.0);
    }

    #[test]
    fn test_swap_region_twice_restores() {
        let mut buffer = ramp(10);
        let region = LoopRegion::new(7, 5);
        let mut slot = [-1.0; 10];

        buffer.swap_region(&region, &mut slot);
        assert_eq!(buffer.get(7), -1.0);
        assert_eq!(buffer.get(1), -1.0);
        assert_eq!(buffer.get(2), 2.0);
        assert_eq!(&slot[..5], &[7.0, 8.0, 9.0, 0.0, 1.0]);

        buffer.swap_region(&region, &mut slot);
        assert_eq!(buffer.as_slice(), ramp(10).as_slice());
    }

    #[test]
    fn test_write_and_clear_wrapping_region() {
        let mut buffer = ramp(10);
        let region = LoopRegion::new(8, 4);

        buffer.write_region_from(&region, &[-1.0, -2.0, -3.0, -4.0, -5.0]);
        assert_eq!(buffer.get(8), -1.0);
        assert_eq!(buffer.get(9), -2.0);
        assert_eq!(buffer.get(0), -3.0);
        assert_eq!(buffer.get(1), -4.0);
        assert_eq!(buffer.get(2), 2.0);

        buffer.clear_region(&region);
        assert_eq!(&buffer.as_slice()[..3], &[0.0, 0.0, 2.0]);
        assert_eq!(&buffer.as_slice()[7..], &[7.0, 0.0, 0.0]);
    }

    #[test]
    fn test_region_longer_than_capacity_is_capped() {
        let buffer = ramp(4);
        let region = LoopRegion::new(2, 9);
        let mut dest = [0.0; 8];
        buffer.copy_region_into(&region, &mut dest);
        assert_eq!(&dest[..4], &[2.0, 3.0, 0.0, 1.0]);
        assert_eq!(&dest[4..], &[0.0; 4]);
    }
}
