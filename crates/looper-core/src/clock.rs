//! Tempo clock - beat/bar tracking and musical quantization
//!
//! Converts BPM and sample rate into sample lengths, keeps a per-sample beat
//! phase, and snaps arbitrary sample counts to the beat grid.
//!
//! All rounding is round-half-up on integer sample counts:
//! `((samples + spb / 2) / spb) * spb`.

use crate::types::{BEAT_TRIGGER_THRESHOLD, DEFAULT_BPM, DEFAULT_SAMPLE_RATE};

/// Time signature (numerator beats per bar, denominator note value)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

/// Sample-accurate tempo clock
#[derive(Debug, Clone)]
pub struct Clock {
    /// Tempo in beats per minute (> 0)
    bpm: f64,
    /// Sample rate in Hz (> 0)
    sample_rate: f64,
    /// Beats per bar / beat note value
    signature: TimeSignature,
    /// Derived: round(sample_rate * 60 / bpm)
    samples_per_beat: usize,
    /// Derived: samples_per_beat * numerator
    samples_per_bar: usize,
    /// Samples elapsed since the last beat boundary
    sample_in_beat: usize,
    /// Beat index inside the current bar (0..numerator)
    beat_in_bar: u8,
    /// Completed bars since the last reset
    bar_count: u64,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// 120 BPM, 4/4 at 48kHz
    pub fn new() -> Self {
        let mut clock = Self {
            bpm: DEFAULT_BPM,
            sample_rate: DEFAULT_SAMPLE_RATE as f64,
            signature: TimeSignature::default(),
            samples_per_beat: 0,
            samples_per_bar: 0,
            sample_in_beat: 0,
            beat_in_bar: 0,
            bar_count: 0,
        };
        clock.recalculate();
        clock
    }

    /// Set tempo; non-positive or non-finite values are ignored
    pub fn set_bpm(&mut self, bpm: f64) {
        if bpm <= 0.0 || !bpm.is_finite() {
            log::debug!("clock: ignoring bpm {}", bpm);
            return;
        }
        self.bpm = bpm;
        self.recalculate();
    }

    /// Set sample rate; non-positive or non-finite values are ignored
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if sample_rate <= 0.0 || !sample_rate.is_finite() {
            log::debug!("clock: ignoring sample rate {}", sample_rate);
            return;
        }
        self.sample_rate = sample_rate;
        self.recalculate();
    }

    /// Set time signature; zero in either part is ignored
    pub fn set_time_signature(&mut self, numerator: u8, denominator: u8) {
        if numerator == 0 || denominator == 0 {
            log::debug!("clock: ignoring time signature {}/{}", numerator, denominator);
            return;
        }
        self.signature = TimeSignature {
            numerator,
            denominator,
        };
        if self.beat_in_bar >= numerator {
            self.beat_in_bar = 0;
        }
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.samples_per_beat = (self.sample_rate * 60.0 / self.bpm).round() as usize;
        self.samples_per_bar = self.samples_per_beat * self.signature.numerator as usize;
    }

    /// Advance by one sample
    #[inline]
    pub fn tick(&mut self) {
        self.sample_in_beat += 1;
        if self.samples_per_beat > 0 && self.sample_in_beat >= self.samples_per_beat {
            self.sample_in_beat = 0;
            self.beat_in_bar += 1;
            if self.beat_in_bar >= self.signature.numerator {
                self.beat_in_bar = 0;
                self.bar_count += 1;
            }
        }
    }

    /// True shortly after a beat boundary
    ///
    /// Tolerates a few samples of call-site jitter rather than requiring the
    /// exact boundary sample.
    #[inline]
    pub fn should_trigger_on_beat(&self) -> bool {
        self.sample_in_beat < BEAT_TRIGGER_THRESHOLD
    }

    /// True shortly after the first beat of a bar
    #[inline]
    pub fn is_downbeat(&self) -> bool {
        self.beat_in_bar == 0 && self.should_trigger_on_beat()
    }

    /// Round a sample count to the nearest whole number of beats
    pub fn beat_aligned_length(&self, samples: usize) -> usize {
        self.round_to_beat(samples)
    }

    /// Round a sample position to the nearest beat boundary
    pub fn snap_to_nearest_beat(&self, position: usize) -> usize {
        self.round_to_beat(position)
    }

    /// Exact length of `beats` beats in samples, saturating at `usize::MAX`
    pub fn exact_beat_length(&self, beats: usize) -> usize {
        beats.saturating_mul(self.samples_per_beat)
    }

    /// Number of whole beats nearest to `samples` (round half up)
    ///
    /// Returns 0 when the beat length is unknown.
    pub fn beats_in(&self, samples: usize) -> usize {
        if self.samples_per_beat == 0 {
            return 0;
        }
        samples.saturating_add(self.samples_per_beat / 2) / self.samples_per_beat
    }

    fn round_to_beat(&self, samples: usize) -> usize {
        if self.samples_per_beat == 0 {
            return samples;
        }
        self.exact_beat_length(self.beats_in(samples))
    }

    /// Re-anchor the beat phase (fresh recording)
    pub fn reset(&mut self) {
        self.sample_in_beat = 0;
        self.beat_in_bar = 0;
        self.bar_count = 0;
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.signature
    }

    pub fn samples_per_beat(&self) -> usize {
        self.samples_per_beat
    }

    pub fn samples_per_bar(&self) -> usize {
        self.samples_per_bar
    }

    pub fn sample_in_beat(&self) -> usize {
        self.sample_in_beat
    }

    pub fn beat_in_bar(&self) -> u8 {
        self.beat_in_bar
    }

    pub fn bar_count(&self) -> u64 {
        self.bar_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock_with_beat(samples_per_beat: usize) -> Clock {
        // 60 BPM makes samples_per_beat equal to the sample rate
        let mut clock = Clock::new();
        clock.set_bpm(60.0);
        clock.set_sample_rate(samples_per_beat as f64);
        clock
    }

    #[test]
    fn test_default_timings() {
        let clock = Clock::new();
        assert_eq!(clock.samples_per_beat(), 24000);
        assert_eq!(clock.samples_per_bar(), 96000);
        assert_eq!(clock.time_signature(), TimeSignature::default());
    }

    #[test]
    fn test_samples_per_beat_rounds() {
        let mut clock = Clock::new();
        clock.set_sample_rate(44100.0);
        clock.set_bpm(128.0);
        // 44100 * 60 / 128 = 20671.875
        assert_eq!(clock.samples_per_beat(), 20672);
    }

    #[test]
    fn test_invalid_input_ignored() {
        let mut clock = Clock::new();
        clock.set_bpm(0.0);
        clock.set_bpm(-10.0);
        clock.set_bpm(f64::NAN);
        clock.set_sample_rate(0.0);
        clock.set_time_signature(0, 4);
        clock.set_time_signature(3, 0);
        assert_eq!(clock.bpm(), 120.0);
        assert_eq!(clock.sample_rate(), 48000.0);
        assert_eq!(clock.samples_per_beat(), 24000);
        assert_eq!(clock.time_signature().numerator, 4);
    }

    #[test]
    fn test_time_signature_changes_bar_length() {
        let mut clock = Clock::new();
        clock.set_time_signature(3, 4);
        assert_eq!(clock.samples_per_bar(), 72000);
        clock.set_bpm(60.0);
        assert_eq!(clock.samples_per_beat(), 48000);
        assert_eq!(clock.samples_per_bar(), 144000);
    }

    #[test]
    fn test_one_beat_after_24000_ticks() {
        let mut clock = Clock::new();
        for _ in 0..23999 {
            clock.tick();
        }
        assert_eq!(clock.beat_in_bar(), 0);
        clock.tick();
        assert_eq!(clock.beat_in_bar(), 1);
        assert_eq!(clock.sample_in_beat(), 0);
    }

    #[test]
    fn test_beat_counter_wraps_at_numerator() {
        let mut clock = clock_with_beat(10);
        clock.set_time_signature(3, 4);
        for _ in 0..30 {
            clock.tick();
        }
        assert_eq!(clock.beat_in_bar(), 0);
        assert_eq!(clock.bar_count(), 1);
    }

    #[test]
    fn test_trigger_window_and_downbeat() {
        let mut clock = clock_with_beat(100);
        assert!(clock.should_trigger_on_beat());
        assert!(clock.is_downbeat());

        for _ in 0..BEAT_TRIGGER_THRESHOLD {
            clock.tick();
        }
        assert!(!clock.should_trigger_on_beat());

        for _ in BEAT_TRIGGER_THRESHOLD..100 {
            clock.tick();
        }
        // First beat of the bar passed: on a beat, but not a downbeat
        assert!(clock.should_trigger_on_beat());
        assert!(!clock.is_downbeat());
    }

    #[test]
    fn test_beat_aligned_length_rounds_half_up() {
        let clock = clock_with_beat(100);
        assert_eq!(clock.beat_aligned_length(0), 0);
        assert_eq!(clock.beat_aligned_length(49), 0);
        assert_eq!(clock.beat_aligned_length(50), 100);
        assert_eq!(clock.beat_aligned_length(149), 100);
        assert_eq!(clock.beat_aligned_length(150), 200);
        assert_eq!(clock.snap_to_nearest_beat(251), 300);
        assert_eq!(clock.exact_beat_length(4), 400);
    }

    #[test]
    fn test_beat_rounding_near_usize_max() {
        let clock = clock_with_beat(100);
        let aligned = clock.beat_aligned_length(usize::MAX);
        assert_eq!(aligned % 100, 0);
        assert!(aligned > usize::MAX - 100);
        assert_eq!(clock.snap_to_nearest_beat(usize::MAX), aligned);
        assert_eq!(clock.beats_in(usize::MAX), usize::MAX / 100);
        assert_eq!(clock.exact_beat_length(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_unknown_beat_length_is_identity() {
        let mut clock = Clock::new();
        clock.set_sample_rate(1.0);
        clock.set_bpm(1000.0);
        assert_eq!(clock.samples_per_beat(), 0);
        assert_eq!(clock.beat_aligned_length(1234), 1234);
        assert_eq!(clock.snap_to_nearest_beat(77), 77);
        // Ticking without a beat length never advances beats
        clock.tick();
        assert_eq!(clock.beat_in_bar(), 0);
    }

    #[test]
    fn test_reset_reanchors_phase() {
        let mut clock = clock_with_beat(10);
        for _ in 0..25 {
            clock.tick();
        }
        clock.reset();
        assert_eq!(clock.sample_in_beat(), 0);
        assert_eq!(clock.beat_in_bar(), 0);
        assert_eq!(clock.bar_count(), 0);
    }
}
