//! Loop engine - record, play back and overdub one loop
//!
//! The engine owns the sample buffer, the active [`LoopRegion`], the playhead
//! and record head, the tempo [`Clock`] and the [`UndoHistory`]. Everything is
//! allocated in [`LoopEngine::new`]; [`LoopEngine::process`] runs once per
//! sample on the real-time thread and never allocates.
//!
//! # Per-sample flow
//!
//! ```text
//! recording?  ── yes ──▶ write input at record head, monitor input through
//!     │ no
//! empty/paused? ─ yes ──▶ silence
//!     │ no
//! read interpolated sample at playhead
//!     │
//! overdubbing? ─ yes ──▶ soft_clip(buffer + input) written back and output
//!     │
//! advance playhead ±speed, wrap once by region length
//! ```

use crate::buffer::{LoopRegion, SampleBuffer};
use crate::clock::Clock;
use crate::dsp;
use crate::error::{LooperError, LooperResult};
use crate::types::{Sample, CROSSFADE_SAMPLES, DEFAULT_QUANTIZE_BEATS, MAX_PITCH_SEMITONES};
use crate::undo::UndoHistory;

use super::playhead::Playhead;

/// Single-loop record/playback/overdub engine
#[derive(Debug)]
pub struct LoopEngine {
    buffer: SampleBuffer,
    region: LoopRegion,
    playhead: Playhead,
    /// Next buffer index written while recording
    record_head: usize,
    /// Samples captured by the last take
    recorded_length: usize,
    /// No take recorded since setup or the last clear
    empty: bool,
    recording: bool,
    overdubbing: bool,
    paused: bool,
    /// Pitch control in semitones (±12)
    pitch_semitones: f32,
    /// Output gain derived from `pitch_semitones`
    pitch_gain: Sample,
    quantize: bool,
    quantize_beats: usize,
    clock: Clock,
    undo: UndoHistory,
}

impl LoopEngine {
    /// Set up an engine over caller-provided storage
    ///
    /// Every undo slot must hold exactly as many samples as the buffer.
    /// The buffer is zeroed and the loop starts out empty.
    pub fn new(buffer: Vec<Sample>, undo_slots: Vec<Vec<Sample>>) -> LooperResult<Self> {
        let buffer = SampleBuffer::new(buffer)?;
        let capacity = buffer.capacity();

        if let Some((slot, actual)) = undo_slots
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != capacity)
        {
            return Err(LooperError::UndoSlotMismatch {
                slot,
                expected: capacity,
                actual,
            });
        }

        log::info!(
            "LoopEngine: {} samples, {} undo slot(s)",
            capacity,
            undo_slots.len()
        );

        Ok(Self {
            buffer,
            region: LoopRegion::default(),
            playhead: Playhead::new(),
            record_head: 0,
            recorded_length: 0,
            empty: true,
            recording: false,
            overdubbing: false,
            paused: false,
            pitch_semitones: 0.0,
            pitch_gain: 1.0,
            quantize: false,
            quantize_beats: DEFAULT_QUANTIZE_BEATS,
            clock: Clock::new(),
            undo: UndoHistory::new(undo_slots),
        })
    }

    /// Allocate a silent buffer and `undo_levels` matching snapshot slots
    pub fn with_capacity(capacity: usize, undo_levels: usize) -> LooperResult<Self> {
        let slots = (0..undo_levels).map(|_| vec![0.0; capacity]).collect();
        Self::new(vec![0.0; capacity], slots)
    }

    // ─────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────

    /// Begin a fresh take at the start of the buffer
    pub fn start_recording(&mut self) {
        self.record_head = 0;
        self.playhead.reset();
        self.empty = false;
        self.recording = true;
        self.overdubbing = false;
        self.paused = false;
        self.clock.reset();
    }

    /// End the take and close the loop over what was recorded
    ///
    /// No-op when not recording.
    pub fn stop_recording(&mut self) {
        if !self.recording {
            return;
        }
        self.finish_take(self.record_head);
    }

    /// Snapshot the region for undo, then mix input into it
    pub fn start_overdub(&mut self) {
        self.save_undo_state();
        self.overdubbing = true;
    }

    pub fn stop_overdub(&mut self) {
        self.overdubbing = false;
    }

    /// Playhead back to the region start
    pub fn restart(&mut self) {
        self.playhead.reset();
    }

    /// Halt playback, keeping the playhead where it is
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Forget the loop: empty, heads and region reset, history dropped
    ///
    /// Sample content is left in place and overwritten by the next take.
    pub fn clear(&mut self) {
        self.empty = true;
        self.recording = false;
        self.overdubbing = false;
        self.paused = false;
        self.record_head = 0;
        self.recorded_length = 0;
        self.region = LoopRegion::default();
        self.playhead.reset();
        self.undo.clear();
    }

    fn finish_take(&mut self, recorded: usize) {
        let capacity = self.buffer.capacity();
        self.recording = false;
        self.recorded_length = recorded.min(capacity);
        self.record_head = 0;

        let (start, end) = self.quantize_loop_region(0, self.recorded_length);
        let length = end.saturating_sub(start).clamp(1, capacity);
        self.region = LoopRegion::new(self.buffer.wrap(start), length);

        // Quantize padding past the take holds stale audio from earlier loops
        if length > self.recorded_length {
            let padding_start = self.buffer.wrap(start.saturating_add(self.recorded_length));
            let padding = LoopRegion::new(padding_start, length - self.recorded_length);
            self.buffer.clear_region(&padding);
        }

        self.playhead.reset();
        self.apply_seam_crossfade();
    }

    /// Blend the region's tail into its head so the loop point does not click
    ///
    /// Skipped when the region is shorter than two crossfade windows.
    fn apply_seam_crossfade(&mut self) {
        let length = self.region.length();
        if length < CROSSFADE_SAMPLES * 2 {
            return;
        }
        let head_region = LoopRegion::new(self.region.start(), CROSSFADE_SAMPLES);
        let tail_start = self.buffer.region_index(&self.region, length - CROSSFADE_SAMPLES);
        let tail_region = LoopRegion::new(tail_start, CROSSFADE_SAMPLES);

        let mut head = [0.0; CROSSFADE_SAMPLES];
        let mut tail = [0.0; CROSSFADE_SAMPLES];
        let mut blended = [0.0; CROSSFADE_SAMPLES];
        self.buffer.copy_region_into(&head_region, &mut head);
        self.buffer.copy_region_into(&tail_region, &mut tail);
        dsp::seam_blend(&head, &tail, &mut blended);
        self.buffer.write_region_from(&head_region, &blended);
    }

    // ─────────────────────────────────────────────────────────────
    // Region and playback parameters
    // ─────────────────────────────────────────────────────────────

    /// Set the loop to the inclusive sample range `[start, end]`
    ///
    /// `end < start` is ignored. The length is capped at the buffer capacity
    /// and the playhead is reset when it falls outside the new region.
    pub fn set_loop_region(&mut self, start: usize, end: usize) {
        let Some(region) = LoopRegion::from_inclusive(start, end) else {
            log::debug!("LoopEngine: ignoring region [{}, {}]", start, end);
            return;
        };
        let length = region.length().min(self.buffer.capacity());
        self.region = LoopRegion::new(self.buffer.wrap(region.start()), length);
        self.playhead.clamp_to(length);
    }

    /// Set the loop from normalized (0..1) start and length
    pub fn set_loop_normalized(&mut self, start: f32, length: f32) {
        if !start.is_finite() || !length.is_finite() {
            return;
        }
        let capacity = self.buffer.capacity();
        let start = (start.clamp(0.0, 1.0) * (capacity - 1) as f32) as usize;
        let length = ((length.clamp(0.0, 1.0) * capacity as f32) as usize).max(1);
        self.set_loop_region(start, start + length - 1);
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.playhead.set_reverse(reverse);
    }

    /// Playback speed multiplier (1.0 = normal); invalid values are ignored
    pub fn set_playback_speed(&mut self, speed: f32) {
        if !self.playhead.set_speed(speed) {
            log::debug!("LoopEngine: ignoring playback speed {}", speed);
        }
    }

    /// Gain-based pitch control in semitones, clamped to ±12
    pub fn set_pitch(&mut self, semitones: f32) {
        if !semitones.is_finite() {
            return;
        }
        self.pitch_semitones = semitones.clamp(-MAX_PITCH_SEMITONES, MAX_PITCH_SEMITONES);
        self.pitch_gain = dsp::pitch_ratio(self.pitch_semitones);
    }

    // ─────────────────────────────────────────────────────────────
    // Tempo and quantization
    // ─────────────────────────────────────────────────────────────

    /// Set tempo and sample rate together; ignored unless both are positive
    pub fn set_tempo(&mut self, bpm: f64, sample_rate: f64) {
        if bpm <= 0.0 || sample_rate <= 0.0 || !bpm.is_finite() || !sample_rate.is_finite() {
            log::debug!("LoopEngine: ignoring tempo {} BPM @ {} Hz", bpm, sample_rate);
            return;
        }
        self.clock.set_sample_rate(sample_rate);
        self.clock.set_bpm(bpm);
    }

    pub fn set_time_signature(&mut self, numerator: u8, denominator: u8) {
        self.clock.set_time_signature(numerator, denominator);
    }

    /// Enable quantized takes aligned to `beats` beats (0 means 4)
    pub fn set_quantize(&mut self, enabled: bool, beats: usize) {
        self.quantize = enabled;
        self.quantize_beats = if beats > 0 { beats } else { DEFAULT_QUANTIZE_BEATS };
    }

    /// Snap a recorded `[start, end)` span to the beat grid
    ///
    /// The start goes to the nearest beat; the length is rounded to the
    /// nearest whole number of beats, then to the nearest multiple of the
    /// quantize beat count, never below one such multiple. Returns the inputs
    /// unchanged when quantization is off or the beat length is unknown.
    pub fn quantize_loop_region(&self, start: usize, end: usize) -> (usize, usize) {
        let samples_per_beat = self.clock.samples_per_beat();
        if !self.quantize || samples_per_beat == 0 {
            return (start, end);
        }

        let quantized_start = self.clock.snap_to_nearest_beat(start);
        let beats = self.clock.beats_in(end.saturating_sub(start));
        let group = self.quantize_beats;
        let beats = if beats < group {
            group
        } else {
            (beats.saturating_add(group / 2) / group) * group
        };

        let length = self.clock.exact_beat_length(beats);
        (quantized_start, quantized_start.saturating_add(length))
    }

    // ─────────────────────────────────────────────────────────────
    // Undo/redo
    // ─────────────────────────────────────────────────────────────

    pub fn save_undo_state(&mut self) {
        self.undo.save(&self.buffer, &self.region);
    }

    /// Restore the previous region content
    ///
    /// Refused while recording or overdubbing.
    pub fn undo(&mut self) -> bool {
        if self.recording || self.overdubbing {
            log::debug!("LoopEngine: undo refused while writing");
            return false;
        }
        self.undo.undo(&mut self.buffer, &self.region)
    }

    /// Re-apply the last undone change
    ///
    /// Refused while recording or overdubbing.
    pub fn redo(&mut self) -> bool {
        if self.recording || self.overdubbing {
            log::debug!("LoopEngine: redo refused while writing");
            return false;
        }
        self.undo.redo(&mut self.buffer, &self.region)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    // ─────────────────────────────────────────────────────────────
    // Real-time processing
    // ─────────────────────────────────────────────────────────────

    /// Process one input sample and return one output sample
    pub fn process(&mut self, input: Sample) -> Sample {
        self.clock.tick();

        if self.recording {
            self.buffer.set(self.record_head, input);
            self.record_head += 1;
            if self.record_head >= self.buffer.capacity() {
                log::warn!(
                    "LoopEngine: buffer full after {} samples, closing take",
                    self.record_head
                );
                self.finish_take(self.buffer.capacity());
            }
            return input;
        }

        if self.empty || self.paused {
            return 0.0;
        }

        let mut output = self.read_interpolated();

        if self.overdubbing {
            let index = self.buffer.region_index(&self.region, self.playhead.index());
            let mixed = dsp::soft_clip(self.buffer.get(index) + input);
            self.buffer.set(index, mixed);
            output = mixed;
        }

        self.playhead.advance(self.region.length());
        output * self.pitch_gain
    }

    /// Linear interpolation at the playhead, wrapping inside the region
    #[inline]
    fn read_interpolated(&self) -> Sample {
        let index = self.playhead.index();
        let next = (index + 1) % self.region.length();
        let frac = self.playhead.position() - index as f32;
        let a = self.buffer.get(self.buffer.region_index(&self.region, index));
        let b = self.buffer.get(self.buffer.region_index(&self.region, next));
        a * (1.0 - frac) + b * frac
    }

    // ─────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_overdubbing(&self) -> bool {
        self.overdubbing
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_reverse(&self) -> bool {
        self.playhead.is_reverse()
    }

    pub fn playback_speed(&self) -> f32 {
        self.playhead.speed()
    }

    pub fn pitch(&self) -> f32 {
        self.pitch_semitones
    }

    pub fn is_quantized(&self) -> bool {
        self.quantize
    }

    pub fn quantize_beats(&self) -> usize {
        self.quantize_beats
    }

    pub fn region(&self) -> LoopRegion {
        self.region
    }

    pub fn recorded_length(&self) -> usize {
        self.recorded_length
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Playhead as a fraction of the whole buffer: `(start + playhead) / capacity`
    pub fn playhead_normalized(&self) -> f32 {
        (self.region.start() as f32 + self.playhead.position()) / self.buffer.capacity() as f32
    }

    /// Integer playhead offset inside the region
    pub fn loop_playhead_position(&self) -> usize {
        self.playhead.index()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Read-only view of the sample buffer (waveform display, export)
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
}
