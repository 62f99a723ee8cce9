//! Looper - state machine and loop engine driven together
//!
//! [`Looper`] is what the audio callback owns. Button events go through the
//! [`LooperStateMachine`]; accepted transitions start and stop recording,
//! overdubbing and pause on the [`LoopEngine`] through [`StateHooks`].
//!
//! The control thread talks to it only through the command queue and reads
//! state back from [`LooperAtomics`].

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use crate::config::LooperConfig;
use crate::error::LooperResult;
use crate::state::{LooperEvent, LooperState, LooperStateMachine, StateHooks};
use crate::types::Sample;

use super::command::LooperCommand;
use super::loop_engine::LoopEngine;

/// Lock-free looper state for UI access
///
/// The audio thread publishes after every command batch and every processed
/// block or sample; display code reads without locking.
///
/// All operations use `Ordering::Relaxed` since we only need visibility,
/// not synchronization with other memory operations.
#[derive(Debug)]
pub struct LooperAtomics {
    /// Current [`LooperState`] as u8
    pub state: AtomicU8,
    /// Previous [`LooperState`] as u8
    pub previous_state: AtomicU8,
    /// Playhead over the whole buffer, 0.0..1.0 (f32 bits)
    pub playhead: AtomicU32,
    /// Playhead offset inside the region in samples
    pub loop_position: AtomicU64,
    pub region_start: AtomicU64,
    pub region_length: AtomicU64,
    /// Tempo in BPM (f64 bits)
    pub bpm: AtomicU64,
    pub samples_per_beat: AtomicU64,
    pub samples_per_bar: AtomicU64,
    pub can_undo: AtomicBool,
    pub can_redo: AtomicBool,
    pub reverse: AtomicBool,
}

impl Default for LooperAtomics {
    fn default() -> Self {
        Self::new()
    }
}

impl LooperAtomics {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LooperState::Idle as u8),
            previous_state: AtomicU8::new(LooperState::Idle as u8),
            playhead: AtomicU32::new(0.0_f32.to_bits()),
            loop_position: AtomicU64::new(0),
            region_start: AtomicU64::new(0),
            region_length: AtomicU64::new(1),
            bpm: AtomicU64::new(0.0_f64.to_bits()),
            samples_per_beat: AtomicU64::new(0),
            samples_per_bar: AtomicU64::new(0),
            can_undo: AtomicBool::new(false),
            can_redo: AtomicBool::new(false),
            reverse: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn state(&self) -> LooperState {
        LooperState::from(self.state.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn previous_state(&self) -> LooperState {
        LooperState::from(self.previous_state.load(Ordering::Relaxed))
    }

    /// Normalized playhead (lock-free)
    #[inline]
    pub fn playhead(&self) -> f32 {
        f32::from_bits(self.playhead.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn loop_position(&self) -> u64 {
        self.loop_position.load(Ordering::Relaxed)
    }

    /// Region as `(start, length)` in samples
    #[inline]
    pub fn region(&self) -> (u64, u64) {
        (
            self.region_start.load(Ordering::Relaxed),
            self.region_length.load(Ordering::Relaxed),
        )
    }

    #[inline]
    pub fn bpm(&self) -> f64 {
        f64::from_bits(self.bpm.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn samples_per_beat(&self) -> u64 {
        self.samples_per_beat.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn samples_per_bar(&self) -> u64 {
        self.samples_per_bar.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.can_undo.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.can_redo.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.reverse.load(Ordering::Relaxed)
    }
}

/// Runs engine side effects for state transitions
struct EngineHooks<'a> {
    engine: &'a mut LoopEngine,
}

impl StateHooks for EngineHooks<'_> {
    fn on_enter(&mut self, state: LooperState) {
        match state {
            LooperState::Idle => self.engine.clear(),
            LooperState::RecordingInitial => self.engine.start_recording(),
            LooperState::Overdubbing => self.engine.start_overdub(),
            LooperState::Paused => self.engine.pause(),
            LooperState::Playing => {}
        }
    }

    fn on_exit(&mut self, state: LooperState) {
        match state {
            LooperState::RecordingInitial => self.engine.stop_recording(),
            LooperState::Overdubbing => self.engine.stop_overdub(),
            LooperState::Paused => self.engine.resume(),
            LooperState::Idle | LooperState::Playing => {}
        }
    }
}

/// A single looper: state machine, engine and published UI state
pub struct Looper {
    machine: LooperStateMachine,
    engine: LoopEngine,
    atomics: Arc<LooperAtomics>,
}

impl Looper {
    /// Wrap a set-up engine; the looper starts Idle
    pub fn new(engine: LoopEngine) -> Self {
        let looper = Self {
            machine: LooperStateMachine::new(),
            engine,
            atomics: Arc::new(LooperAtomics::new()),
        };
        looper.publish();
        looper
    }

    /// Validate `config`, allocate buffer and undo slots, apply tempo settings
    pub fn from_config(config: &LooperConfig) -> LooperResult<Self> {
        config.validate()?;

        let mut engine = LoopEngine::with_capacity(config.buffer_capacity(), config.undo_levels)?;
        engine.set_tempo(config.bpm, config.sample_rate as f64);
        engine.set_time_signature(
            config.time_signature.numerator,
            config.time_signature.denominator,
        );
        engine.set_quantize(config.quantize.enabled, config.quantize.beats);

        log::info!(
            "Looper: {:.1}s @ {} Hz, {} BPM {}/{}, quantize {}",
            config.max_loop_seconds,
            config.sample_rate,
            config.bpm,
            config.time_signature.numerator,
            config.time_signature.denominator,
            if config.quantize.enabled { "on" } else { "off" }
        );

        Ok(Self::new(engine))
    }

    /// Shared handle to the lock-free UI state
    pub fn atomics(&self) -> Arc<LooperAtomics> {
        Arc::clone(&self.atomics)
    }

    /// Feed a button event through the state machine
    ///
    /// Returns whether a transition happened.
    pub fn handle_event(&mut self, event: LooperEvent) -> bool {
        let mut hooks = EngineHooks {
            engine: &mut self.engine,
        };
        self.machine.process_event(event, &mut hooks)
    }

    /// Force Idle and forget the loop
    pub fn reset(&mut self) {
        let mut hooks = EngineHooks {
            engine: &mut self.engine,
        };
        self.machine.reset(&mut hooks);
    }

    /// Apply one command immediately
    pub fn apply(&mut self, command: LooperCommand) {
        match command {
            LooperCommand::Event(event) => {
                self.handle_event(event);
            }
            LooperCommand::Restart => self.engine.restart(),
            LooperCommand::Reset => self.reset(),
            LooperCommand::SetLoopRegion { start, end } => {
                self.engine.set_loop_region(start, end)
            }
            LooperCommand::SetReverse(reverse) => self.engine.set_reverse(reverse),
            LooperCommand::SetPlaybackSpeed(speed) => self.engine.set_playback_speed(speed),
            LooperCommand::SetPitch(semitones) => self.engine.set_pitch(semitones),
            LooperCommand::SetTempo { bpm, sample_rate } => {
                self.engine.set_tempo(bpm, sample_rate)
            }
            LooperCommand::SetTimeSignature {
                numerator,
                denominator,
            } => self.engine.set_time_signature(numerator, denominator),
            LooperCommand::SetQuantize { enabled, beats } => {
                self.engine.set_quantize(enabled, beats)
            }
            LooperCommand::Undo => {
                let done = self.engine.undo();
                log::debug!("Looper: undo {}", if done { "applied" } else { "unavailable" });
            }
            LooperCommand::Redo => {
                let done = self.engine.redo();
                log::debug!("Looper: redo {}", if done { "applied" } else { "unavailable" });
            }
        }
    }

    /// Drain and apply every pending command (call between blocks)
    pub fn process_commands(&mut self, rx: &mut rtrb::Consumer<LooperCommand>) {
        let mut applied = false;
        while let Ok(command) = rx.pop() {
            self.apply(command);
            applied = true;
        }
        if applied {
            self.publish();
        }
    }

    /// Process one sample
    pub fn process(&mut self, input: Sample) -> Sample {
        let output = self.process_sample(input);
        self.publish();
        output
    }

    /// Process a block sample by sample over the common length
    pub fn process_block(&mut self, input: &[Sample], output: &mut [Sample]) {
        for (out, &sample) in output.iter_mut().zip(input) {
            *out = self.process_sample(sample);
        }
        self.publish();
    }

    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        let output = self.engine.process(input);

        // Buffer filled up: the engine closed the take on its own
        if self.machine.is_in_state(LooperState::RecordingInitial) && !self.engine.is_recording() {
            self.handle_event(LooperEvent::ReleaseRec);
        }
        output
    }

    fn publish(&self) {
        let a = &self.atomics;
        let region = self.engine.region();
        let clock = self.engine.clock();

        a.state.store(self.machine.state() as u8, Ordering::Relaxed);
        a.previous_state
            .store(self.machine.previous_state() as u8, Ordering::Relaxed);
        a.playhead
            .store(self.engine.playhead_normalized().to_bits(), Ordering::Relaxed);
        a.loop_position
            .store(self.engine.loop_playhead_position() as u64, Ordering::Relaxed);
        a.region_start.store(region.start() as u64, Ordering::Relaxed);
        a.region_length.store(region.length() as u64, Ordering::Relaxed);
        a.bpm.store(clock.bpm().to_bits(), Ordering::Relaxed);
        a.samples_per_beat
            .store(clock.samples_per_beat() as u64, Ordering::Relaxed);
        a.samples_per_bar
            .store(clock.samples_per_bar() as u64, Ordering::Relaxed);
        a.can_undo.store(self.engine.can_undo(), Ordering::Relaxed);
        a.can_redo.store(self.engine.can_redo(), Ordering::Relaxed);
        a.reverse.store(self.engine.is_reverse(), Ordering::Relaxed);
    }

    // ─────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────

    pub fn state(&self) -> LooperState {
        self.machine.state()
    }

    pub fn previous_state(&self) -> LooperState {
        self.machine.previous_state()
    }

    pub fn engine(&self) -> &LoopEngine {
        &self.engine
    }

    pub fn playhead_normalized(&self) -> f32 {
        self.engine.playhead_normalized()
    }

    pub fn loop_playhead_position(&self) -> usize {
        self.engine.loop_playhead_position()
    }

    pub fn bpm(&self) -> f64 {
        self.engine.clock().bpm()
    }

    pub fn samples_per_beat(&self) -> usize {
        self.engine.clock().samples_per_beat()
    }

    pub fn samples_per_bar(&self) -> usize {
        self.engine.clock().samples_per_bar()
    }

    pub fn can_undo(&self) -> bool {
        self.engine.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.engine.can_redo()
    }
}
