//! Common types for the looper core
//!
//! Sample type and the fixed constants shared between the engine, the clock
//! and the undo history.

/// Default sample rate (48kHz - standard professional audio rate)
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Default tempo used until a tempo is configured
pub const DEFAULT_BPM: f64 = 120.0;

/// Upper bound on undo snapshot slots
pub const MAX_UNDO_LEVELS: usize = 3;

/// Seam crossfade window applied when a take is closed
/// 128 samples ≈ 2.7ms @ 48kHz
pub const CROSSFADE_SAMPLES: usize = 128;

/// Drive constant of the tanh soft clipper: `tanh(x * k) / k`
pub const SOFT_CLIP_DRIVE: f32 = 0.7;

/// Window (in samples after a beat boundary) during which the clock reports a beat
/// ~0.2ms @ 48kHz
pub const BEAT_TRIGGER_THRESHOLD: usize = 10;

/// Default number of beats a quantized loop is aligned to
pub const DEFAULT_QUANTIZE_BEATS: usize = 4;

/// Gain-based pitch range in semitones (±)
pub const MAX_PITCH_SEMITONES: f32 = 12.0;

/// Audio sample type (mono, 32-bit float)
pub type Sample = f32;
