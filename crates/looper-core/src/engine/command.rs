//! Lock-free command queue for looper control
//!
//! The control thread never touches the engine directly. It pushes
//! [`LooperCommand`]s into an `rtrb` ring buffer and the audio thread applies
//! them between blocks, so a multi-field change (region plus playhead clamp,
//! tempo plus derived beat lengths) is never observed half-done by
//! [`Looper::process`](super::Looper::process).
//!
//! # Real-Time Safety
//!
//! - **No allocations**: the ring buffer is allocated once by [`command_channel`]
//! - **Wait-free**: push and pop are O(1) and never block
//! - **Single-producer single-consumer**: control thread → audio thread
//!
//! # Usage
//!
//! ```ignore
//! let (mut tx, mut rx) = command_channel();
//!
//! // Control thread
//! tx.push(LooperCommand::Event(LooperEvent::PressRec))?;
//!
//! // Audio thread, once per block
//! looper.process_commands(&mut rx);
//! looper.process_block(&input, &mut output);
//! ```

use crate::state::LooperEvent;

/// Commands sent from the control thread to the audio thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LooperCommand {
    // ─────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────
    /// Feed a button event through the state machine
    Event(LooperEvent),
    /// Playhead back to the region start
    Restart,
    /// Force Idle and forget the loop
    Reset,

    // ─────────────────────────────────────────────────────────────
    // Region and playback
    // ─────────────────────────────────────────────────────────────
    /// Active loop window, inclusive sample range
    SetLoopRegion { start: usize, end: usize },
    SetReverse(bool),
    /// Speed multiplier (1.0 = normal)
    SetPlaybackSpeed(f32),
    /// Gain-based pitch in semitones
    SetPitch(f32),

    // ─────────────────────────────────────────────────────────────
    // Tempo and quantization
    // ─────────────────────────────────────────────────────────────
    SetTempo { bpm: f64, sample_rate: f64 },
    SetTimeSignature { numerator: u8, denominator: u8 },
    /// Quantize takes to multiples of `beats` beats
    SetQuantize { enabled: bool, beats: usize },

    // ─────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────
    Undo,
    Redo,
}

/// Maximum number of pending commands in the queue
///
/// Control input arrives at human speed; 256 slots cover many blocks of
/// backlog.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Create a new command channel (producer/consumer pair)
///
/// Returns `(Producer, Consumer)` where:
/// - Producer: Send side, owned by the control thread
/// - Consumer: Receive side, owned by the audio thread
///
/// The channel is bounded with capacity for [`COMMAND_QUEUE_CAPACITY`] commands.
pub fn command_channel() -> (rtrb::Producer<LooperCommand>, rtrb::Consumer<LooperCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_channel_creation() {
        let (mut tx, mut rx) = command_channel();

        tx.push(LooperCommand::Event(LooperEvent::PressRec)).unwrap();
        tx.push(LooperCommand::SetLoopRegion { start: 4, end: 9 }).unwrap();

        assert_eq!(rx.pop().unwrap(), LooperCommand::Event(LooperEvent::PressRec));
        assert_eq!(rx.pop().unwrap(), LooperCommand::SetLoopRegion { start: 4, end: 9 });
        assert!(rx.pop().is_err());
    }

    #[test]
    fn test_command_channel_bounded() {
        let (mut tx, _rx) = command_channel();
        for _ in 0..COMMAND_QUEUE_CAPACITY {
            tx.push(LooperCommand::Undo).unwrap();
        }
        assert!(tx.push(LooperCommand::Redo).is_err());
    }

    #[test]
    fn test_command_size() {
        // Largest variants carry two 8-byte fields
        let size = std::mem::size_of::<LooperCommand>();
        assert!(size <= 24, "LooperCommand is {} bytes, expected <= 24", size);
    }
}
