//! Looper setup and configuration error types
//!
//! Runtime conditions (rejected transitions, ignored settings, exhausted
//! history, capacity overrun) are not errors: they are reported as `false`
//! or handled in place. Only setup can fail.

use thiserror::Error;

/// Errors that can occur while setting up a looper
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LooperError {
    /// The sample buffer supplied at setup has no capacity
    #[error("Sample buffer must hold at least one sample")]
    EmptyBuffer,

    /// An undo snapshot slot does not match the sample buffer capacity
    #[error("Undo slot {slot} holds {actual} samples, expected {expected}")]
    UndoSlotMismatch {
        slot: usize,
        expected: usize,
        actual: usize,
    },

    /// Configuration values that cannot produce a working looper
    #[error("Invalid looper configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for looper setup
pub type LooperResult<T> = Result<T, LooperError>;
