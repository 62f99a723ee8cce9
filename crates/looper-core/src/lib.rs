//! Looper Core - real-time single-loop recording engine
//!
//! Records, plays back and overdubs one loop held in a fixed-capacity sample
//! buffer, with tempo-based quantization and a short undo history.
//!
//! - [`state`]: looper state machine and button events
//! - [`engine`]: loop engine, command queue and the [`Looper`](engine::Looper) integration
//! - [`undo`]: undo/redo snapshot ring
//! - [`clock`]: tempo, beat tracking and beat-grid rounding
//! - [`dsp`]: stateless buffer primitives
//! - [`config`]: YAML configuration

pub mod buffer;
pub mod clock;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod state;
pub mod types;
pub mod undo;

pub use buffer::{LoopRegion, SampleBuffer};
pub use clock::{Clock, TimeSignature};
pub use engine::{command_channel, LoopEngine, Looper, LooperAtomics, LooperCommand};
pub use error::{LooperError, LooperResult};
pub use state::{LooperEvent, LooperState, LooperStateMachine, StateHooks};
pub use types::*;
pub use undo::UndoHistory;
