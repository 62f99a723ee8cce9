//! Looper engine - loop playback, command queue, state integration
//!
//! - [`LoopEngine`]: record/overdub/playback over one fixed buffer
//! - [`Looper`]: state machine wired to the engine, with [`LooperAtomics`]
//!   for lock-free UI reads
//! - [`LooperCommand`]: control → audio messages over an `rtrb` ring buffer

mod command;
mod loop_engine;
mod looper;
mod playhead;

pub use command::*;
pub use loop_engine::*;
pub use looper::*;
pub use playhead::*;
