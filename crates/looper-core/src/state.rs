//! Looper state machine
//!
//! Validates and performs transitions between looper states. Button events
//! are mapped through a fixed table; any target state is then checked by
//! [`LooperStateMachine::can_transition`] before anything changes, so the
//! engine cannot be driven through an invalid sequence (e.g. stopping an
//! overdub that never started).
//!
//! ```text
//!            PressRec            ReleaseRec            PressRec
//!   Idle ──────────────▶ RecordingInitial ──────▶ Playing ──────▶ Overdubbing
//!    ▲                        │                  │  ▲  ◀──────────┘ ReleaseRec
//!    │        PressStop       │       PressPause │  │ PressPlay / PressPause
//!    └────────────────────────┘                  ▼  │
//!           (any state → Idle on stop/clear)     Paused
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// States of the looper
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LooperState {
    /// No loop recorded, waiting for a take
    #[default]
    Idle = 0,
    /// Recording the first take
    RecordingInitial = 1,
    /// Looping the recorded take
    Playing = 2,
    /// Mixing live input into the loop
    Overdubbing = 3,
    /// Playback halted, position kept
    Paused = 4,
}

impl LooperState {
    /// All states in declaration order
    pub const ALL: [LooperState; 5] = [
        LooperState::Idle,
        LooperState::RecordingInitial,
        LooperState::Playing,
        LooperState::Overdubbing,
        LooperState::Paused,
    ];

    /// Display name (e.g. for logging or a status line)
    pub fn name(&self) -> &'static str {
        match self {
            LooperState::Idle => "IDLE",
            LooperState::RecordingInitial => "RECORDING_INITIAL",
            LooperState::Playing => "PLAYING",
            LooperState::Overdubbing => "OVERDUBBING",
            LooperState::Paused => "PAUSED",
        }
    }
}

impl From<u8> for LooperState {
    fn from(val: u8) -> Self {
        match val {
            1 => LooperState::RecordingInitial,
            2 => LooperState::Playing,
            3 => LooperState::Overdubbing,
            4 => LooperState::Paused,
            _ => LooperState::Idle,
        }
    }
}

impl fmt::Display for LooperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User intents that may cause a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LooperEvent {
    PressRec,
    ReleaseRec,
    PressPlay,
    PressStop,
    PressPause,
    /// Loop reached its end naturally (informational, never transitions)
    LoopEnded,
    ClearLoop,
}

impl LooperEvent {
    /// All events in declaration order
    pub const ALL: [LooperEvent; 7] = [
        LooperEvent::PressRec,
        LooperEvent::ReleaseRec,
        LooperEvent::PressPlay,
        LooperEvent::PressStop,
        LooperEvent::PressPause,
        LooperEvent::LoopEnded,
        LooperEvent::ClearLoop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LooperEvent::PressRec => "PRESS_REC",
            LooperEvent::ReleaseRec => "RELEASE_REC",
            LooperEvent::PressPlay => "PRESS_PLAY",
            LooperEvent::PressStop => "PRESS_STOP",
            LooperEvent::PressPause => "PRESS_PAUSE",
            LooperEvent::LoopEnded => "LOOP_ENDED",
            LooperEvent::ClearLoop => "CLEAR_LOOP",
        }
    }
}

impl fmt::Display for LooperEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Callbacks run around every accepted transition
///
/// The engine integration implements this to start/stop recording and
/// overdubbing as states are entered and left.
pub trait StateHooks {
    /// Called after the new state becomes current
    fn on_enter(&mut self, _state: LooperState) {}

    /// Called before the old state is left
    fn on_exit(&mut self, _state: LooperState) {}
}

/// No-op hooks
impl StateHooks for () {}

/// Current/previous looper state with validated transitions
#[derive(Debug, Clone, Default)]
pub struct LooperStateMachine {
    current: LooperState,
    /// Informational only, never consulted for transition decisions
    previous: LooperState,
}

impl LooperStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LooperState {
        self.current
    }

    pub fn previous_state(&self) -> LooperState {
        self.previous
    }

    pub fn is_in_state(&self, state: LooperState) -> bool {
        self.current == state
    }

    /// Anything but Idle
    pub fn is_active(&self) -> bool {
        self.current != LooperState::Idle
    }

    /// Writing audio into the loop (initial take or overdub)
    pub fn is_recording(&self) -> bool {
        matches!(
            self.current,
            LooperState::RecordingInitial | LooperState::Overdubbing
        )
    }

    /// Whether `from → to` is a legal transition
    ///
    /// Going to Idle is always legal.
    pub fn can_transition(from: LooperState, to: LooperState) -> bool {
        use LooperState::*;

        if to == Idle {
            return true;
        }
        match from {
            Idle => to == RecordingInitial,
            RecordingInitial => to == Playing,
            Playing => matches!(to, Overdubbing | Paused),
            Overdubbing => to == Playing,
            Paused => to == Playing,
        }
    }

    /// Successor of `state` for `event`; unlisted pairs keep the state
    pub fn next_state(state: LooperState, event: LooperEvent) -> LooperState {
        use LooperEvent::*;
        use LooperState::*;

        match (state, event) {
            (Idle, PressRec) => RecordingInitial,
            (RecordingInitial, ReleaseRec) => Playing,
            (RecordingInitial, PressStop) => Idle,
            (Playing, PressRec) => Overdubbing,
            (Playing, PressPause) => Paused,
            (Playing, PressStop | ClearLoop) => Idle,
            (Overdubbing, ReleaseRec) => Playing,
            (Overdubbing, PressStop) => Idle,
            (Paused, PressPlay | PressPause) => Playing,
            (Paused, PressStop | ClearLoop) => Idle,
            (state, _) => state,
        }
    }

    /// Apply an event; returns whether a transition happened
    pub fn process_event<H: StateHooks + ?Sized>(
        &mut self,
        event: LooperEvent,
        hooks: &mut H,
    ) -> bool {
        let next = Self::next_state(self.current, event);
        if next == self.current {
            log::trace!("state: {} ignored in {}", event, self.current);
            return false;
        }
        self.transition_to(next, hooks)
    }

    /// Move to `state` if the transition is legal
    ///
    /// Rejected transitions mutate nothing and run no hooks.
    pub fn transition_to<H: StateHooks + ?Sized>(
        &mut self,
        state: LooperState,
        hooks: &mut H,
    ) -> bool {
        if !Self::can_transition(self.current, state) {
            log::debug!("state: rejected {} -> {}", self.current, state);
            return false;
        }

        hooks.on_exit(self.current);
        self.previous = self.current;
        self.current = state;
        hooks.on_enter(state);

        log::debug!("state: {} -> {}", self.previous, self.current);
        true
    }

    /// Force Idle
    pub fn reset<H: StateHooks + ?Sized>(&mut self, hooks: &mut H) {
        self.transition_to(LooperState::Idle, hooks);
    }
}
