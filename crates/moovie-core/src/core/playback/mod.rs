//! Playback Module
//!
//! Lifecycle signals, the host media interface, and the state machine that
//! turns one into a displayable player state.

mod host;
mod machine;
mod signals;

pub use host::MediaElement;
pub use machine::{PlaybackState, PlaybackStateMachine, Transition};
pub use signals::MediaSignal;
