//! Moovie Core Library
//!
//! Caption track engine and playback state machine for the Moovie video player.
//! This library contains everything the player needs that is not UI plumbing:
//! timed-text parsing, active-cue reconciliation against a playback clock, and
//! the derivation of a single enumerated player state from media lifecycle
//! signals.
//!
//! The host (a browser media element, a test double, the CLI) feeds raw caption
//! text, time ticks and lifecycle signals in, and renders what comes out.

pub mod core;

pub use crate::core::{
    captions::{
        parse, CaptionFormat, Cue, CueChangeEvent, CueIndex, CueSettings, CueTrack,
        CueTransitions, LoadReport, ParsedCues, ReadyState, TrackKind, TrackMode,
    },
    format_clock,
    playback::{MediaElement, MediaSignal, PlaybackState, PlaybackStateMachine, Transition},
    session::{CaptionSync, PlayerSession, SignalOutcome, TrackTransitions},
    settings::{PlayerSettings, SettingsManager},
    CaptionError, CaptionResult, CoreError, CoreResult, CueSyntaxError, TimeSec,
};
