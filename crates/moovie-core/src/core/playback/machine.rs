//! Playback State Machine
//!
//! Derives a single player state from the host's lifecycle signals. The
//! machine is a view over host behavior, not a validator: every signal is
//! accepted, and signals outside the transition table leave the state alone
//! while still reaching subscribers.
//!
//! | Signal                 | Resulting state                      |
//! |------------------------|--------------------------------------|
//! | `loadstart`            | `Loading`                            |
//! | `loadedmetadata`       | `Stopped`                            |
//! | `seeking`              | `Seeking`                            |
//! | `seeked`               | `Paused` or `Playing`, from `Seeking`|
//! | `play`, `playing`      | `Playing`                            |
//! | `pause`                | `Paused`, except once `Ended`        |
//! | `waiting`              | `Waiting`, from `Playing`/`Seeking`  |
//! | `ended`                | `Ended`, with a forced pause         |
//!
//! `error` has no state of its own and is delivered as a notification only.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::host::MediaElement;
use super::signals::MediaSignal;
use crate::core::events::{SubscriptionId, Subscribers};

// =============================================================================
// States
// =============================================================================

/// Player state as shown to the user
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Resource selection in progress
    #[default]
    Loading,
    /// Metadata known, playback not started
    Stopped,
    Playing,
    Paused,
    Seeking,
    /// Playing but starved of data
    Waiting,
    /// Reached the end of the media
    Ended,
}

impl PlaybackState {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackState::Loading => "loading",
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Seeking => "seeking",
            PlaybackState::Waiting => "waiting",
            PlaybackState::Ended => "ended",
        }
    }

    /// Applies one signal to this state
    pub fn next(self, signal: MediaSignal) -> PlaybackState {
        match signal {
            MediaSignal::LoadStart => PlaybackState::Loading,
            MediaSignal::LoadedMetadata => PlaybackState::Stopped,
            MediaSignal::Seeking => PlaybackState::Seeking,
            MediaSignal::Seeked { paused } if self == PlaybackState::Seeking => {
                if paused {
                    PlaybackState::Paused
                } else {
                    PlaybackState::Playing
                }
            }
            MediaSignal::Play | MediaSignal::Playing => PlaybackState::Playing,
            // Hosts may echo the forced pause after `ended`
            MediaSignal::Pause if self != PlaybackState::Ended => PlaybackState::Paused,
            MediaSignal::Waiting
                if matches!(self, PlaybackState::Playing | PlaybackState::Seeking) =>
            {
                PlaybackState::Waiting
            }
            MediaSignal::Ended => PlaybackState::Ended,
            _ => self,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of feeding one signal to the machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub signal: MediaSignal,
    pub previous: PlaybackState,
    pub state: PlaybackState,
    /// The host must be paused regardless of its own paused flag
    pub force_pause: bool,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.previous != self.state
    }
}

// =============================================================================
// State Machine
// =============================================================================

/// Owns the player state; mutated only through [`PlaybackStateMachine::transition`]
#[derive(Debug, Default)]
pub struct PlaybackStateMachine {
    state: PlaybackState,
    listeners: Subscribers<Transition>,
}

impl PlaybackStateMachine {
    /// Creates a machine in the `Loading` state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Applies a signal and notifies every subscriber, whether or not the
    /// state changed.
    pub fn transition(&mut self, signal: MediaSignal) -> Transition {
        let previous = self.state;
        self.state = previous.next(signal);

        let transition = Transition {
            signal,
            previous,
            state: self.state,
            force_pause: signal == MediaSignal::Ended,
        };

        if transition.changed() {
            debug!("Playback state {} -> {} on '{}'", previous, self.state, signal);
        }

        self.listeners.emit(&transition);
        transition
    }

    /// Synchronizes with a host that may have loaded before the machine existed.
    ///
    /// When the host already has metadata, `loadstart`, `durationchange` and
    /// `loadedmetadata` are replayed in that order before this returns.
    /// Otherwise nothing happens and the host's own signals drive the machine.
    pub fn attach<H: MediaElement + ?Sized>(&mut self, host: &H) -> Vec<Transition> {
        if !host.has_metadata() {
            return Vec::new();
        }

        debug!("Host already has metadata, replaying load sequence");
        MediaSignal::ATTACH_REPLAY
            .iter()
            .map(|signal| self.transition(*signal))
            .collect()
    }

    /// Registers a listener for every processed signal
    pub fn subscribe(&mut self, listener: impl FnMut(&Transition) + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
