//! Player Session
//!
//! Connects caption tracks and the playback state machine to one media host.
//! The engine components only report side effects (a requested pause, a
//! forced pause at the end); the session decides, per settings, whether to
//! apply them to the host.
//!
//! Each session owns its own tracks and machine, so two players never share
//! state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::captions::{
    CaptionFormat, CueTrack, CueTrackId, CueTransitions, LoadReport, TrackMode,
};
use crate::core::playback::{
    MediaElement, MediaSignal, PlaybackState, PlaybackStateMachine, Transition,
};
use crate::core::settings::PlayerSettings;
use crate::core::{CoreError, CoreResult};

/// Non-empty reconciliation result for one track
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackTransitions {
    pub track_id: CueTrackId,
    #[serde(flatten)]
    pub transitions: CueTransitions,
}

/// Everything a single signal caused
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalOutcome {
    pub transition: Transition,
    /// Caption changes, for signals that move the playback position
    pub captions: Vec<TrackTransitions>,
    /// The session paused the host
    pub paused_host: bool,
}

/// Result of reconciling every track against the host clock
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionSync {
    pub tracks: Vec<TrackTransitions>,
    /// A pause-on-exit cue ended and the host was paused
    pub paused_host: bool,
}

/// One player: its tracks, its state machine and its settings
#[derive(Debug, Default)]
pub struct PlayerSession {
    settings: PlayerSettings,
    tracks: Vec<CueTrack>,
    machine: PlaybackStateMachine,
}

impl PlayerSession {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings,
            tracks: Vec::new(),
            machine: PlaybackStateMachine::new(),
        }
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn state(&self) -> PlaybackState {
        self.machine.state()
    }

    pub fn machine_mut(&mut self) -> &mut PlaybackStateMachine {
        &mut self.machine
    }

    // -------------------------------------------------------------------------
    // Tracks
    // -------------------------------------------------------------------------

    /// Adds a track and returns its id.
    ///
    /// When no track is marked default yet, a track in the preferred caption
    /// language becomes the default.
    pub fn add_track(&mut self, mut track: CueTrack) -> CueTrackId {
        if !track.is_default
            && !self.tracks.iter().any(|t| t.is_default)
            && matches_language(&track.language, &self.settings.captions.preferred_language)
        {
            debug!("Track '{}' matches preferred language, marking default", track.label);
            track.is_default = true;
        }

        let id = track.id().to_string();
        self.tracks.push(track);
        id
    }

    pub fn tracks(&self) -> &[CueTrack] {
        &self.tracks
    }

    pub fn track(&self, id: &str) -> Option<&CueTrack> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    pub fn track_mut(&mut self, id: &str) -> Option<&mut CueTrack> {
        self.tracks.iter_mut().find(|t| t.id() == id)
    }

    /// Parses caption text into a track, applying the auto-show setting
    pub fn load_track(
        &mut self,
        id: &str,
        format: CaptionFormat,
        text: &str,
    ) -> CoreResult<LoadReport> {
        let auto_show = self.settings.captions.auto_show_default;
        let track = self
            .track_mut(id)
            .ok_or_else(|| CoreError::TrackNotFound(id.to_string()))?;

        let report = track.load(format, text)?;
        if !auto_show && track.mode() == TrackMode::Showing {
            track.set_mode(TrackMode::Hidden);
        }
        Ok(report)
    }

    /// Detaches a track. Its cues are dropped without exit events.
    pub fn remove_track(&mut self, id: &str) -> Option<CueTrack> {
        let pos = self.tracks.iter().position(|t| t.id() == id)?;
        let mut track = self.tracks.remove(pos);
        track.unload();
        info!("Removed track '{}'", track.label);
        Some(track)
    }

    // -------------------------------------------------------------------------
    // Host Signals
    // -------------------------------------------------------------------------

    /// Replays the load sequence if the host finished loading before attach
    pub fn attach<H: MediaElement + ?Sized>(&mut self, host: &H) -> Vec<Transition> {
        self.machine.attach(host)
    }

    /// Reconciles every track against the host's current position.
    ///
    /// Pauses the host when a pause-on-exit cue ended and the setting allows it.
    pub fn sync_captions<H: MediaElement + ?Sized>(&mut self, host: &mut H) -> CaptionSync {
        let time_sec = host.current_time();
        let mut sync = CaptionSync::default();
        let mut pause_requested = false;

        for track in self.tracks.iter_mut() {
            let transitions = track.reconcile(time_sec);
            if transitions.is_empty() {
                continue;
            }
            pause_requested |= transitions.pause_requested;
            sync.tracks.push(TrackTransitions {
                track_id: track.id().to_string(),
                transitions,
            });
        }

        if pause_requested && self.settings.captions.honor_pause_on_exit && !host.paused() {
            debug!("Pausing host at {:.3}s for pause-on-exit cue", time_sec);
            host.pause();
            sync.paused_host = true;
        }

        sync
    }

    /// Feeds one lifecycle signal through the machine and applies its effects.
    ///
    /// The forced pause at the end is applied unless `force_pause_on_end` opts
    /// out of it; the returned transition carries it either way.
    pub fn on_signal<H: MediaElement + ?Sized>(
        &mut self,
        signal: MediaSignal,
        host: &mut H,
    ) -> SignalOutcome {
        let transition = self.machine.transition(signal);
        let mut paused_host = false;

        if transition.force_pause && self.settings.playback.force_pause_on_end {
            debug!("Forcing host pause on '{}'", signal);
            host.pause();
            paused_host = true;
        }

        let captions = match signal {
            MediaSignal::TimeUpdate | MediaSignal::Seeked { .. } => {
                let sync = self.sync_captions(host);
                paused_host |= sync.paused_host;
                sync.tracks
            }
            _ => Vec::new(),
        };

        SignalOutcome {
            transition,
            captions,
            paused_host,
        }
    }

    /// Pauses the host and rewinds it to the start
    pub fn stop<H: MediaElement + ?Sized>(&mut self, host: &mut H) -> CaptionSync {
        host.pause();
        host.seek(0.0);
        self.sync_captions(host)
    }
}

/// `en` matches `en` and `en-us`, ignoring case
fn matches_language(language: &str, preferred: &str) -> bool {
    let language = language.to_ascii_lowercase();
    let preferred = preferred.trim().to_ascii_lowercase();
    language == preferred || language.starts_with(&format!("{}-", preferred))
}
