//! Media Lifecycle Signals
//!
//! The closed set of notifications a media host can emit. Each variant maps
//! to one named media event; [`MediaSignal::name`] and [`FromStr`] convert
//! between the two at the host boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A change in the host media's loading or playback condition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MediaSignal {
    /// Resource selection started
    LoadStart,
    Progress,
    Suspend,
    Abort,
    /// Fetching or decoding failed
    Error,
    Emptied,
    Stalled,
    /// A play request was accepted
    Play,
    /// A pause request was accepted
    Pause,
    /// Duration and dimensions are known
    LoadedMetadata,
    LoadedData,
    /// Playback stopped for lack of data
    Waiting,
    /// Playback is running
    Playing,
    CanPlay,
    CanPlayThrough,
    /// A seek started
    Seeking,
    /// A seek finished; `paused` is the host's paused flag at that moment
    Seeked { paused: bool },
    TimeUpdate,
    /// Playback reached the end of the media
    Ended,
    RateChange,
    DurationChange,
    VolumeChange,
}

impl MediaSignal {
    /// Event name as emitted by the host
    pub fn name(&self) -> &'static str {
        match self {
            MediaSignal::LoadStart => "loadstart",
            MediaSignal::Progress => "progress",
            MediaSignal::Suspend => "suspend",
            MediaSignal::Abort => "abort",
            MediaSignal::Error => "error",
            MediaSignal::Emptied => "emptied",
            MediaSignal::Stalled => "stalled",
            MediaSignal::Play => "play",
            MediaSignal::Pause => "pause",
            MediaSignal::LoadedMetadata => "loadedmetadata",
            MediaSignal::LoadedData => "loadeddata",
            MediaSignal::Waiting => "waiting",
            MediaSignal::Playing => "playing",
            MediaSignal::CanPlay => "canplay",
            MediaSignal::CanPlayThrough => "canplaythrough",
            MediaSignal::Seeking => "seeking",
            MediaSignal::Seeked { .. } => "seeked",
            MediaSignal::TimeUpdate => "timeupdate",
            MediaSignal::Ended => "ended",
            MediaSignal::RateChange => "ratechange",
            MediaSignal::DurationChange => "durationchange",
            MediaSignal::VolumeChange => "volumechange",
        }
    }

    /// Signals synthesized when attaching to a host that already has metadata
    pub const ATTACH_REPLAY: [MediaSignal; 3] = [
        MediaSignal::LoadStart,
        MediaSignal::DurationChange,
        MediaSignal::LoadedMetadata,
    ];
}

impl fmt::Display for MediaSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MediaSignal {
    type Err = String;

    /// Parses an event name. `seeked` assumes the host is paused.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let signal = match s.trim().to_ascii_lowercase().as_str() {
            "loadstart" => MediaSignal::LoadStart,
            "progress" => MediaSignal::Progress,
            "suspend" => MediaSignal::Suspend,
            "abort" => MediaSignal::Abort,
            "error" => MediaSignal::Error,
            "emptied" => MediaSignal::Emptied,
            "stalled" => MediaSignal::Stalled,
            "play" => MediaSignal::Play,
            "pause" => MediaSignal::Pause,
            "loadedmetadata" => MediaSignal::LoadedMetadata,
            "loadeddata" => MediaSignal::LoadedData,
            "waiting" => MediaSignal::Waiting,
            "playing" => MediaSignal::Playing,
            "canplay" => MediaSignal::CanPlay,
            "canplaythrough" => MediaSignal::CanPlayThrough,
            "seeking" => MediaSignal::Seeking,
            "seeked" => MediaSignal::Seeked { paused: true },
            "timeupdate" => MediaSignal::TimeUpdate,
            "ended" => MediaSignal::Ended,
            "ratechange" => MediaSignal::RateChange,
            "durationchange" => MediaSignal::DurationChange,
            "volumechange" => MediaSignal::VolumeChange,
            other => return Err(format!("Unknown media signal: {}", other)),
        };
        Ok(signal)
    }
}
