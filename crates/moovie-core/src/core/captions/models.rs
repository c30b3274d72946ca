//! Caption Data Models
//!
//! Defines data structures for parsed cues and the per-track enumerations.
//!
//! # Overview
//!
//! A [`Cue`] is immutable once parsed. Layout settings are carried through
//! losslessly from WebVTT and defaulted for SRT; nothing in this crate renders
//! them.

use serde::{Deserialize, Serialize};

use crate::core::{TimeRange, TimeSec};

// =============================================================================
// Type Aliases
// =============================================================================

/// Format-provided cue identifier (may be empty, not unique)
pub type CueId = String;

/// Position of a cue inside its owning track's cue list.
///
/// Tracks hand out indices instead of references so cues never point back
/// at the track that owns them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CueIndex(pub usize);

// =============================================================================
// Cue Settings
// =============================================================================

/// Writing direction (`vertical` setting)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WritingDirection {
    /// Horizontal text (setting absent)
    #[default]
    Horizontal,
    /// Vertical, growing right to left
    Rl,
    /// Vertical, growing left to right
    Lr,
}

/// Line position (`line` setting)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum LinePosition {
    /// Placed by the renderer
    #[default]
    Auto,
    /// Line number (when `snap_to_lines`) or percentage
    Value(f64),
}

/// Alignment of a box anchor (`lineAlign`, `positionAlign`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorAlign {
    Start,
    Middle,
    End,
}

/// Text alignment within the cue box (`align` setting)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Start,
    #[default]
    Middle,
    End,
    Left,
    Right,
}

/// WebVTT layout fields.
///
/// Defaults match an unstyled WebVTT cue: horizontal, snapped to lines,
/// automatic line, centered at 50% with a 50% box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueSettings {
    pub region: Option<String>,
    pub vertical: WritingDirection,
    pub snap_to_lines: bool,
    pub line: LinePosition,
    pub line_align: AnchorAlign,
    /// Percentage of the video width
    pub position: f64,
    pub position_align: AnchorAlign,
    /// Percentage of the video width
    pub size: f64,
    pub align: TextAlign,
    pub pause_on_exit: bool,
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            region: None,
            vertical: WritingDirection::Horizontal,
            snap_to_lines: true,
            line: LinePosition::Auto,
            line_align: AnchorAlign::Start,
            position: 50.0,
            position_align: AnchorAlign::Middle,
            size: 50.0,
            align: TextAlign::Middle,
            pause_on_exit: false,
        }
    }
}

// =============================================================================
// Cue Entry
// =============================================================================

/// One timed caption unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    /// Identifier from the source file (empty when absent)
    pub id: CueId,
    /// Start time in seconds
    pub start_sec: TimeSec,
    /// End time in seconds
    pub end_sec: TimeSec,
    /// Payload text, markup left untouched
    pub text: String,
    /// Layout settings
    #[serde(default)]
    pub settings: CueSettings,
}

impl Cue {
    /// Creates a cue with default settings
    pub fn new(id: &str, start_sec: TimeSec, end_sec: TimeSec, text: &str) -> Self {
        Self {
            id: id.to_string(),
            start_sec,
            end_sec,
            text: text.to_string(),
            settings: CueSettings::default(),
        }
    }

    /// Sets layout settings
    pub fn with_settings(mut self, settings: CueSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Marks the cue as pausing playback when it exits
    pub fn with_pause_on_exit(mut self, pause_on_exit: bool) -> Self {
        self.settings.pause_on_exit = pause_on_exit;
        self
    }

    pub fn window(&self) -> TimeRange {
        TimeRange::new(self.start_sec, self.end_sec)
    }

    /// Returns true if `time_sec` lies in `[start, end)`.
    ///
    /// The end is exclusive so a cue ending at `t` and a cue starting at `t`
    /// are never active together. A zero-length cue is active only at its
    /// start, and a cue with `end < start` is never active.
    pub fn is_active_at(&self, time_sec: TimeSec) -> bool {
        self.window().contains(time_sec)
    }

    pub fn pause_on_exit(&self) -> bool {
        self.settings.pause_on_exit
    }
}

// =============================================================================
// Track Enumerations
// =============================================================================

/// Track visibility/eligibility mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackMode {
    /// No cue ever becomes active
    #[default]
    Disabled,
    /// Active cues tracked, not rendered
    Hidden,
    /// Active cues tracked and rendered
    Showing,
}

impl TrackMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, TrackMode::Disabled)
    }
}

/// What a track is for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    #[default]
    Subtitles,
    Captions,
    Descriptions,
    Chapters,
    Metadata,
}

/// Loading progress of a track's caption source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    /// No source loaded
    #[default]
    None,
    Loading,
    Loaded,
    /// Source text was rejected
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Cue Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_cue_creation_uses_default_settings() {
        let cue = Cue::new("1", 1.0, 4.0, "Hello world");
        assert_eq!(cue.id, "1");
        assert_eq!(cue.settings, CueSettings::default());
        assert!(!cue.pause_on_exit());
    }

    #[test]
    fn test_cue_active_window_is_half_open() {
        let cue = Cue::new("", 2.0, 5.0, "Test");

        assert!(!cue.is_active_at(1.999));
        assert!(cue.is_active_at(2.0));
        assert!(cue.is_active_at(3.5));
        assert!(cue.is_active_at(4.999));
        assert!(!cue.is_active_at(5.0));
    }

    #[test]
    fn test_zero_length_cue_active_only_at_start() {
        let cue = Cue::new("", 2.0, 2.0, "Flash");
        assert!(cue.is_active_at(2.0));
        assert!(!cue.is_active_at(1.5));
        assert!(!cue.is_active_at(2.5));
    }

    #[test]
    fn test_inverted_cue_never_active() {
        let cue = Cue::new("bad", 6.0, 3.0, "Backwards");
        for t in [2.0, 3.0, 4.5, 6.0, 7.0] {
            assert!(!cue.is_active_at(t));
        }
    }

    #[test]
    fn test_default_settings_match_webvtt_defaults() {
        let settings = CueSettings::default();
        assert_eq!(settings.vertical, WritingDirection::Horizontal);
        assert!(settings.snap_to_lines);
        assert_eq!(settings.line, LinePosition::Auto);
        assert_eq!(settings.line_align, AnchorAlign::Start);
        assert_eq!(settings.position, 50.0);
        assert_eq!(settings.position_align, AnchorAlign::Middle);
        assert_eq!(settings.size, 50.0);
        assert_eq!(settings.align, TextAlign::Middle);
    }

    // -------------------------------------------------------------------------
    // Serialization Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_cue_serialization() {
        let cue = Cue::new("intro", 1.5, 4.5, "Hello").with_pause_on_exit(true);
        let json = serde_json::to_string(&cue).unwrap();
        assert!(json.contains("\"startSec\":1.5"));
        assert!(json.contains("\"pauseOnExit\":true"));

        let parsed: Cue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cue);
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(serde_json::to_string(&TrackMode::Showing).unwrap(), "\"showing\"");
        assert_eq!(serde_json::to_string(&ReadyState::Loaded).unwrap(), "\"loaded\"");
    }
}
