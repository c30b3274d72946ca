//! Caption System Module
//!
//! Provides the timed-text side of the player:
//! - Cue data models (Cue, CueSettings, track enumerations)
//! - WebVTT and SRT parsing behind a closed format enumeration
//! - Cue tracks that reconcile active-cue membership against playback time
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caption System                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  models.rs     - Data structures (Cue, CueSettings, TrackMode)  │
//! │  formats.rs    - WebVTT/SRT parsing                             │
//! │  track.rs      - CueTrack and per-tick reconciliation           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use moovie_core::core::captions::{CaptionFormat, CueTrack, TrackKind, TrackMode};
//!
//! let mut track = CueTrack::create(TrackKind::Subtitles, "English", "en");
//! let report = track.load(CaptionFormat::WebVtt, &text)?;
//! track.set_mode(TrackMode::Showing);
//!
//! let batch = track.reconcile(4.0);
//! for idx in &batch.entered {
//!     println!("show {}", track.cue(*idx).map(|c| c.text.as_str()).unwrap_or(""));
//! }
//! ```

mod formats;
mod models;
mod track;

// Re-export models
pub use models::{
    AnchorAlign, Cue, CueId, CueIndex, CueSettings, LinePosition, ReadyState, TextAlign,
    TrackKind, TrackMode, WritingDirection,
};

// Re-export format dispatch
pub use formats::{parse, CaptionFormat, CueParser, ParsedCues, SrtParser, WebVttParser};

// Re-export the sync engine
pub use track::{CueChangeEvent, CueTrack, CueTrackId, CueTransitions, LoadReport};
