//! Cue Track
//!
//! A track owns one parsed cue list and the live set of cues active at the
//! current playback position. Membership only changes through
//! [`CueTrack::reconcile`], [`CueTrack::set_mode`] and the load/unload calls.
//!
//! # Reconciliation
//!
//! Each tick runs an exit pass over the active set and then an entry pass over
//! the full cue list. Nothing is assumed about cue ordering, so backward seeks
//! and overlapping cues are handled by the same two passes. Listeners see one
//! complete batch per tick, after both passes have finished.
//!
//! Delivery is synchronous inside `reconcile`, which holds `&mut self`, so a
//! track cannot be unloaded or removed while a batch is still being delivered.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::formats::{parse, CaptionFormat};
use super::models::{Cue, CueIndex, ReadyState, TrackKind, TrackMode};
use crate::core::events::{SubscriptionId, Subscribers};
use crate::core::{CaptionResult, CueSyntaxError, TimeSec};

/// Track identifier (ULID)
pub type CueTrackId = String;

// =============================================================================
// Transition Batches
// =============================================================================

/// Membership changes produced by one reconciliation tick
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueTransitions {
    /// Cues that became active, in cue-list order
    pub entered: Vec<CueIndex>,
    /// Cues that stopped being active, in activation order
    pub exited: Vec<CueIndex>,
    /// At least one exited cue asked for playback to pause
    pub pause_requested: bool,
}

impl CueTransitions {
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

/// Batch delivered to track listeners.
///
/// Carries copies of the affected cues because listeners run while the track
/// is still mutably borrowed by `reconcile`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueChangeEvent {
    pub track_id: CueTrackId,
    pub time_sec: TimeSec,
    pub mode: TrackMode,
    pub entered: Vec<Cue>,
    pub exited: Vec<Cue>,
    pub pause_requested: bool,
}

/// Summary of a successful [`CueTrack::load`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Number of cues now owned by the track
    pub cue_count: usize,
    /// Blocks dropped while parsing
    pub skipped: Vec<CueSyntaxError>,
}

// =============================================================================
// Cue Track
// =============================================================================

/// One caption track and its active-cue membership
#[derive(Debug)]
pub struct CueTrack {
    id: CueTrackId,
    /// What the track is for
    pub kind: TrackKind,
    /// Display label
    pub label: String,
    /// Language code (e.g., "en", "ko", "ja")
    pub language: String,
    /// Whether the track should be shown when loaded
    pub is_default: bool,
    format: Option<CaptionFormat>,
    ready_state: ReadyState,
    mode: TrackMode,
    cues: Vec<Cue>,
    /// Active cues in activation order
    active: Vec<CueIndex>,
    /// Cues marked pause-on-exit after parsing
    pause_marks: BTreeSet<CueIndex>,
    listeners: Subscribers<CueChangeEvent>,
}

impl CueTrack {
    /// Creates an empty, disabled track
    pub fn new(id: &str, kind: TrackKind, label: &str, language: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            label: label.to_string(),
            language: language.to_string(),
            is_default: false,
            format: None,
            ready_state: ReadyState::None,
            mode: TrackMode::Disabled,
            cues: Vec::new(),
            active: Vec::new(),
            pause_marks: BTreeSet::new(),
            listeners: Subscribers::new(),
        }
    }

    /// Creates a track with auto-generated ID
    pub fn create(kind: TrackKind, label: &str, language: &str) -> Self {
        Self::new(&ulid::Ulid::new().to_string(), kind, label, language)
    }

    /// Marks the track as the default for its kind
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> TrackMode {
        self.mode
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Format of the loaded source, if any
    pub fn format(&self) -> Option<CaptionFormat> {
        self.format
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn cue(&self, index: CueIndex) -> Option<&Cue> {
        self.cues.get(index.0)
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Indices of active cues, in activation order
    pub fn active_indices(&self) -> &[CueIndex] {
        &self.active
    }

    /// Active cues, in activation order
    pub fn active_cues(&self) -> impl Iterator<Item = &Cue> + '_ {
        self.active.iter().filter_map(|idx| self.cues.get(idx.0))
    }

    pub fn is_active(&self, index: CueIndex) -> bool {
        self.active.contains(&index)
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Marks the source as being fetched by the host
    pub fn begin_loading(&mut self) {
        self.ready_state = ReadyState::Loading;
    }

    /// Replaces the cue list with the result of parsing `text`.
    ///
    /// The active set is cleared without exit events. On success the track is
    /// `Loaded` and, when any cue parsed, switched to `Showing` if it is the
    /// default track and `Hidden` otherwise. On a format error the track is
    /// left empty, `Disabled` and in the `Error` ready state.
    pub fn load(&mut self, format: CaptionFormat, text: &str) -> CaptionResult<LoadReport> {
        self.ready_state = ReadyState::Loading;
        self.active.clear();
        self.pause_marks.clear();
        self.cues.clear();

        let parsed = match parse(format, text) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Failed to load {} track '{}': {}", format, self.label, e);
                self.format = None;
                self.mode = TrackMode::Disabled;
                self.ready_state = ReadyState::Error;
                return Err(e);
            }
        };

        self.cues = parsed.cues;
        self.format = Some(format);
        self.ready_state = ReadyState::Loaded;

        if !self.cues.is_empty() {
            self.mode = if self.is_default {
                TrackMode::Showing
            } else {
                TrackMode::Hidden
            };
        }

        info!(
            "Loaded {} track '{}' ({}): {} cues, {} skipped",
            format,
            self.label,
            self.language,
            self.cues.len(),
            parsed.skipped.len()
        );

        Ok(LoadReport {
            cue_count: self.cues.len(),
            skipped: parsed.skipped,
        })
    }

    /// Drops all cues and resets the track, without exit events
    pub fn unload(&mut self) {
        self.cues.clear();
        self.active.clear();
        self.pause_marks.clear();
        self.format = None;
        self.mode = TrackMode::Disabled;
        self.ready_state = ReadyState::None;
        debug!("Unloaded track '{}'", self.label);
    }

    /// Marks or unmarks a cue as pause-on-exit. Returns false for an unknown
    /// index.
    ///
    /// The parsed cue is left untouched; the mark lives on the track until the
    /// next load or unload.
    pub fn set_pause_on_exit(&mut self, index: CueIndex, pause_on_exit: bool) -> bool {
        if index.0 >= self.cues.len() {
            return false;
        }
        if pause_on_exit {
            self.pause_marks.insert(index);
        } else {
            self.pause_marks.remove(&index);
        }
        true
    }

    /// Whether leaving the cue requests a pause
    pub fn pauses_on_exit(&self, index: CueIndex) -> bool {
        self.pause_marks.contains(&index)
            || self.cues.get(index.0).is_some_and(Cue::pause_on_exit)
    }

    // -------------------------------------------------------------------------
    // Synchronization
    // -------------------------------------------------------------------------

    /// Changes the track mode.
    ///
    /// Entering `Disabled` clears the active set without exit events. Leaving
    /// it lets the next `reconcile` compute membership from scratch.
    pub fn set_mode(&mut self, mode: TrackMode) {
        if mode == self.mode {
            return;
        }

        if mode == TrackMode::Disabled {
            self.active.clear();
        }

        debug!("Track '{}' mode {:?} -> {:?}", self.label, self.mode, mode);
        self.mode = mode;
    }

    /// Recomputes active membership for `time_sec`.
    ///
    /// Returns an empty batch when the track is disabled or the time is not
    /// finite. Listeners are notified once, after both passes, and only when
    /// membership changed.
    pub fn reconcile(&mut self, time_sec: TimeSec) -> CueTransitions {
        let mut transitions = CueTransitions::default();

        if !self.mode.is_enabled() {
            return transitions;
        }
        if !time_sec.is_finite() {
            warn!("Ignoring non-finite playback time for track '{}'", self.label);
            return transitions;
        }

        // Exit pass
        let cues = &self.cues;
        let marks = &self.pause_marks;
        self.active.retain(|&idx| {
            let cue = &cues[idx.0];
            if cue.is_active_at(time_sec) {
                return true;
            }
            if cue.pause_on_exit() || marks.contains(&idx) {
                transitions.pause_requested = true;
            }
            transitions.exited.push(idx);
            false
        });

        // Entry pass
        for (i, cue) in self.cues.iter().enumerate() {
            let idx = CueIndex(i);
            if cue.is_active_at(time_sec) && !self.active.contains(&idx) {
                self.active.push(idx);
                transitions.entered.push(idx);
            }
        }

        if !transitions.is_empty() {
            debug!(
                "Track '{}' at {:.3}s: {} entered, {} exited{}",
                self.label,
                time_sec,
                transitions.entered.len(),
                transitions.exited.len(),
                if transitions.pause_requested {
                    ", pause requested"
                } else {
                    ""
                }
            );
            self.notify(time_sec, &transitions);
        }

        transitions
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Registers a listener for membership batches
    pub fn subscribe(&mut self, listener: impl FnMut(&CueChangeEvent) + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn notify(&mut self, time_sec: TimeSec, transitions: &CueTransitions) {
        if self.listeners.is_empty() {
            return;
        }

        let collect = |indices: &[CueIndex]| -> Vec<Cue> {
            indices
                .iter()
                .filter_map(|idx| self.cues.get(idx.0).cloned())
                .collect()
        };

        let event = CueChangeEvent {
            track_id: self.id.clone(),
            time_sec,
            mode: self.mode,
            entered: collect(&transitions.entered),
            exited: collect(&transitions.exited),
            pause_requested: transitions.pause_requested,
        };

        self.listeners.emit(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SAMPLE_VTT: &str = "WEBVTT

1
00:00:01.000 --> 00:00:04.000
Hello world

2
00:00:04.000 --> 00:00:06.500
Goodbye
";

    fn track_with(cues: &[(f64, f64)]) -> CueTrack {
        let mut text = String::from("WEBVTT\n");
        for (i, (start, end)) in cues.iter().enumerate() {
            text.push_str(&format!(
                "\n{}\n{} --> {}\ncue {}\n",
                i + 1,
                vtt_time(*start),
                vtt_time(*end),
                i + 1
            ));
        }

        let mut track = CueTrack::create(TrackKind::Subtitles, "Test", "en");
        track.load(CaptionFormat::WebVtt, &text).unwrap();
        track.set_mode(TrackMode::Showing);
        track
    }

    fn vtt_time(sec: f64) -> String {
        let millis = (sec * 1000.0).round() as u64;
        format!(
            "{:02}:{:02}:{:02}.{:03}",
            millis / 3_600_000,
            millis / 60_000 % 60,
            millis / 1000 % 60,
            millis % 1000
        )
    }

    // -------------------------------------------------------------------------
    // Reconcile Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_reconcile_enters_and_exits() {
        let mut track = track_with(&[(1.0, 4.0)]);

        assert!(track.reconcile(0.5).is_empty());

        let batch = track.reconcile(2.0);
        assert_eq!(batch.entered, vec![CueIndex(0)]);
        assert!(batch.exited.is_empty());
        assert!(track.is_active(CueIndex(0)));

        let batch = track.reconcile(4.5);
        assert!(batch.entered.is_empty());
        assert_eq!(batch.exited, vec![CueIndex(0)]);
        assert_eq!(track.active_cues().count(), 0);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut track = track_with(&[(1.0, 4.0), (2.0, 6.0)]);

        let first = track.reconcile(3.0);
        assert_eq!(first.entered, vec![CueIndex(0), CueIndex(1)]);

        let second = track.reconcile(3.0);
        assert_eq!(second, CueTransitions::default());
    }

    #[test]
    fn test_shared_boundary_exits_then_enters() {
        let mut track = CueTrack::create(TrackKind::Captions, "Sample", "en");
        track.load(CaptionFormat::WebVtt, SAMPLE_VTT).unwrap();
        track.set_mode(TrackMode::Showing);

        track.reconcile(2.0);
        let batch = track.reconcile(4.0);

        assert_eq!(batch.exited, vec![CueIndex(0)]);
        assert_eq!(batch.entered, vec![CueIndex(1)]);
        let active: Vec<&str> = track.active_cues().map(|c| c.text.as_str()).collect();
        assert_eq!(active, vec!["Goodbye"]);
    }

    #[test]
    fn test_backward_seek_recomputes_membership() {
        let mut track = track_with(&[(0.0, 5.0), (10.0, 15.0)]);

        let batch = track.reconcile(12.0);
        assert_eq!(batch.entered, vec![CueIndex(1)]);

        let batch = track.reconcile(2.0);
        assert_eq!(batch.exited, vec![CueIndex(1)]);
        assert_eq!(batch.entered, vec![CueIndex(0)]);
        assert_eq!(track.active_indices(), &[CueIndex(0)]);
    }

    #[test]
    fn test_overlapping_cues_are_all_active() {
        let mut track = track_with(&[(0.0, 10.0), (2.0, 4.0), (3.0, 8.0)]);

        let batch = track.reconcile(3.5);
        assert_eq!(batch.entered.len(), 3);

        let batch = track.reconcile(5.0);
        assert_eq!(batch.exited, vec![CueIndex(1)]);
        assert!(batch.entered.is_empty());
    }

    #[test]
    fn test_unsorted_cues() {
        let mut track = track_with(&[(10.0, 12.0), (1.0, 3.0)]);

        let batch = track.reconcile(2.0);
        assert_eq!(batch.entered, vec![CueIndex(1)]);
    }

    #[test]
    fn test_inverted_cue_never_enters() {
        let mut track = track_with(&[(6.0, 3.0)]);
        assert_eq!(track.len(), 1);

        for t in [2.0, 3.0, 4.5, 6.0, 7.0] {
            assert!(track.reconcile(t).is_empty());
        }
    }

    #[test]
    fn test_non_finite_time_is_ignored() {
        let mut track = track_with(&[(0.0, 5.0)]);
        track.reconcile(1.0);

        assert!(track.reconcile(f64::NAN).is_empty());
        assert!(track.reconcile(f64::INFINITY).is_empty());
        assert!(track.is_active(CueIndex(0)));
    }

    #[test]
    fn test_pause_on_exit_is_reported() {
        let mut track = CueTrack::create(TrackKind::Subtitles, "Test", "en");
        track
            .load(
                CaptionFormat::WebVtt,
                "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nStop here\n",
            )
            .unwrap();
        track.set_mode(TrackMode::Showing);
        assert!(track.set_pause_on_exit(CueIndex(0), true));
        assert!(!track.set_pause_on_exit(CueIndex(5), true));
        assert!(track.pauses_on_exit(CueIndex(0)));
        assert!(!track.cues()[0].pause_on_exit());

        assert!(!track.reconcile(1.5).pause_requested);
        let batch = track.reconcile(2.5);
        assert!(batch.pause_requested);
        assert_eq!(batch.exited, vec![CueIndex(0)]);
    }

    #[test]
    fn test_pause_marks_reset_on_reload() {
        let vtt = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nStop here\n";
        let mut track = CueTrack::create(TrackKind::Subtitles, "Test", "en");
        track.load(CaptionFormat::WebVtt, vtt).unwrap();
        track.set_pause_on_exit(CueIndex(0), true);

        track.load(CaptionFormat::WebVtt, vtt).unwrap();
        track.set_mode(TrackMode::Showing);
        assert!(!track.pauses_on_exit(CueIndex(0)));

        track.reconcile(1.5);
        assert!(!track.reconcile(2.5).pause_requested);
    }

    #[test]
    fn test_zero_length_cue_enters_then_exits() {
        let mut track = track_with(&[(2.0, 2.0)]);

        assert!(track.reconcile(1.5).is_empty());
        assert_eq!(track.reconcile(2.0).entered, vec![CueIndex(0)]);
        assert!(track.reconcile(2.0).is_empty());

        let batch = track.reconcile(2.25);
        assert_eq!(batch.exited, vec![CueIndex(0)]);
        assert!(batch.entered.is_empty());
    }

    // -------------------------------------------------------------------------
    // Mode Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_disabled_suppresses_transitions() {
        let mut track = track_with(&[(1.0, 4.0)]);
        track.set_mode(TrackMode::Disabled);

        for t in [0.0, 2.0, 3.0, 5.0] {
            assert!(track.reconcile(t).is_empty());
        }

        track.set_mode(TrackMode::Showing);
        let batch = track.reconcile(2.0);
        assert_eq!(batch.entered, vec![CueIndex(0)]);
    }

    #[test]
    fn test_disabling_clears_active_without_events() {
        let mut track = track_with(&[(1.0, 4.0)]);
        let events = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&events);
        track.subscribe(move |_| *counter.borrow_mut() += 1);

        track.reconcile(2.0);
        assert_eq!(*events.borrow(), 1);

        track.set_mode(TrackMode::Disabled);
        assert!(track.active_indices().is_empty());
        assert_eq!(*events.borrow(), 1);

        // Re-enabling inside the window fires a fresh entry
        track.set_mode(TrackMode::Hidden);
        assert_eq!(track.reconcile(2.0).entered, vec![CueIndex(0)]);
        assert_eq!(*events.borrow(), 2);
    }

    #[test]
    fn test_hidden_and_showing_are_equivalent() {
        let mut showing = track_with(&[(0.0, 2.0), (1.0, 3.0), (5.0, 6.0)]);
        let mut hidden = track_with(&[(0.0, 2.0), (1.0, 3.0), (5.0, 6.0)]);
        hidden.set_mode(TrackMode::Hidden);

        for t in [0.5, 1.5, 2.5, 5.5, 1.0, 7.0] {
            assert_eq!(showing.reconcile(t), hidden.reconcile(t));
        }
    }

    // -------------------------------------------------------------------------
    // Listener Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_listener_receives_complete_batch() {
        let mut track = CueTrack::new("track-1", TrackKind::Subtitles, "Sample", "en");
        track.load(CaptionFormat::WebVtt, SAMPLE_VTT).unwrap();
        track.set_mode(TrackMode::Showing);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = track.subscribe(move |event: &CueChangeEvent| sink.borrow_mut().push(event.clone()));

        track.reconcile(2.0);
        track.reconcile(2.0);
        track.reconcile(4.0);

        {
            let events = seen.borrow();
            assert_eq!(events.len(), 2);
            assert_eq!(events[1].track_id, "track-1");
            assert_eq!(events[1].time_sec, 4.0);
            assert_eq!(events[1].exited[0].text, "Hello world");
            assert_eq!(events[1].entered[0].text, "Goodbye");
        }

        assert!(track.unsubscribe(id));
        track.reconcile(10.0);
        assert_eq!(seen.borrow().len(), 2);
    }

    // -------------------------------------------------------------------------
    // Load Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_load_sets_mode_from_default_flag() {
        let mut other = CueTrack::create(TrackKind::Subtitles, "Other", "fr");
        other.load(CaptionFormat::WebVtt, SAMPLE_VTT).unwrap();
        assert_eq!(other.mode(), TrackMode::Hidden);
        assert_eq!(other.ready_state(), ReadyState::Loaded);

        let mut default = CueTrack::create(TrackKind::Subtitles, "Main", "en").with_default(true);
        let report = default.load(CaptionFormat::WebVtt, SAMPLE_VTT).unwrap();
        assert_eq!(default.mode(), TrackMode::Showing);
        assert_eq!(report.cue_count, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(default.format(), Some(CaptionFormat::WebVtt));
    }

    #[test]
    fn test_load_with_no_cues_keeps_mode() {
        let mut track = CueTrack::create(TrackKind::Subtitles, "Empty", "en");
        let report = track.load(CaptionFormat::WebVtt, "WEBVTT\n").unwrap();

        assert_eq!(report.cue_count, 0);
        assert_eq!(track.mode(), TrackMode::Disabled);
        assert_eq!(track.ready_state(), ReadyState::Loaded);
    }

    #[test]
    fn test_load_reports_skipped_blocks() {
        let mut track = CueTrack::create(TrackKind::Subtitles, "Broken", "en");
        let text = "1\n00:00:01,000 --> 00:00:02,000\nGood\n\n2\nno timecode here\n";
        let report = track.load(CaptionFormat::Srt, text).unwrap();

        assert_eq!(report.cue_count, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].block, 2);
    }

    #[test]
    fn test_load_format_error_leaves_track_empty() {
        let mut track = track_with(&[(0.0, 5.0)]);
        track.reconcile(1.0);

        let result = track.load(CaptionFormat::WebVtt, "not a caption file");
        assert!(result.is_err());
        assert!(track.is_empty());
        assert!(track.active_indices().is_empty());
        assert_eq!(track.mode(), TrackMode::Disabled);
        assert_eq!(track.ready_state(), ReadyState::Error);
        assert!(track.reconcile(1.0).is_empty());
    }

    #[test]
    fn test_reload_replaces_cues_and_clears_active() {
        let mut track = track_with(&[(0.0, 5.0)]);
        track.reconcile(1.0);

        track.load(CaptionFormat::WebVtt, SAMPLE_VTT).unwrap();
        assert!(track.active_indices().is_empty());
        assert_eq!(track.len(), 2);

        let batch = track.reconcile(1.0);
        assert_eq!(batch.entered, vec![CueIndex(0)]);
        assert!(batch.exited.is_empty());
    }

    #[test]
    fn test_unload_resets_track() {
        let mut track = track_with(&[(0.0, 5.0)]);
        track.begin_loading();
        assert_eq!(track.ready_state(), ReadyState::Loading);
        track.reconcile(1.0);

        track.unload();
        assert!(track.is_empty());
        assert!(track.active_indices().is_empty());
        assert_eq!(track.mode(), TrackMode::Disabled);
        assert_eq!(track.ready_state(), ReadyState::None);
        assert_eq!(track.format(), None);
    }
}
