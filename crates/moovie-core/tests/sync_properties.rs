//! End-to-end properties of parsing, reconciliation and state derivation,
//! exercised through the public API only.

use std::cell::RefCell;
use std::rc::Rc;

use moovie_core::core::captions::TrackKind;
use moovie_core::core::format_clock;
use moovie_core::{
    parse, CaptionFormat, CueIndex, CueTrack, MediaElement, MediaSignal, PlaybackState,
    PlaybackStateMachine, TrackMode, Transition,
};

const SAMPLE_VTT: &str = "WEBVTT

1
00:00:01.000 --> 00:00:04.000
Hello world

2
00:00:04.000 --> 00:00:06.500
Goodbye
";

fn showing_track(text: &str) -> CueTrack {
    let mut track = CueTrack::create(TrackKind::Subtitles, "English", "en");
    track.load(CaptionFormat::WebVtt, text).unwrap();
    track.set_mode(TrackMode::Showing);
    track
}

fn active_texts(track: &CueTrack) -> Vec<String> {
    track.active_cues().map(|c| c.text.clone()).collect()
}

// -----------------------------------------------------------------------------
// Timecodes
// -----------------------------------------------------------------------------

#[test]
fn timecodes_reformat_to_the_nearest_second() {
    let cases = [
        ("00:00:01.000", "0:01"),
        ("00:01:05.499", "1:05"),
        ("00:01:05.500", "1:06"),
        ("59:59.000", "59:59"),
        ("01:02:03.400", "1:02:03"),
        ("10:00:00.999", "10:00:01"),
    ];

    for (timecode, expected) in cases {
        let text = format!("WEBVTT\n\n{} --> 99:00:00.000\ncue\n", timecode);
        let parsed = parse(CaptionFormat::WebVtt, &text).unwrap();
        assert_eq!(format_clock(parsed.cues[0].start_sec), expected, "{}", timecode);
    }
}

// -----------------------------------------------------------------------------
// Reconciliation
// -----------------------------------------------------------------------------

#[test]
fn second_reconcile_at_same_time_is_empty() {
    let mut track = showing_track(SAMPLE_VTT);

    for t in [0.5, 1.0, 3.0, 4.0, 6.4, 7.0, 2.0] {
        track.reconcile(t);
        let again = track.reconcile(t);
        assert!(again.entered.is_empty(), "entered again at {}", t);
        assert!(again.exited.is_empty(), "exited again at {}", t);
    }
}

#[test]
fn shared_boundary_reports_exit_and_entry_together() {
    let mut track = showing_track(SAMPLE_VTT);

    track.reconcile(3.0);
    let batch = track.reconcile(4.0);

    assert_eq!(batch.exited, vec![CueIndex(0)]);
    assert_eq!(batch.entered, vec![CueIndex(1)]);
}

#[test]
fn backward_seek_leaves_no_stale_membership() {
    let mut track = showing_track(
        "WEBVTT\n\nA\n00:00.000 --> 00:05.000\nA\n\nB\n00:10.000 --> 00:15.000\nB\n",
    );

    assert_eq!(track.reconcile(12.0).entered, vec![CueIndex(1)]);

    let batch = track.reconcile(2.0);
    assert_eq!(batch.exited, vec![CueIndex(1)]);
    assert_eq!(batch.entered, vec![CueIndex(0)]);
    assert_eq!(active_texts(&track), vec!["A"]);
}

#[test]
fn disabled_track_stays_silent_until_shown() {
    let mut track = showing_track(SAMPLE_VTT);
    track.set_mode(TrackMode::Disabled);

    for t in [0.0, 1.5, 4.0, 5.0, 100.0] {
        assert!(track.reconcile(t).is_empty());
    }

    track.set_mode(TrackMode::Showing);
    let batch = track.reconcile(5.0);
    assert_eq!(batch.entered, vec![CueIndex(1)]);
}

#[test]
fn sample_file_end_to_end() {
    let parsed = parse(CaptionFormat::WebVtt, SAMPLE_VTT).unwrap();
    assert!(parsed.is_clean());
    assert_eq!(parsed.cues.len(), 2);
    assert_eq!(
        (parsed.cues[0].start_sec, parsed.cues[0].end_sec, parsed.cues[0].text.as_str()),
        (1.0, 4.0, "Hello world")
    );
    assert_eq!(
        (parsed.cues[1].start_sec, parsed.cues[1].end_sec, parsed.cues[1].text.as_str()),
        (4.0, 6.5, "Goodbye")
    );

    let mut track = showing_track(SAMPLE_VTT);
    assert!(track.reconcile(0.5).is_empty());
    assert!(active_texts(&track).is_empty());

    track.reconcile(2.0);
    let batch = track.reconcile(4.0);
    assert_eq!(batch.exited, vec![CueIndex(0)]);
    assert_eq!(batch.entered, vec![CueIndex(1)]);
    assert_eq!(active_texts(&track), vec!["Goodbye"]);
}

#[test]
fn listener_sees_one_batch_per_tick() {
    let mut track = showing_track(SAMPLE_VTT);
    let batches = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&batches);
    track.subscribe(move |event| {
        sink.borrow_mut()
            .push((event.exited.len(), event.entered.len()))
    });

    track.reconcile(2.0);
    track.reconcile(4.0);
    track.reconcile(4.0);

    assert_eq!(*batches.borrow(), vec![(0, 1), (1, 1)]);
}

// -----------------------------------------------------------------------------
// Playback State
// -----------------------------------------------------------------------------

struct LoadedHost;

impl MediaElement for LoadedHost {
    fn current_time(&self) -> f64 {
        0.0
    }
    fn duration(&self) -> f64 {
        120.0
    }
    fn has_metadata(&self) -> bool {
        true
    }
    fn paused(&self) -> bool {
        true
    }
    fn pause(&mut self) {}
    fn seek(&mut self, _time_sec: f64) {}
}

#[test]
fn attach_to_loaded_host_replays_load_sequence_first() {
    let mut machine = PlaybackStateMachine::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    machine.subscribe(move |t: &Transition| sink.borrow_mut().push(t.signal));

    machine.attach(&LoadedHost);
    machine.transition(MediaSignal::Play);

    assert_eq!(
        *seen.borrow(),
        vec![
            MediaSignal::LoadStart,
            MediaSignal::DurationChange,
            MediaSignal::LoadedMetadata,
            MediaSignal::Play,
        ]
    );
    assert_eq!(machine.state(), PlaybackState::Playing);
}
