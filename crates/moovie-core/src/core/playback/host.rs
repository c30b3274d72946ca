//! Media Host Interface
//!
//! The subset of a media element the engine reads and drives. Hosts are a
//! browser media element behind bindings, the CLI's scripted clock, or a test
//! double.

use crate::core::TimeSec;

/// A playable media resource
pub trait MediaElement {
    /// Current playback position in seconds
    fn current_time(&self) -> TimeSec;

    /// Media duration in seconds; `NaN` until metadata is known
    fn duration(&self) -> TimeSec;

    /// True once the host's ready state has reached metadata
    fn has_metadata(&self) -> bool;

    /// The host's own paused flag
    fn paused(&self) -> bool;

    /// Asks the host to pause
    fn pause(&mut self);

    /// Moves the playback position
    fn seek(&mut self, time_sec: TimeSec);
}
