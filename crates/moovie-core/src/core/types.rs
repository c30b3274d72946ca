//! Moovie Core Type Definitions
//!
//! Defines fundamental types used throughout the project.

use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Formats a playback position for display.
///
/// Produces `h:mm:ss` when the position is an hour or longer and `m:ss`
/// otherwise; the hour field and its leading zero are omitted when hours = 0.
/// Non-finite and negative input renders as `0:00`.
pub fn format_clock(seconds: TimeSec) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.round() as u64;
    let hours = total / 3600;
    let minutes = total % 3600 / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Time range
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
}

impl TimeRange {
    /// Creates a range as given; an inverted range is kept and simply contains nothing
    pub fn new(start_sec: TimeSec, end_sec: TimeSec) -> Self {
        Self { start_sec, end_sec }
    }

    /// Returns duration in seconds (negative for an inverted range)
    pub fn duration(&self) -> TimeSec {
        self.end_sec - self.start_sec
    }

    /// Checks if a given time is within the half-open range `[start, end)`.
    ///
    /// A zero-length range contains exactly its start.
    pub fn contains(&self, time: TimeSec) -> bool {
        if self.end_sec == self.start_sec {
            return time == self.start_sec;
        }
        time >= self.start_sec && time < self.end_sec
    }

    /// Returns true when `end < start`
    pub fn is_inverted(&self) -> bool {
        self.end_sec < self.start_sec
    }
}

// =============================================================================
// Spatial Types
// =============================================================================

/// Ratio (for aspect ratio, etc.)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    /// Numerator
    pub num: u32,
    /// Denominator
    pub den: u32,
}

impl Ratio {
    /// Creates a new ratio with validation
    pub fn new(num: u32, den: u32) -> Self {
        if den == 0 {
            warn!("Ratio created with zero denominator, defaulting to 1");
            return Self { num, den: 1 };
        }
        Self { num, den }
    }

    /// Converts to floating point value
    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }

    /// Reduces the ratio to its smallest integer form (e.g. 1920:1080 -> 16:9)
    pub fn reduced(&self) -> Self {
        if self.num == self.den {
            return Self { num: 1, den: 1 };
        }

        let divisor = gcd(self.num, self.den);
        if divisor == 0 {
            return *self;
        }

        Self {
            num: self.num / divisor,
            den: self.den / divisor,
        }
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Self { num: 16, den: 9 }
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size2D {
    pub width: u32,
    pub height: u32,
}

impl Size2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scales this size to fit inside `bounds`, preserving aspect ratio.
    ///
    /// The result touches at least one edge of `bounds`. A zero-sized source
    /// cannot be scaled and yields a zero size.
    pub fn fit_within(&self, bounds: Size2D) -> Size2D {
        if self.width == 0 || self.height == 0 {
            return Size2D::new(0, 0);
        }

        let ratio = f64::min(
            bounds.width as f64 / self.width as f64,
            bounds.height as f64 / self.height as f64,
        );

        Size2D {
            width: (self.width as f64 * ratio).round() as u32,
            height: (self.height as f64 * ratio).round() as u32,
        }
    }

    /// Aspect ratio in lowest terms
    pub fn aspect_ratio(&self) -> Ratio {
        Ratio::new(self.width, self.height).reduced()
    }
}
