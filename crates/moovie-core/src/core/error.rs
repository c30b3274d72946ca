//! Moovie Error Definitions
//!
//! Defines error types used throughout the project.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Caption Errors
// =============================================================================

/// Why a single cue block could not be decomposed into id, timecode and text
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CueSyntaxKind {
    /// Block contained no lines at all
    EmptyBlock,
    /// No `start --> end` line where one was expected
    MissingTimecode,
    /// A timestamp did not match `[hh:]mm:ss.mmm`
    InvalidTimestamp(String),
}

impl fmt::Display for CueSyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBlock => write!(f, "empty cue block"),
            Self::MissingTimecode => write!(f, "missing 'start --> end' timecode line"),
            Self::InvalidTimestamp(ts) => write!(f, "invalid timestamp '{}'", ts),
        }
    }
}

/// A cue block that was skipped while parsing an otherwise valid file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueSyntaxError {
    /// 1-based position of the block among the file's cue blocks
    pub block: usize,
    /// Cue identifier, when one could be read before the failure
    pub cue_id: Option<String>,
    /// What went wrong
    pub kind: CueSyntaxKind,
}

impl CueSyntaxError {
    pub fn new(block: usize, cue_id: Option<&str>, kind: CueSyntaxKind) -> Self {
        Self {
            block,
            cue_id: cue_id.filter(|id| !id.is_empty()).map(str::to_string),
            kind,
        }
    }
}

impl fmt::Display for CueSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cue_id {
            Some(id) => write!(f, "cue block {} ('{}'): {}", self.block, id, self.kind),
            None => write!(f, "cue block {}: {}", self.block, self.kind),
        }
    }
}

impl std::error::Error for CueSyntaxError {}

/// Errors raised while turning caption text into cues
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptionError {
    /// Text does not match the declared format's envelope
    #[error("Invalid caption format: {0}")]
    Format(String),

    /// Format tag is neither WebVTT nor SRT
    #[error("Unsupported caption format: {0}")]
    UnsupportedFormat(String),

    /// A single cue block is malformed
    #[error(transparent)]
    CueSyntax(#[from] CueSyntaxError),
}

/// Caption parsing result type
pub type CaptionResult<T> = Result<T, CaptionError>;

// =============================================================================
// Core Errors
// =============================================================================

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Caption(#[from] CaptionError),

    #[error("Track not found: {0}")]
    TrackNotFound(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;
