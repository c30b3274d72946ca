//! Caption Format Parsers
//!
//! Supports parsing captions in the following formats:
//! - VTT (WebVTT)
//! - SRT (SubRip)
//!
//! Both formats are blocks of lines separated by blank lines. Each block is
//! an optional identifier line, a `start --> end` timecode line, and zero or
//! more lines of payload text. A block that cannot be decomposed is skipped
//! and reported in [`ParsedCues::skipped`]; it never invalidates the file.
//!
//! # Example
//!
//! ```rust
//! use moovie_core::{parse, CaptionFormat};
//!
//! let vtt = "WEBVTT\n\n1\n00:00:01.000 --> 00:00:04.000\nHello world\n";
//! let parsed = parse(CaptionFormat::WebVtt, vtt).unwrap();
//! assert_eq!(parsed.cues[0].text, "Hello world");
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::models::{AnchorAlign, Cue, CueSettings, LinePosition, TextAlign, WritingDirection};
use crate::core::{CaptionError, CaptionResult, CueSyntaxError, CueSyntaxKind, TimeSec};

/// Literal token every WebVTT file starts with
const WEBVTT_HEADER: &str = "WEBVTT";

/// Separator between the start and end timestamps
const TIMECODE_ARROW: &str = "-->";

// =============================================================================
// Format Tags
// =============================================================================

/// Supported caption formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionFormat {
    /// WebVTT (.vtt)
    WebVtt,
    /// SubRip (.srt)
    Srt,
}

impl CaptionFormat {
    /// Returns the typical file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            CaptionFormat::WebVtt => "vtt",
            CaptionFormat::Srt => "srt",
        }
    }

    /// Returns the MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            CaptionFormat::WebVtt => "text/vtt",
            CaptionFormat::Srt => "application/x-subrip",
        }
    }

    /// Resolves a format from a file extension (case-insensitive, leading dot allowed)
    pub fn from_extension(ext: &str) -> CaptionResult<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "vtt" | "webvtt" => Ok(CaptionFormat::WebVtt),
            "srt" => Ok(CaptionFormat::Srt),
            _ => Err(CaptionError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Resolves a format from the extension of a path or URL
    pub fn from_path(path: impl AsRef<Path>) -> CaptionResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => Err(CaptionError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Resolves a format from a MIME type, ignoring parameters such as `charset`
    pub fn from_mime(mime: &str) -> CaptionResult<Self> {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        match essence.to_ascii_lowercase().as_str() {
            "text/vtt" => Ok(CaptionFormat::WebVtt),
            "application/x-subrip" | "text/srt" => Ok(CaptionFormat::Srt),
            _ => Err(CaptionError::UnsupportedFormat(mime.to_string())),
        }
    }

    /// Returns the parser for this format
    pub fn parser(&self) -> &'static dyn CueParser {
        match self {
            CaptionFormat::WebVtt => &WebVttParser,
            CaptionFormat::Srt => &SrtParser,
        }
    }
}

impl FromStr for CaptionFormat {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s)
    }
}

impl fmt::Display for CaptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionFormat::WebVtt => write!(f, "WebVTT"),
            CaptionFormat::Srt => write!(f, "SRT"),
        }
    }
}

// =============================================================================
// Parser Interface
// =============================================================================

/// Output of a successful parse
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCues {
    /// Cues in file order
    pub cues: Vec<Cue>,
    /// Blocks that were skipped, in file order
    pub skipped: Vec<CueSyntaxError>,
}

impl ParsedCues {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Turns raw caption text into cues
pub trait CueParser: Send + Sync {
    /// The format this parser accepts
    fn format(&self) -> CaptionFormat;

    /// Parses a whole file.
    ///
    /// Fails only when the text does not match the format's envelope.
    /// Malformed cue blocks are collected in [`ParsedCues::skipped`].
    fn parse(&self, text: &str) -> CaptionResult<ParsedCues>;
}

/// Parses caption text in the given format
pub fn parse(format: CaptionFormat, text: &str) -> CaptionResult<ParsedCues> {
    let parsed = format.parser().parse(text)?;

    for err in &parsed.skipped {
        warn!("Skipping malformed {} cue: {}", format, err);
    }
    debug!(
        "Parsed {} {} cues ({} skipped)",
        parsed.cues.len(),
        format,
        parsed.skipped.len()
    );

    Ok(parsed)
}

// =============================================================================
// VTT Format
// =============================================================================

/// WebVTT parser
///
/// # VTT Format
///
/// ```text
/// WEBVTT
///
/// intro
/// 00:00:01.000 --> 00:00:04.000 align:start position:10%
/// First caption text
///
/// 01:05.500 --> 01:08.000
/// Second caption text
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct WebVttParser;

impl CueParser for WebVttParser {
    fn format(&self) -> CaptionFormat {
        CaptionFormat::WebVtt
    }

    fn parse(&self, text: &str) -> CaptionResult<ParsedCues> {
        let normalized = normalize_line_endings(text);
        let mut blocks = split_blocks(&normalized).into_iter();

        let header = blocks
            .next()
            .ok_or_else(|| CaptionError::Format("empty WebVTT file".to_string()))?;
        if !is_webvtt_signature(header[0]) {
            return Err(CaptionError::Format(
                "WebVTT file must start with 'WEBVTT'".to_string(),
            ));
        }

        let mut parsed = ParsedCues::default();
        for (i, block) in blocks.enumerate() {
            if is_vtt_metadata_block(block[0]) {
                continue;
            }

            match parse_block(i + 1, &block, TimestampStyle::WebVtt) {
                Ok((mut cue, settings_text)) => {
                    cue.settings = parse_vtt_settings(settings_text);
                    parsed.cues.push(cue);
                }
                Err(e) => parsed.skipped.push(e),
            }
        }

        Ok(parsed)
    }
}

/// Checks the first line for `WEBVTT`, optionally followed by whitespace and text
fn is_webvtt_signature(line: &str) -> bool {
    match line.strip_prefix(WEBVTT_HEADER) {
        Some(rest) => rest.is_empty() || rest.starts_with([' ', '\t']),
        None => false,
    }
}

/// NOTE, STYLE and REGION blocks carry no cues
fn is_vtt_metadata_block(first_line: &str) -> bool {
    ["NOTE", "STYLE", "REGION"].iter().any(|keyword| {
        first_line
            .strip_prefix(keyword)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
    })
}

/// Parses the tokens after the end timestamp into layout settings.
///
/// Unknown or malformed settings are ignored and keep their defaults.
fn parse_vtt_settings(text: &str) -> CueSettings {
    let mut settings = CueSettings::default();

    for token in text.split_whitespace() {
        let Some((name, value)) = token.split_once(':') else {
            continue;
        };

        match name {
            "vertical" => match value {
                "rl" => settings.vertical = WritingDirection::Rl,
                "lr" => settings.vertical = WritingDirection::Lr,
                _ => {}
            },
            "line" => {
                let (position, align) = split_setting_align(value);
                if let Some(pct) = parse_percentage(position) {
                    settings.line = LinePosition::Value(pct);
                    settings.snap_to_lines = false;
                } else if let Ok(line) = position.parse::<i32>() {
                    settings.line = LinePosition::Value(line as f64);
                    settings.snap_to_lines = true;
                } else {
                    continue;
                }
                if let Some(align) = align.and_then(parse_anchor_align) {
                    settings.line_align = align;
                }
            }
            "position" => {
                let (position, align) = split_setting_align(value);
                if let Some(pct) = parse_percentage(position) {
                    settings.position = pct;
                    if let Some(align) = align.and_then(parse_anchor_align) {
                        settings.position_align = align;
                    }
                }
            }
            "size" => {
                if let Some(pct) = parse_percentage(value) {
                    settings.size = pct;
                }
            }
            "align" => {
                settings.align = match value {
                    "start" => TextAlign::Start,
                    "center" | "middle" => TextAlign::Middle,
                    "end" => TextAlign::End,
                    "left" => TextAlign::Left,
                    "right" => TextAlign::Right,
                    _ => continue,
                };
            }
            "region" if !value.is_empty() => settings.region = Some(value.to_string()),
            _ => {}
        }
    }

    settings
}

fn split_setting_align(value: &str) -> (&str, Option<&str>) {
    match value.split_once(',') {
        Some((position, align)) => (position, Some(align)),
        None => (value, None),
    }
}

fn parse_anchor_align(value: &str) -> Option<AnchorAlign> {
    match value {
        "start" | "line-left" => Some(AnchorAlign::Start),
        "center" | "middle" => Some(AnchorAlign::Middle),
        "end" | "line-right" => Some(AnchorAlign::End),
        _ => None,
    }
}

/// Parses `N%` with N in `0..=100`
fn parse_percentage(value: &str) -> Option<f64> {
    let pct: f64 = value.strip_suffix('%')?.parse().ok()?;
    (0.0..=100.0).contains(&pct).then_some(pct)
}

// =============================================================================
// SRT Format
// =============================================================================

/// SubRip parser
///
/// # SRT Format
///
/// ```text
/// 1
/// 00:00:01,000 --> 00:00:04,000
/// First caption text
///
/// 2
/// 00:00:05,500 --> 00:00:08,000
/// Second caption text
/// with multiple lines
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct SrtParser;

impl CueParser for SrtParser {
    fn format(&self) -> CaptionFormat {
        CaptionFormat::Srt
    }

    fn parse(&self, text: &str) -> CaptionResult<ParsedCues> {
        let normalized = normalize_line_endings(text);
        let mut parsed = ParsedCues::default();

        for (i, block) in split_blocks(&normalized).into_iter().enumerate() {
            // SRT has no cue settings; anything after the end timestamp is dropped.
            match parse_block(i + 1, &block, TimestampStyle::Srt) {
                Ok((cue, _)) => parsed.cues.push(cue),
                Err(e) => parsed.skipped.push(e),
            }
        }

        Ok(parsed)
    }
}

// =============================================================================
// Shared Block Parsing
// =============================================================================

/// Millisecond separators accepted by each format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimestampStyle {
    /// `.` only
    WebVtt,
    /// `,` as written by SubRip, `.` as written by many converters
    Srt,
}

impl TimestampStyle {
    fn accepts(&self, separator: &str) -> bool {
        match self {
            TimestampStyle::WebVtt => separator == ".",
            TimestampStyle::Srt => separator == "," || separator == ".",
        }
    }
}

/// Strips a UTF-8 BOM and converts `\r\n` / `\r` to `\n`
fn normalize_line_endings(text: &str) -> String {
    text.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Groups lines into blocks separated by one or more blank lines
fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Decomposes one block into a cue plus the raw text after the end timestamp
fn parse_block<'a>(
    block_number: usize,
    lines: &[&'a str],
    style: TimestampStyle,
) -> Result<(Cue, &'a str), CueSyntaxError> {
    let syntax_error = |id: Option<&str>, kind| CueSyntaxError::new(block_number, id, kind);

    let Some(first) = lines.first() else {
        return Err(syntax_error(None, CueSyntaxKind::EmptyBlock));
    };

    // The identifier line is optional: a block may open with its timecode.
    let (id, timing_line, text_lines) = if first.contains(TIMECODE_ARROW) {
        ("", *first, &lines[1..])
    } else {
        let id = first.trim();
        match lines.get(1) {
            Some(line) if line.contains(TIMECODE_ARROW) => (id, *line, &lines[2..]),
            _ => return Err(syntax_error(Some(id), CueSyntaxKind::MissingTimecode)),
        }
    };

    let Some((start_part, end_part)) = timing_line.split_once(TIMECODE_ARROW) else {
        return Err(syntax_error(Some(id), CueSyntaxKind::MissingTimecode));
    };

    let start_str = start_part.trim();
    let end_part = end_part.trim_start();
    let end_len = end_part
        .find(char::is_whitespace)
        .unwrap_or(end_part.len());
    let (end_str, settings_text) = end_part.split_at(end_len);

    let start = parse_timestamp(start_str, style).ok_or_else(|| {
        syntax_error(
            Some(id),
            CueSyntaxKind::InvalidTimestamp(start_str.to_string()),
        )
    })?;
    let end = parse_timestamp(end_str, style).ok_or_else(|| {
        syntax_error(Some(id), CueSyntaxKind::InvalidTimestamp(end_str.to_string()))
    })?;

    let text = text_lines.join("\n");
    Ok((Cue::new(id, start, end, &text), settings_text.trim()))
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(\d+):)?(\d{2}):(\d{2})([.,])(\d{3})$")
            .expect("timestamp pattern is a valid regex")
    })
}

/// Parses `[hh:]mm:ss.mmm` into seconds.
///
/// Hours, minutes and seconds are summed as integers; milliseconds are added
/// with a single division so long files do not accumulate drift.
fn parse_timestamp(ts: &str, style: TimestampStyle) -> Option<TimeSec> {
    let caps = timestamp_pattern().captures(ts)?;

    if !style.accepts(&caps[4]) {
        return None;
    }

    let hours: u64 = match caps.get(1) {
        Some(h) => h.as_str().parse().ok()?,
        None => 0,
    };
    let minutes: u64 = caps[2].parse().ok()?;
    let seconds: u64 = caps[3].parse().ok()?;
    let millis: u64 = caps[5].parse().ok()?;

    let whole = hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)?;
    Some(whole as f64 + millis as f64 / 1000.0)
}

// =============================================================================
// Tests
// =============================================================================
