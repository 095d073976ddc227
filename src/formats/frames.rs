/*!
 * Bracketed caption notations.
 *
 * `{a}{b}text` lines count frames. `[a][b]text` lines count frames only when
 * the file declares its rate with a `[0][0]<fps>` header; otherwise they are
 * MPL2 captions counting tenths of a second.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{SourceFormat, split_cue_text};
use crate::subtitle_processor::{CaptionDocument, checked_seconds_to_ms};

static LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([{\[])(\d+)[}\]][{\[](\d+)[}\]](.*)$").unwrap()
});

static FPS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)").unwrap());

/// Bracket style of a timing line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    /// `{a}{b}`
    Curly,
    /// `[a][b]`
    Square,
}

/// One timed line before unit conversion
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLine {
    pub bracket: Bracket,
    pub start: u64,
    pub end: u64,
    pub body: String,
}

/// Result of scanning a text for bracketed timing lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameScan {
    /// Rate declared by a `{0}{0}fps` or `[0][0]fps` header
    pub fps_header: Option<f64>,
    /// Timed lines in file order
    pub lines: Vec<FrameLine>,
}

impl FrameScan {
    /// Notation implied by the scan, if any line was found.
    ///
    /// The first timed line decides the bracket style.
    pub fn format(&self, default_fps: f64) -> Option<SourceFormat> {
        let first = self.lines.first()?;
        match (first.bracket, self.fps_header) {
            (Bracket::Curly, header) => Some(SourceFormat::FrameIndexed {
                fps: header.unwrap_or(default_fps),
            }),
            (Bracket::Square, Some(fps)) => Some(SourceFormat::FrameIndexed { fps }),
            (Bracket::Square, None) => Some(SourceFormat::Decisecond),
        }
    }
}

/// Collect bracketed timing lines and the fps header
pub fn scan(raw: &str) -> FrameScan {
    let mut result = FrameScan::default();

    for line in raw.lines() {
        let Some(caps) = LINE_REGEX.captures(line.trim()) else {
            continue;
        };

        let bracket = if &caps[1] == "{" { Bracket::Curly } else { Bracket::Square };
        let (Ok(start), Ok(end)) = (caps[2].parse::<u64>(), caps[3].parse::<u64>()) else {
            continue;
        };
        let body = caps[4].to_string();

        if start == 0 && end == 0 {
            let declared = FPS_REGEX
                .captures(&body)
                .and_then(|m| m[1].parse::<f64>().ok())
                .filter(|fps| *fps > 0.0);
            if let Some(fps) = declared {
                debug!("FPS header detected: {}", fps);
                result.fps_header = Some(fps);
            }
            continue;
        }

        result.lines.push(FrameLine { bracket, start, end, body });
    }

    result
}

/// Convert scanned lines to a document
pub fn convert(scan: &FrameScan, default_fps: f64) -> Option<CaptionDocument> {
    let divisor = match scan.format(default_fps)? {
        SourceFormat::FrameIndexed { fps } => fps,
        SourceFormat::Decisecond => 10.0,
        SourceFormat::Srt | SourceFormat::Timecoded => return None,
    };
    debug!("Converting {} bracketed lines, divisor {}", scan.lines.len(), divisor);

    let mut document = CaptionDocument::new();
    for line in &scan.lines {
        let text = split_cue_text(&line.body);
        if text.is_empty() {
            continue;
        }
        let start_ms = checked_seconds_to_ms(line.start as f64 / divisor);
        let end_ms = checked_seconds_to_ms(line.end as f64 / divisor);
        let (Some(start_ms), Some(end_ms)) = (start_ms, end_ms) else {
            debug!("Dropping cue {}-{}: time out of range", line.start, line.end);
            continue;
        };
        document.push(start_ms, end_ms, &text);
    }

    Some(document)
}
