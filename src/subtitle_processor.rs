use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

// @module: Canonical caption document (SRT cues)

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

/// Latest representable cue time, `999:59:59,999`
pub const MAX_TIMESTAMP_MS: u64 = 999 * 3_600_000 + 3_599_999;

/// Convert seconds to milliseconds: whole seconds are truncated, the
/// fractional remainder is rounded to the nearest millisecond.
///
/// `None` when the result lies past [`MAX_TIMESTAMP_MS`].
pub fn checked_seconds_to_ms(seconds: f64) -> Option<u64> {
    if seconds.is_nan() || seconds <= 0.0 {
        return Some(0);
    }
    if seconds > (MAX_TIMESTAMP_MS / 1000 + 1) as f64 {
        return None;
    }
    let whole = seconds.trunc();
    let fraction_ms = ((seconds - whole) * 1000.0).round();
    let ms = (whole as u64).checked_mul(1000)?.checked_add(fraction_ms as u64)?;
    (ms <= MAX_TIMESTAMP_MS).then_some(ms)
}

/// Like [`checked_seconds_to_ms`], clamped to [`MAX_TIMESTAMP_MS`]
pub fn seconds_to_ms(seconds: f64) -> u64 {
    checked_seconds_to_ms(seconds).unwrap_or(MAX_TIMESTAMP_MS)
}

/// Milliseconds of a clock reading, `None` past [`MAX_TIMESTAMP_MS`]
pub fn clock_to_ms(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<u64> {
    let ms = hours
        .checked_mul(3_600_000)?
        .checked_add(minutes.checked_mul(60_000)?)?
        .checked_add(seconds.checked_mul(1_000)?)?
        .checked_add(millis)?;
    (ms <= MAX_TIMESTAMP_MS).then_some(ms)
}

// @struct: Single timed cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: 1-based position in the document
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Cue text, lines joined with '\n'
    pub text: String,
}

impl Cue {
    /// Creates a cue without validation
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: String) -> Self {
        Cue {
            index,
            start_ms,
            end_ms,
            text,
        }
    }

    // @creates: Validated cue
    // @validates: Time range and non-empty text
    pub fn new_validated(index: usize, start_ms: u64, end_ms: u64, text: String) -> Result<Self> {
        if end_ms <= start_ms {
            return Err(anyhow!(
                "Invalid time range: end time {} <= start time {}",
                end_ms, start_ms
            ));
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(anyhow!("Empty subtitle text for cue {}", index));
        }

        Ok(Cue {
            index,
            start_ms,
            end_ms,
            text: trimmed_text.to_string(),
        })
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        clock_to_ms(hours, minutes, seconds, millis)
            .ok_or_else(|| anyhow!("Timestamp out of range: {}", timestamp))
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Formatted start time
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_ms)
    }

    /// Formatted end time
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_ms)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Ordered cue list with dense 1-based numbering.
///
/// Cues can only enter through [`CaptionDocument::push`], which drops cues
/// without text or with an empty time range and numbers the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionDocument {
    cues: Vec<Cue>,
}

impl CaptionDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cue, returning whether it was kept
    pub fn push(&mut self, start_ms: u64, end_ms: u64, text: &str) -> bool {
        let index = self.cues.len() + 1;
        match Cue::new_validated(index, start_ms, end_ms, text.to_string()) {
            Ok(cue) => {
                self.cues.push(cue);
                true
            }
            Err(e) => {
                debug!("Dropping cue: {}", e);
                false
            }
        }
    }

    /// All cues in order
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Number of cues
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the document has no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Serialize to SRT text
    pub fn to_srt(&self) -> String {
        self.to_string()
    }

    /// Write the document to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;
        write!(file, "{}", self)?;

        Ok(())
    }

    /// Parse SRT text into a document
    pub fn parse_srt(content: &str) -> Result<Self> {
        let mut document = CaptionDocument::new();

        let mut current_time: Option<(u64, u64)> = None;
        let mut current_text = String::new();
        let mut awaiting_index = true;

        let flush = |time: &mut Option<(u64, u64)>, text: &mut String, document: &mut CaptionDocument| {
            if let Some((start_ms, end_ms)) = time.take() {
                if !document.push(start_ms, end_ms, text) {
                    warn!("Skipping invalid SRT cue at {}", Cue::format_timestamp(start_ms));
                }
            }
            text.clear();
        };

        for line in content.lines() {
            let trimmed = line.trim().trim_start_matches('\u{feff}');

            if trimmed.is_empty() {
                if current_time.is_some() && !current_text.is_empty() {
                    flush(&mut current_time, &mut current_text, &mut document);
                    awaiting_index = true;
                }
                continue;
            }

            if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                if current_time.is_some() {
                    flush(&mut current_time, &mut current_text, &mut document);
                }
                current_time = match (Self::capture_ms(&caps, 1), Self::capture_ms(&caps, 5)) {
                    (Some(start_ms), Some(end_ms)) => Some((start_ms, end_ms)),
                    _ => {
                        warn!("Skipping SRT cue with out of range time: {}", trimmed);
                        None
                    }
                };
                awaiting_index = false;
                continue;
            }

            if awaiting_index && trimmed.parse::<usize>().is_ok() {
                continue;
            }

            if current_time.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            } else {
                debug!("Unexpected text before timestamp: {}", trimmed);
            }
        }

        flush(&mut current_time, &mut current_text, &mut document);

        if document.is_empty() {
            return Err(anyhow!("No valid subtitle entries were found in the SRT content"));
        }

        Ok(document)
    }

    fn capture_ms(caps: &regex::Captures, start_idx: usize) -> Option<u64> {
        let field = |i: usize| -> Option<u64> {
            caps.get(start_idx + i).and_then(|m| m.as_str().parse().ok())
        };
        clock_to_ms(field(0)?, field(1)?, field(2)?, field(3)?)
    }
}

impl fmt::Display for CaptionDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for cue in &self.cues {
            write!(f, "{}", cue)?;
        }
        Ok(())
    }
}
