/*!
 * `HH:MM:SS:text` captions.
 *
 * Lines carry only a start time. A cue ends 10 ms before the next later
 * start; the final cue is shown for 3 seconds.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::split_cue_text;
use crate::subtitle_processor::CaptionDocument;

/// Gap left between a cue and the next one
pub const GUARD_GAP_MS: u64 = 10;

/// Duration given to the final cue
pub const LAST_CUE_DURATION_MS: u64 = 3_000;

/// Lines needed before a text is taken for this notation
const MIN_TIMED_LINES: usize = 2;

static LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,2}):(\d{2}):(\d{2})\s*:\s*(.*)$").unwrap()
});

struct TimedLine {
    start_ms: u64,
    text: String,
}

fn parse_lines(raw: &str) -> Vec<TimedLine> {
    raw.lines()
        .filter_map(|line| {
            let caps = LINE_REGEX.captures(line)?;
            let hours: u64 = caps[1].parse().ok()?;
            let minutes: u64 = caps[2].parse().ok()?;
            let seconds: u64 = caps[3].parse().ok()?;
            Some(TimedLine {
                start_ms: (hours * 3600 + minutes * 60 + seconds) * 1000,
                text: split_cue_text(&caps[4]),
            })
        })
        .collect()
}

/// Whether `raw` has enough timestamped lines to be read in this notation
pub fn looks_timecoded(raw: &str) -> bool {
    raw.lines().filter(|line| LINE_REGEX.is_match(line)).take(MIN_TIMED_LINES).count() >= MIN_TIMED_LINES
}

/// Convert timestamped lines to a document
pub fn convert(raw: &str) -> Option<CaptionDocument> {
    let lines = parse_lines(raw);
    if lines.len() < MIN_TIMED_LINES {
        return None;
    }

    let mut document = CaptionDocument::new();
    for (i, line) in lines.iter().enumerate() {
        if line.text.is_empty() {
            continue;
        }

        // Lines sharing a second with this one do not bound it
        let next_start = lines[i + 1..]
            .iter()
            .map(|next| next.start_ms)
            .find(|start| *start > line.start_ms);

        let end_ms = match next_start {
            Some(start) if start - GUARD_GAP_MS > line.start_ms => start - GUARD_GAP_MS,
            Some(start) => start,
            None => line.start_ms + LAST_CUE_DURATION_MS,
        };

        document.push(line.start_ms, end_ms, &line.text);
    }

    Some(document)
}
