/*!
 * Caption format detection and conversion.
 *
 * The catalog serves captions in several legacy notations. They are detected
 * in a fixed priority order, because the later heuristics would also accept
 * some inputs of the earlier ones:
 *
 * 1. SRT, recognised by the `-->` arrow, passed through untouched
 * 2. Frame-indexed `{start}{end}text` / `[start][end]text` (MicroDVD),
 *    or decisecond `[start][end]text` (MPL2) when no fps header is present
 * 3. Literal timestamps `HH:MM:SS:text`, one cue per line
 *
 * All of them are converted to a [`CaptionDocument`].
 */

pub mod frames;
pub mod timecoded;

use log::debug;

use crate::subtitle_processor::CaptionDocument;

/// Frame rate assumed for `{}` captions without an fps header
pub const DEFAULT_FPS: f64 = 23.976;

/// Arrow token that marks SRT text
pub const SRT_ARROW: &str = "-->";

/// Timing notation of a caption text
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceFormat {
    /// Already canonical
    Srt,
    /// Frame numbers at the given rate
    FrameIndexed { fps: f64 },
    /// Tenths of a second
    Decisecond,
    /// `HH:MM:SS:` prefixed lines
    Timecoded,
}

/// Detect the notation of `raw`, assuming [`DEFAULT_FPS`] for headerless frames
pub fn detect(raw: &str) -> Option<SourceFormat> {
    detect_with_fps(raw, DEFAULT_FPS)
}

/// Detect the notation of `raw`
pub fn detect_with_fps(raw: &str, default_fps: f64) -> Option<SourceFormat> {
    if raw.contains(SRT_ARROW) {
        return Some(SourceFormat::Srt);
    }

    let scan = frames::scan(raw);
    if let Some(format) = scan.format(default_fps) {
        return Some(format);
    }

    if timecoded::looks_timecoded(raw) {
        return Some(SourceFormat::Timecoded);
    }

    None
}

/// Convert any supported caption text into a document
pub fn to_canonical(raw: &str) -> Option<CaptionDocument> {
    to_canonical_with_fps(raw, DEFAULT_FPS)
}

/// Convert any supported caption text into a document, using `default_fps`
/// for frame-indexed captions that do not declare their rate
pub fn to_canonical_with_fps(raw: &str, default_fps: f64) -> Option<CaptionDocument> {
    let document = match detect_with_fps(raw, default_fps)? {
        SourceFormat::Srt => CaptionDocument::parse_srt(raw).ok(),
        SourceFormat::FrameIndexed { .. } | SourceFormat::Decisecond => {
            frames::convert(&frames::scan(raw), default_fps)
        }
        SourceFormat::Timecoded => timecoded::convert(raw),
    }?;

    if document.is_empty() {
        return None;
    }
    Some(document)
}

/// Convert caption text to serialized SRT.
///
/// SRT input is returned byte for byte, so the function is idempotent.
pub fn convert_to_srt(raw: &str, default_fps: f64) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    if raw.contains(SRT_ARROW) {
        return Some(raw.to_string());
    }

    let document = to_canonical_with_fps(raw, default_fps)?;
    debug!("Converted caption text to {} cues", document.len());
    Some(document.to_srt())
}

/// Split a cue body into display lines.
///
/// `|` separates lines, a leading `/` continuation marker is removed and
/// lines left empty are dropped.
pub(crate) fn split_cue_text(body: &str) -> String {
    body.split('|')
        .map(|segment| segment.trim().trim_start_matches('/').trim())
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
