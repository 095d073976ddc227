/*!
 * Relevance ranking of subtitle entries.
 *
 * Ranking is ascending: the smallest [`RelevanceScore`] comes first.
 * - With an observed video duration, entries with a known duration get a
 *   `Distance` score, `0.8 * |duration diff| + 0.2 * |fps diff|` (the fps term
 *   is 0 when either fps is unknown). A smaller distance is better.
 * - Entries that cannot be compared get a `Popularity` score from their
 *   download count. More downloads rank earlier.
 * - Every `Distance` ranks before every `Popularity`.
 *
 * Sorting is stable, so equal scores keep their enumeration order.
 */

use std::cmp::Ordering;

use super::SubtitleEntry;

/// Weight of the duration difference
pub const DURATION_WEIGHT: f64 = 0.8;

/// Weight of the frame rate difference
pub const FPS_WEIGHT: f64 = 0.2;

/// Duration difference below which an entry is flagged as an exact match
pub const EXACT_MATCH_SECS: f64 = 0.1;

/// What is known about the video being played
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VideoSignal {
    /// Observed duration in seconds
    pub duration_secs: Option<f64>,
    /// Observed frame rate
    pub fps: Option<f64>,
}

impl VideoSignal {
    pub fn new(duration_secs: Option<f64>, fps: Option<f64>) -> Self {
        Self { duration_secs, fps }
    }

    /// Whether a duration is available to compare against
    pub fn has_duration(&self) -> bool {
        self.duration_secs.is_some_and(|d| d.is_finite() && d > 0.0)
    }
}

/// Score of an entry; compare with [`RelevanceScore::rank_cmp`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelevanceScore {
    /// Weighted distance to the observed video, smaller is better
    Distance(f64),
    /// Download count, larger is better
    Popularity(u64),
}

impl RelevanceScore {
    /// Ordering where `Less` means "more relevant"
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Distance(a), Self::Distance(b)) => a.total_cmp(b),
            (Self::Distance(_), Self::Popularity(_)) => Ordering::Less,
            (Self::Popularity(_), Self::Distance(_)) => Ordering::Greater,
            (Self::Popularity(a), Self::Popularity(b)) => b.cmp(a),
        }
    }
}

/// Score one entry against the observed video
pub fn score(entry: &SubtitleEntry, signal: &VideoSignal) -> RelevanceScore {
    let observed = signal.duration_secs.filter(|_| signal.has_duration());

    match (observed, entry.duration_secs) {
        (Some(video), Some(subtitle)) => {
            let fps_term = match (signal.fps, entry.fps) {
                (Some(a), Some(b)) => (a - b).abs(),
                _ => 0.0,
            };
            RelevanceScore::Distance(DURATION_WEIGHT * (video - subtitle).abs() + FPS_WEIGHT * fps_term)
        }
        _ => RelevanceScore::Popularity(entry.download_count),
    }
}

/// Whether the entry duration is within [`EXACT_MATCH_SECS`] of the video
pub fn is_exact_match(entry: &SubtitleEntry, signal: &VideoSignal) -> bool {
    match (signal.duration_secs, entry.duration_secs) {
        (Some(video), Some(subtitle)) if signal.has_duration() => (video - subtitle).abs() <= EXACT_MATCH_SECS,
        _ => false,
    }
}

/// Score and sort entries, most relevant first
pub fn rank(mut entries: Vec<SubtitleEntry>, signal: &VideoSignal) -> Vec<SubtitleEntry> {
    for entry in entries.iter_mut() {
        entry.score = Some(score(entry, signal));
        entry.exact_match = is_exact_match(entry, signal);
    }

    entries.sort_by(|a, b| match (&a.score, &b.score) {
        (Some(x), Some(y)) => x.rank_cmp(y),
        _ => Ordering::Equal,
    });

    entries
}
