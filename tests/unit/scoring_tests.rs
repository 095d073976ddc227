/*!
 * Tests for relevance ranking
 */

use napisub::catalog::scoring::{is_exact_match, rank, score};
use napisub::catalog::{RelevanceScore, SubtitleEntry, VideoSignal};

fn entry(handle: &str, duration: Option<f64>, fps: Option<f64>, downloads: u64) -> SubtitleEntry {
    let mut entry = SubtitleEntry::new(handle, "Napisy", downloads);
    entry.duration_secs = duration;
    entry.fps = fps;
    entry
}

fn handles(entries: &[SubtitleEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.handle.as_str()).collect()
}

/// Test weighted distance
#[test]
fn test_score_withDurationAndFps_shouldWeighBoth() {
    let signal = VideoSignal::new(Some(100.0), Some(25.0));
    let e = entry("a", Some(90.0), Some(24.0), 0);

    match score(&e, &signal) {
        RelevanceScore::Distance(d) => assert!((d - 8.2).abs() < 1e-9),
        other => panic!("expected distance, got {:?}", other),
    }
}

/// Closest duration ranks first
#[test]
fn test_rank_withSignal_shouldOrderByDistance() {
    let signal = VideoSignal::new(Some(5400.0), Some(23.976));
    let entries = vec![
        entry("far", Some(5000.0), Some(23.976), 900),
        entry("close", Some(5401.0), Some(23.976), 1),
        entry("exact", Some(5400.05), Some(23.976), 2),
    ];

    let ranked = rank(entries, &signal);

    assert_eq!(handles(&ranked), vec!["exact", "close", "far"]);
    assert!(ranked[0].exact_match);
    assert!(!ranked[1].exact_match);
    assert!(ranked.iter().all(|e| e.score.is_some()));
}

/// Entries without duration go after every comparable entry
#[test]
fn test_rank_withMixedEntries_shouldPutDistanceBeforePopularity() {
    let signal = VideoSignal::new(Some(5400.0), None);
    let entries = vec![
        entry("popular", None, None, 100_000),
        entry("far", Some(3000.0), None, 0),
        entry("unknown", None, None, 5),
    ];

    let ranked = rank(entries, &signal);

    assert_eq!(handles(&ranked), vec!["far", "popular", "unknown"]);
    assert_eq!(ranked[1].score, Some(RelevanceScore::Popularity(100_000)));
}

/// Without an observed duration everything ranks by downloads
#[test]
fn test_rank_withoutSignal_shouldOrderByDownloads() {
    let entries = vec![
        entry("few", Some(5400.0), None, 3),
        entry("many", Some(100.0), None, 300),
        entry("some", None, None, 30),
    ];

    let ranked = rank(entries, &VideoSignal::default());

    assert_eq!(handles(&ranked), vec!["many", "some", "few"]);
    assert!(ranked.iter().all(|e| !e.exact_match));
}

/// Equal scores keep enumeration order
#[test]
fn test_rank_withTies_shouldBeStable() {
    let signal = VideoSignal::new(Some(100.0), None);
    let entries = vec![
        entry("first", Some(110.0), None, 0),
        entry("second", Some(90.0), None, 50),
        entry("third", Some(110.0), None, 10),
    ];

    let ranked = rank(entries, &signal);

    assert_eq!(handles(&ranked), vec!["first", "second", "third"]);
}

/// A zero duration signal is treated as missing
#[test]
fn test_isExactMatch_withZeroDuration_shouldBeFalse() {
    let signal = VideoSignal::new(Some(0.0), None);
    let e = entry("a", Some(0.0), None, 0);

    assert!(!signal.has_duration());
    assert!(!is_exact_match(&e, &signal));
    assert_eq!(score(&e, &signal), RelevanceScore::Popularity(0));
}

/// Test the user facing label
#[test]
fn test_displayLabel_shouldRenderKnownAndUnknownValues() {
    let mut known = entry("a", Some(5400.0), Some(25.0), 12);
    known.exact_match = true;
    assert_eq!(known.display_label(), "★ 01:30:00 · 12 downloads · 25 FPS");

    let unknown = entry("b", None, None, 0);
    assert_eq!(unknown.display_label(), "??:??:?? · 0 downloads · ? FPS");
}
