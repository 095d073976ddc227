use log::debug;
use regex::Regex;

use super::normalize::canonical_title;
use super::{CatalogCandidate, MediaQuery};

// @module: Candidate selection for a query

/// Starts-with-or-contains comparison of two canonical titles.
///
/// Headers often carry a trailing subtitle or alternate title, so a strict
/// equality would reject them. Empty strings never match.
pub fn titles_match(left: &str, right: &str) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }
    left.starts_with(right) || right.starts_with(left) || left.contains(right) || right.contains(left)
}

/// Whether `text` carries an `SxxEyy` or `xx×yy` marker for the given episode
pub fn episode_marker_matches(text: &str, season: u32, episode: u32) -> bool {
    let pattern = format!(
        r"(?i)\bs0*{season}\s*e0*{episode}\b|\b0*{season}\s*[x×]\s*0*{episode}\b"
    );
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            debug!("Episode marker pattern failed to compile: {}", e);
            false
        }
    }
}

/// Decision on a single candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateVerdict {
    /// Cross-reference names the queried id
    Referenced,
    /// Canonical titles match
    TitleMatch,
    /// Cross-reference names another id
    WrongReference,
    /// Titles differ
    NoMatch,
}

impl CandidateVerdict {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Referenced | Self::TitleMatch)
    }
}

/// Judge one candidate against precomputed canonical query titles
pub fn judge(candidate: &CatalogCandidate, query: &MediaQuery, canonical_titles: &[String]) -> CandidateVerdict {
    if let (Some(wanted), Some(found)) = (query.primary_id.as_deref(), candidate.reference_id.as_deref()) {
        return if wanted.eq_ignore_ascii_case(found) {
            CandidateVerdict::Referenced
        } else {
            CandidateVerdict::WrongReference
        };
    }

    if canonical_titles
        .iter()
        .any(|title| titles_match(title, &candidate.canonical_title))
    {
        CandidateVerdict::TitleMatch
    } else {
        CandidateVerdict::NoMatch
    }
}

/// Select the candidates that match `query`, in page order.
///
/// For episode queries, candidates whose header names the episode are
/// preferred; when none does, the title matches are returned unfiltered.
pub fn match_candidates(candidates: &[CatalogCandidate], query: &MediaQuery) -> Vec<CatalogCandidate> {
    let canonical_titles: Vec<String> = query
        .search_titles()
        .into_iter()
        .map(canonical_title)
        .filter(|title| !title.is_empty())
        .collect();

    let matched: Vec<CatalogCandidate> = candidates
        .iter()
        .filter(|candidate| {
            let verdict = judge(candidate, query, &canonical_titles);
            debug!("Candidate '{}': {:?}", candidate.raw_header_text, verdict);
            verdict.is_accepted()
        })
        .cloned()
        .collect();

    let Some((season, episode)) = query.episode_number() else {
        return matched;
    };

    let with_marker: Vec<CatalogCandidate> = matched
        .iter()
        .filter(|c| episode_marker_matches(&c.raw_header_text, season, episode))
        .cloned()
        .collect();

    if with_marker.is_empty() {
        debug!("No candidate names S{:02}E{:02}, keeping {} title matches", season, episode, matched.len());
        matched
    } else {
        with_marker
    }
}

/// Append candidates not already present, keyed by detail link
pub fn merge_unique(into: &mut Vec<CatalogCandidate>, more: Vec<CatalogCandidate>) {
    for candidate in more {
        if !into.iter().any(|c| c.detail_href == candidate.detail_href) {
            into.push(candidate);
        }
    }
}
