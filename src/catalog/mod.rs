/*!
 * Catalog data model and resolution pipeline.
 *
 * A search turns a loose [`MediaQuery`] into concrete [`SubtitleEntry`] values:
 * - `normalize`: title canonicalisation shared by matching and search
 * - `html`: search result and detail page parsing
 * - `matcher`: title and episode matching of search candidates
 * - `detail`: detail page addressing and paginated enumeration
 * - `scoring`: relevance ranking against an observed video
 */

pub mod detail;
pub mod html;
pub mod matcher;
pub mod normalize;
pub mod scoring;

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::CatalogError;
pub use scoring::{RelevanceScore, VideoSignal};

static MEDIA_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(tt\d{7,8})(?::(\d{1,3})(?::(\d{1,4}))?)?(?:/(.*))?$").unwrap()
});

/// Kind of title searched for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Value of the `queryKind` search field
    pub fn query_kind(self) -> &'static str {
        match self {
            Self::Series => "1",
            Self::Movie => "2",
        }
    }
}

/// What the caller is looking for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaQuery {
    /// External identifier (`tt1234567`)
    pub primary_id: Option<String>,
    /// Main title, may be empty until resolved
    pub title: String,
    /// Original or localised alternative
    pub alternate_title: Option<String>,
    /// Release year
    pub year: Option<u16>,
    /// Season number for episodes
    pub season: Option<u32>,
    /// Episode number for episodes
    pub episode: Option<u32>,
}

impl MediaQuery {
    /// Query for a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the external identifier
    pub fn with_primary_id(mut self, id: impl Into<String>) -> Self {
        self.primary_id = Some(id.into());
        self
    }

    /// Set the alternative title
    pub fn with_alternate_title(mut self, title: impl Into<String>) -> Self {
        self.alternate_title = Some(title.into());
        self
    }

    /// Set the release year
    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    /// Restrict the query to one episode
    pub fn with_episode(mut self, season: u32, episode: u32) -> Self {
        self.season = Some(season);
        self.episode = Some(episode);
        self
    }

    /// Series when both season and episode are known
    pub fn kind(&self) -> MediaKind {
        if self.episode_number().is_some() {
            MediaKind::Series
        } else {
            MediaKind::Movie
        }
    }

    /// Season and episode, when both are set
    pub fn episode_number(&self) -> Option<(u32, u32)> {
        self.season.zip(self.episode)
    }

    /// Non-empty titles to try, main title first, without duplicates
    pub fn search_titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = Vec::new();
        for title in std::iter::once(self.title.as_str()).chain(self.alternate_title.as_deref()) {
            let title = title.trim();
            if !title.is_empty() && !titles.iter().any(|t| t.eq_ignore_ascii_case(title)) {
                titles.push(title);
            }
        }
        titles
    }

    /// Whether any title is available for matching
    pub fn has_titles(&self) -> bool {
        !self.search_titles().is_empty()
    }

    /// Check that the query can be searched
    pub fn validate(&self) -> Result<(), CatalogError> {
        let has_id = self.primary_id.as_deref().is_some_and(|id| !id.trim().is_empty());
        if !self.has_titles() && !has_id {
            return Err(CatalogError::InvalidQuery(
                "query needs a title, an alternate title or a primary id".to_string(),
            ));
        }
        if self.season.is_some() != self.episode.is_some() {
            return Err(CatalogError::InvalidQuery(
                "season and episode must be given together".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .search_titles()
            .first()
            .copied()
            .or(self.primary_id.as_deref())
            .unwrap_or("<empty>");
        write!(f, "{}", name)?;
        if let Some(year) = self.year {
            write!(f, " ({})", year)?;
        }
        if let Some((season, episode)) = self.episode_number() {
            write!(f, " S{:02}E{:02}", season, episode)?;
        }
        Ok(())
    }
}

/// Parse a media centre id such as `tt0111161`, `tt0944947:1:2` or
/// `tt0111161/durationMs=8520000&fps=23.976`.
///
/// The optional parameter tail may carry the observed video duration and
/// frame rate, returned as a [`VideoSignal`].
pub fn parse_media_id(raw: &str) -> Result<(MediaQuery, VideoSignal), CatalogError> {
    let caps = MEDIA_ID_REGEX
        .captures(raw.trim())
        .ok_or_else(|| CatalogError::InvalidQuery(format!("unrecognised media id '{}'", raw)))?;

    let mut query = MediaQuery::default().with_primary_id(&caps[1]);
    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    match (number(2), number(3)) {
        (Some(season), Some(episode)) => query = query.with_episode(season, episode),
        (Some(season), None) => query.season = Some(season),
        _ => {}
    }

    let mut signal = VideoSignal::default();
    if let Some(params) = caps.get(4) {
        for (key, value) in params.as_str().split('&').filter_map(|p| p.split_once('=')) {
            match key.to_ascii_lowercase().as_str() {
                "durationms" => {
                    signal.duration_secs = value.parse::<f64>().ok().map(|ms| ms / 1000.0);
                }
                "fps" => signal.fps = value.parse::<f64>().ok(),
                "season" => query.season = value.parse().ok(),
                "episode" => query.episode = value.parse().ok(),
                _ => {}
            }
        }
    }

    Ok((query, signal))
}

/// One search result block before matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCandidate {
    /// Canonical form of the header text
    pub canonical_title: String,
    /// Header text as shown on the page
    pub raw_header_text: String,
    /// Link to the title's detail page
    pub detail_href: String,
    /// Primary id named by the cross-reference link, if any
    pub reference_id: Option<String>,
}

impl CatalogCandidate {
    /// Build a candidate, deriving its canonical title
    pub fn new(
        raw_header_text: impl Into<String>,
        detail_href: impl Into<String>,
        reference_id: Option<String>,
    ) -> Self {
        let raw_header_text = raw_header_text.into();
        Self {
            canonical_title: normalize::canonical_title(&raw_header_text),
            raw_header_text,
            detail_href: detail_href.into(),
            reference_id,
        }
    }
}

/// A downloadable subtitle listed on a detail page
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    /// Opaque token passed back to the download endpoint
    pub handle: String,
    /// Human readable label
    pub label: String,
    /// Duration of the video the subtitle was timed for
    pub duration_secs: Option<f64>,
    /// Frame rate of that video
    pub fps: Option<f64>,
    /// Popularity
    pub download_count: u64,
    /// Set by ranking
    pub score: Option<RelevanceScore>,
    /// Duration within 100 ms of the observed video
    pub exact_match: bool,
}

impl SubtitleEntry {
    /// Entry as parsed, not yet scored
    pub fn new(handle: impl Into<String>, label: impl Into<String>, download_count: u64) -> Self {
        Self {
            handle: handle.into(),
            label: label.into(),
            duration_secs: None,
            fps: None,
            download_count,
            score: None,
            exact_match: false,
        }
    }

    /// Line shown to users: `HH:MM:SS · N downloads · fps FPS`
    pub fn display_label(&self) -> String {
        let duration = match self.duration_secs {
            Some(secs) if secs > 0.0 => {
                let secs = secs as u64;
                format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
            }
            _ => "??:??:??".to_string(),
        };
        let fps = self.fps.map_or_else(|| "?".to_string(), |fps| fps.to_string());
        let marker = if self.exact_match { "★ " } else { "" };

        format!("{}{} · {} downloads · {} FPS", marker, duration, self.download_count, fps)
    }
}
