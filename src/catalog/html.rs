/*!
 * HTML parsing of catalog pages.
 *
 * Search results are `div.movieSearchContent` blocks with a
 * `a.movieTitleCat` header link and an optional IMDb cross-reference link.
 * Detail pages list subtitles as table rows whose first link uses the
 * `napiprojekt:` scheme; the cells hold label, fps, duration and download
 * count.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{CatalogCandidate, SubtitleEntry};
use crate::errors::CatalogError;

/// Scheme of subtitle handle links
pub const HANDLE_SCHEME: &str = "napiprojekt:";

/// Cells a subtitle row needs
const MIN_ROW_CELLS: usize = 5;

static SEARCH_BLOCK: Lazy<Selector> = Lazy::new(|| Selector::parse("div.movieSearchContent").unwrap());
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a.movieTitleCat").unwrap());
static XREF_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[href*="imdb.com/title/"]"#).unwrap());
static DETAIL_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody > tr").unwrap());
static HANDLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[href^="napiprojekt:"]"#).unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());

static XREF_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"imdb\.com/title/(tt\d+)").unwrap());
static FPS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*fps").unwrap());

/// Rows parsed from one detail page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailPage {
    /// Subtitle rows in page order
    pub entries: Vec<SubtitleEntry>,
    /// Rows that looked like subtitles but could not be read
    pub skipped: usize,
}

/// Visible text of an element, whitespace collapsed
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a search results page into candidates
pub fn parse_search_results(html: &str) -> Vec<CatalogCandidate> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();

    for block in document.select(&SEARCH_BLOCK) {
        let Some(title_link) = block.select(&TITLE_LINK).next() else {
            debug!("Search block without title link");
            continue;
        };
        let Some(href) = title_link.value().attr("href").filter(|h| !h.trim().is_empty()) else {
            debug!("Search block title link without href");
            continue;
        };

        let reference_id = block
            .select(&XREF_LINK)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| XREF_ID_REGEX.captures(href).map(|caps| caps[1].to_string()));

        candidates.push(CatalogCandidate::new(element_text(&title_link), href.trim(), reference_id));
    }

    debug!("Parsed {} search candidates", candidates.len());
    candidates
}

/// Parse one detail row. `Ok(None)` means the row is not a subtitle row.
pub fn parse_detail_row(row: &ElementRef) -> Result<Option<SubtitleEntry>, CatalogError> {
    let Some(link) = row.select(&HANDLE_LINK).next() else {
        return Ok(None);
    };

    let handle = link
        .value()
        .attr("href")
        .and_then(|href| href.strip_prefix(HANDLE_SCHEME))
        .map(str::trim)
        .filter(|handle| !handle.is_empty())
        .ok_or_else(|| CatalogError::UnparseableRow("empty subtitle handle".to_string()))?;

    let cells: Vec<String> = row.select(&CELL).map(|cell| element_text(&cell)).collect();
    if cells.len() < MIN_ROW_CELLS {
        return Err(CatalogError::UnparseableRow(format!(
            "row for {} has {} cells, expected at least {}",
            handle,
            cells.len(),
            MIN_ROW_CELLS
        )));
    }

    let mut entry = SubtitleEntry::new(handle, cells[1].as_str(), parse_download_count(&cells[4]));
    entry.fps = extract_fps(&cells[2]);
    entry.duration_secs = parse_duration(&cells[3]);

    Ok(Some(entry))
}

/// Parse a detail page, skipping rows that cannot be read
pub fn parse_detail_page(html: &str) -> DetailPage {
    let document = Html::parse_document(html);
    let mut page = DetailPage::default();

    for row in document.select(&DETAIL_ROW) {
        match parse_detail_row(&row) {
            Ok(Some(entry)) => page.entries.push(entry),
            Ok(None) => {}
            Err(e) => {
                warn!("Skipping detail row: {}", e);
                page.skipped += 1;
            }
        }
    }

    page
}

/// Parse a duration cell.
///
/// A bare integer counts milliseconds; otherwise `[H:]M:S[.fff]`.
pub fn parse_duration(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.chars().all(|c| c.is_ascii_digit()) {
        return text.parse::<u64>().ok().map(|ms| ms as f64 / 1000.0);
    }

    let (clock, millis) = match text.split_once('.') {
        Some((clock, fraction)) => {
            let digits: String = fraction.chars().take(3).collect();
            let padded = format!("{:0<3}", digits);
            (clock, padded.parse::<u64>().ok()?)
        }
        None => (text, 0),
    };

    let parts = clock
        .split(':')
        .map(|p| p.trim().parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return None,
    };

    let total = hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?;
    Some(total as f64 + millis as f64 / 1000.0)
}

/// Frame rate from a `<number> FPS` text
pub fn extract_fps(text: &str) -> Option<f64> {
    FPS_REGEX
        .captures(text)
        .and_then(|caps| caps[1].replace(',', ".").parse::<f64>().ok())
        .filter(|fps| *fps > 0.0)
}

/// Digits of a download count cell, 0 when there are none
pub fn parse_download_count(text: &str) -> u64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}
