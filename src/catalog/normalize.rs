/*!
 * Title canonicalisation.
 *
 * Catalog headers and user titles differ in accents, articles, years and
 * punctuation. Both sides are reduced to the same canonical string before
 * comparing: diacritics stripped, lower case, no standalone "the", no
 * "(YYYY)", no season/episode marker, alphanumerics only.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static ARTICLE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bthe\b").unwrap());

static YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*\d{4}\s*\)").unwrap());

static EPISODE_MARKER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bs\d{1,2}\s*e\d{1,3}\b|\b\d{1,2}\s*[x×]\s*\d{1,3}\b").unwrap());

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Remove accents and fold letters NFKD cannot decompose
pub fn strip_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfkd().filter(|c| !is_combining_mark(*c)) {
        match c {
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'đ' => out.push('d'),
            'Đ' => out.push('D'),
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            _ => out.push(c),
        }
    }
    out
}

fn strip_year_and_marker(lowered: &str) -> String {
    let without_year = YEAR_REGEX.replace_all(lowered, " ");
    EPISODE_MARKER_REGEX.replace_all(&without_year, " ").into_owned()
}

/// Canonical comparison form of a title
pub fn canonical_title(title: &str) -> String {
    let lowered = strip_diacritics(title).to_lowercase();
    let reduced = strip_year_and_marker(&lowered);
    let without_article = ARTICLE_REGEX.replace_all(&reduced, " ");

    without_article.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Words sent as the catalog's `queryString`.
///
/// Same reduction as [`canonical_title`] but word breaks are kept and the
/// article stays, since the catalog's own search expects readable words.
pub fn search_terms(title: &str) -> String {
    let lowered = strip_diacritics(title).to_lowercase();
    let reduced = strip_year_and_marker(&lowered);
    let spaced: String = reduced
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    WHITESPACE_REGEX.replace_all(spaced.trim(), " ").into_owned()
}
