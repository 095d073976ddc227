/*!
 * Language utilities for ISO language code handling.
 *
 * The catalog identifies subtitle languages with upper-case ISO 639-1 codes
 * (`PL`, `EN`). Users may configure any ISO 639-1, 639-2/T or 639-2/B code.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Map an ISO 639-2/B code to its 639-2/T form, when the two differ
fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    let part2t = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };
    Some(part2t)
}

fn lookup(code: &str) -> Option<Language> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => Language::from_639_3(&normalized_code).or_else(|| {
            bibliographic_to_terminology(&normalized_code).and_then(Language::from_639_3)
        }),
        _ => None,
    }
}

/// Language code in the form the catalog download form expects (`PL`, `EN`)
pub fn service_language_code(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    let part1 = lang
        .to_639_1()
        .ok_or_else(|| anyhow!("Language '{}' has no two-letter code", lang.to_name()))?;
    Ok(part1.to_uppercase())
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(lang.to_name().to_string())
}
