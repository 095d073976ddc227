/*!
 * Detail page addressing and enumeration.
 *
 * A matched search candidate links to `napisy-<id>-<slug>`. The listing of
 * its subtitles lives at `<site>/napisy1,1,1-dla-<id>-<slug>`, suffixed with
 * `-sSSeEE` for an episode or `-(YYYY)` for a movie year. The first number
 * after `napisy` is the page, so page N is addressed by rewriting
 * `napisy1,` to `napisyN,`.
 *
 * Pages are fetched one after another with a fixed pause in between, until a
 * page yields no rows or the page cap is reached.
 */

use std::collections::HashSet;
use std::time::Duration;

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::html::parse_detail_page;
use super::{MediaQuery, SubtitleEntry};
use crate::errors::ProviderError;
use crate::providers::{RequestContext, Transport};

/// Page slot of a listing URL
const PAGE_SLOT: &str = "napisy1,";

static DETAIL_HREF_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"napisy-(\d+)-(.*)").unwrap());
static TRAILING_YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]*\(?\d{4}\)?$").unwrap());

/// Paginated subtitle listing of one catalog title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTarget {
    /// Listing URL of page 1, without suffix
    pub base_url: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub year: Option<u16>,
    paginated: bool,
}

impl DetailTarget {
    /// Build the listing address for a candidate link
    pub fn from_href(site_base: &str, href: &str, query: &MediaQuery) -> Self {
        let Some(caps) = DETAIL_HREF_REGEX.captures(href) else {
            return Self {
                base_url: join_url(site_base, href),
                season: None,
                episode: None,
                year: None,
                paginated: false,
            };
        };

        let id = &caps[1];
        let slug = TRAILING_YEAR_REGEX.replace(&caps[2], "");
        let slug = slug.trim_matches('-');
        let (season, episode) = query.episode_number().unzip();

        Self {
            base_url: format!("{}/napisy1,1,1-dla-{}-{}", site_base.trim_end_matches('/'), id, slug),
            season,
            episode,
            year: query.year,
            paginated: true,
        }
    }

    /// Whether the listing can be paged
    pub fn is_paginated(&self) -> bool {
        self.paginated
    }

    /// Address of page 1
    pub fn url(&self) -> String {
        match (self.season, self.episode, self.year) {
            (Some(season), Some(episode), _) => {
                format!("{}-s{:02}e{:02}", self.base_url, season, episode)
            }
            (_, _, Some(year)) => format!("{}-({})", self.base_url, year),
            _ => self.base_url.clone(),
        }
    }

    /// Address of a 1-based page
    pub fn page_url(&self, page: u32) -> String {
        let url = self.url();
        if !self.paginated || page <= 1 {
            return url;
        }
        url.replacen(PAGE_SLOT, &format!("napisy{},", page), 1)
    }
}

fn join_url(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| format!("{}/{}", base.trim_end_matches('/'), href.trim_start_matches('/')))
}

/// Sequential page walker over a [`DetailTarget`]
#[derive(Debug)]
pub struct DetailEnumerator<'a> {
    transport: &'a dyn Transport,
    max_pages: u32,
    page_delay: Duration,
}

impl<'a> DetailEnumerator<'a> {
    pub fn new(transport: &'a dyn Transport, max_pages: u32, page_delay: Duration) -> Self {
        Self {
            transport,
            max_pages: max_pages.max(1),
            page_delay,
        }
    }

    /// Collect the entries of every page, in page order, without repeated handles.
    ///
    /// A failed page ends the walk; entries from earlier pages are kept.
    pub async fn enumerate(&self, target: &DetailTarget, ctx: &RequestContext) -> Vec<SubtitleEntry> {
        let mut entries = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let last_page = if target.is_paginated() { self.max_pages } else { 1 };

        for page in 1..=last_page {
            if page > 1 {
                if let Err(e) = ctx.sleep(self.page_delay).await {
                    info!("Stopping detail enumeration before page {}: {}", page, e);
                    break;
                }
            }

            let url = target.page_url(page);
            let html = match self.transport.get(&url, ctx).await {
                Ok(html) => html,
                Err(ProviderError::Cancelled) => {
                    info!("Detail enumeration cancelled at page {}", page);
                    break;
                }
                Err(e) => {
                    warn!("Failed to fetch detail page {}: {}", url, e);
                    break;
                }
            };

            let parsed = parse_detail_page(&html);
            if parsed.entries.is_empty() {
                debug!("Detail page {} is empty, stopping", page);
                break;
            }

            let before = entries.len();
            for entry in parsed.entries {
                if seen.insert(entry.handle.clone()) {
                    entries.push(entry);
                }
            }
            debug!(
                "Detail page {}: {} new entries, {} rows skipped",
                page,
                entries.len() - before,
                parsed.skipped
            );
        }

        entries
    }
}
