/*!
 * Caller-facing catalog operations.
 *
 * `CatalogService` ties the pipeline together:
 * - `list_subtitles`: query -> search -> match -> detail pages -> ranking
 * - `fetch_caption`: handle -> download -> payload decode -> canonical SRT
 *
 * Every network call runs under the caller's [`RequestContext`]. Listing never
 * fails: per-row, per-page and per-request failures are logged and degrade to
 * a partial or empty result.
 */

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, error, info, warn};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::app_config::{CatalogConfig, Config};
use crate::catalog::detail::{DetailEnumerator, DetailTarget};
use crate::catalog::html::parse_search_results;
use crate::catalog::matcher::{match_candidates, merge_unique};
use crate::catalog::normalize::search_terms;
use crate::catalog::scoring::rank;
use crate::catalog::{CatalogCandidate, MediaQuery, SubtitleEntry, VideoSignal};
use crate::errors::{CatalogError, PayloadError, ProviderError};
use crate::formats::{SRT_ARROW, convert_to_srt};
use crate::language_utils::service_language_code;
use crate::payload::SubtitlePayload;
use crate::providers::{RequestContext, Transport};

/// Download API mode returning caption text
pub const DOWNLOAD_MODE: &str = "17";

/// Element of the download response holding the payload
const CONTENT_ELEMENT: &[u8] = b"content";

/// Title data supplied by an external metadata service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTitle {
    /// Movie title
    pub title: Option<String>,
    /// Series title
    pub tvshow: Option<String>,
    pub year: Option<u16>,
}

/// External lookup of a title by primary id
#[async_trait]
pub trait TitleResolver: Send + Sync + Debug {
    /// Look up `primary_id`; `None` when nothing is known
    async fn resolve(&self, primary_id: &str, ctx: &RequestContext) -> Option<ResolvedTitle>;
}

/// Search and download front of the catalog
#[derive(Debug, Clone)]
pub struct CatalogService {
    transport: Arc<dyn Transport>,
    resolver: Option<Arc<dyn TitleResolver>>,
    config: CatalogConfig,
    default_fps: f64,
}

impl CatalogService {
    /// Create a service over a transport
    pub fn new(transport: Arc<dyn Transport>, config: CatalogConfig, default_fps: f64) -> Self {
        Self {
            transport,
            resolver: None,
            config,
            default_fps,
        }
    }

    /// Create a service from the application config
    pub fn from_config(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self::new(transport, config.catalog.clone(), config.conversion.default_fps)
    }

    /// Attach a title resolver for id-only queries
    pub fn with_resolver(mut self, resolver: Arc<dyn TitleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Catalog settings in use
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// List subtitles for a query, most relevant first.
    ///
    /// Never fails; problems are logged and yield fewer or no entries.
    pub async fn list_subtitles(
        &self,
        query: &MediaQuery,
        signal: &VideoSignal,
        ctx: &RequestContext,
    ) -> Vec<SubtitleEntry> {
        if let Err(e) = query.validate() {
            warn!("Not searching: {}", e);
            return Vec::new();
        }

        let query = self.resolve_titles(query, ctx).await;
        info!("Searching catalog for {}", query);

        let candidates = match self.search_candidates(&query, ctx).await {
            Ok(candidates) => candidates,
            Err(CatalogError::NoMatch(what)) => {
                info!("No catalog match for {}", what);
                return Vec::new();
            }
            Err(e) => {
                warn!("Catalog search failed: {}", e);
                return Vec::new();
            }
        };

        let enumerator = DetailEnumerator::new(
            self.transport.as_ref(),
            self.config.max_pages,
            Duration::from_millis(self.config.page_delay_ms),
        );

        let mut entries: Vec<SubtitleEntry> = Vec::new();
        for candidate in candidates.iter().take(self.config.max_candidates) {
            if ctx.is_cancelled() {
                info!("Search cancelled, returning {} entries", entries.len());
                break;
            }
            let target = DetailTarget::from_href(&self.config.base_url, &candidate.detail_href, &query);
            debug!("Enumerating {} for '{}'", target.url(), candidate.raw_header_text);

            for entry in enumerator.enumerate(&target, ctx).await {
                if !entries.iter().any(|e| e.handle == entry.handle) {
                    entries.push(entry);
                }
            }
        }

        info!("Found {} subtitles for {}", entries.len(), query);
        rank(entries, signal)
    }

    /// Fill in titles for id-only queries from the resolver
    async fn resolve_titles(&self, query: &MediaQuery, ctx: &RequestContext) -> MediaQuery {
        let mut query = query.clone();
        if query.has_titles() {
            return query;
        }

        let (Some(resolver), Some(id)) = (&self.resolver, query.primary_id.clone()) else {
            return query;
        };

        match resolver.resolve(&id, ctx).await {
            Some(resolved) => {
                if let Some(title) = resolved.tvshow.or(resolved.title) {
                    query.title = title;
                }
                query.year = query.year.or(resolved.year);
                debug!("Resolved {} to {}", id, query);
            }
            None => debug!("Resolver knows nothing about {}", id),
        }
        query
    }

    /// Strings sent as `queryString`, one search per entry
    fn query_strings(query: &MediaQuery) -> Vec<String> {
        let mut strings: Vec<String> = Vec::new();
        for title in query.search_titles() {
            let terms = search_terms(title);
            if !terms.is_empty() && !strings.contains(&terms) {
                strings.push(terms);
            }
        }
        if strings.is_empty() {
            if let Some(id) = query.primary_id.as_deref().filter(|id| !id.trim().is_empty()) {
                strings.push(id.trim().to_lowercase());
            }
        }
        strings
    }

    fn search_form(query: &MediaQuery, query_string: &str) -> Vec<(String, String)> {
        vec![
            ("queryKind".to_string(), query.kind().query_kind().to_string()),
            ("queryString".to_string(), query_string.to_string()),
            ("queryYear".to_string(), query.year.map(|y| y.to_string()).unwrap_or_default()),
            ("associate".to_string(), query.primary_id.clone().unwrap_or_default()),
        ]
    }

    /// Run one search per title and return the union of the matches
    pub async fn search_candidates(
        &self,
        query: &MediaQuery,
        ctx: &RequestContext,
    ) -> Result<Vec<CatalogCandidate>, CatalogError> {
        let query_strings = Self::query_strings(query);
        if query_strings.is_empty() {
            return Err(CatalogError::InvalidQuery("nothing to search for".to_string()));
        }

        let mut matched: Vec<CatalogCandidate> = Vec::new();
        let mut last_error: Option<ProviderError> = None;

        for query_string in &query_strings {
            let form = Self::search_form(query, query_string);
            let html = match self.transport.post_form(&self.config.search_url, &form, ctx).await {
                Ok(html) => html,
                Err(ProviderError::Cancelled) => return Err(ProviderError::Cancelled.into()),
                Err(e) => {
                    warn!("Search for '{}' failed: {}", query_string, e);
                    last_error = Some(e);
                    continue;
                }
            };

            let candidates = parse_search_results(&html);
            let found = match_candidates(&candidates, query);
            debug!(
                "Search '{}': {} candidates, {} matched",
                query_string,
                candidates.len(),
                found.len()
            );
            merge_unique(&mut matched, found);
        }

        if matched.is_empty() {
            return Err(match last_error {
                Some(e) => e.into(),
                None => CatalogError::NoMatch(query.to_string()),
            });
        }

        Ok(matched)
    }

    /// Download the payload behind a handle
    pub async fn download_payload(
        &self,
        handle: &str,
        ctx: &RequestContext,
    ) -> Result<SubtitlePayload, CatalogError> {
        let language = service_language_code(&self.config.language)
            .map_err(|e| CatalogError::InvalidQuery(e.to_string()))?;

        let form = vec![
            ("mode".to_string(), DOWNLOAD_MODE.to_string()),
            ("client".to_string(), self.config.client_id.clone()),
            ("downloaded_subtitles_id".to_string(), handle.to_string()),
            ("downloaded_subtitles_lang".to_string(), language),
            ("downloaded_subtitles_txt".to_string(), "1".to_string()),
        ];

        let xml = self.transport.post_form(&self.config.download_url, &form, ctx).await?;
        let content = extract_xml_content(&xml)?;
        let bytes = decode_base64(&content)?;
        debug!("Downloaded {} payload bytes for {}", bytes.len(), handle);

        Ok(SubtitlePayload::new(bytes))
    }

    /// Fetch the caption behind a handle as canonical SRT.
    ///
    /// `Ok(None)` means the catalog has nothing usable for the handle. A
    /// corrupted payload is downloaded a second time before giving up.
    pub async fn fetch_caption(&self, handle: &str, ctx: &RequestContext) -> Result<Option<String>, CatalogError> {
        let mut attempt = 0;

        let text = loop {
            attempt += 1;
            let payload = self.download_payload(handle, ctx).await;
            match payload.and_then(|p| p.decode().map_err(CatalogError::from)) {
                Ok(text) => break text,
                Err(CatalogError::Payload(PayloadError::NoPayload)) => {
                    info!("No subtitle payload for {}", handle);
                    return Ok(None);
                }
                Err(CatalogError::Payload(e)) if e.is_corruption() && attempt == 1 => {
                    warn!("Corrupted payload for {} ({}), downloading again", handle, e);
                }
                Err(e) => {
                    error!("Failed to fetch subtitle {}: {}", handle, e);
                    return Err(e);
                }
            }
        };

        match convert_to_srt(&text, self.default_fps) {
            Some(srt) if srt.contains(SRT_ARROW) => Ok(Some(srt)),
            _ => {
                info!("Subtitle {} is not in a convertible format", handle);
                Ok(None)
            }
        }
    }
}

/// Text of the first `<content>` element of a download response
pub fn extract_xml_content(xml: &str) -> Result<String, PayloadError> {
    let mut reader = Reader::from_str(xml);
    let mut inside = false;
    let mut content = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == CONTENT_ELEMENT => inside = true,
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == CONTENT_ELEMENT => break,
            Ok(Event::End(ref e)) if e.local_name().as_ref() == CONTENT_ELEMENT => break,
            Ok(Event::Text(ref e)) if inside => {
                let text = e.unescape().map_err(|err| PayloadError::Envelope(err.to_string()))?;
                content.push_str(&text);
            }
            Ok(Event::CData(e)) if inside => {
                content.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(PayloadError::Envelope(e.to_string())),
        }
    }

    if content.trim().is_empty() {
        return Err(PayloadError::NoPayload);
    }
    Ok(content)
}

fn decode_base64(content: &str) -> Result<Vec<u8>, PayloadError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| PayloadError::Envelope(format!("invalid base64 content: {}", e)))?;
    if bytes.is_empty() {
        return Err(PayloadError::NoPayload);
    }
    Ok(bytes)
}
