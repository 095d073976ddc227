/*!
 * Integration tests for search, ranking and download through a scripted transport
 */

use std::sync::Arc;

use async_trait::async_trait;
use napisub::catalog::{MediaQuery, VideoSignal};
use napisub::catalog_service::{CatalogService, ResolvedTitle, TitleResolver};
use napisub::errors::{CatalogError, PayloadError, ProviderError};
use napisub::formats::DEFAULT_FPS;
use napisub::payload::encode_container;
use napisub::providers::RequestContext;
use napisub::providers::mock::{MockMethod, MockTransport};

use crate::common::{self, BASE_URL, DOWNLOAD_URL, DetailRow, SEARCH_URL, SearchBlock};

const EXPECTED_SRT: &str =
    "1\n00:00:01,000 --> 00:00:02,000\nHello\nworld\n\n2\n00:00:03,000 --> 00:00:04,000\nSecond line\n\n";

fn service(transport: &MockTransport) -> CatalogService {
    CatalogService::new(Arc::new(transport.clone()), common::test_catalog_config(), DEFAULT_FPS)
}

fn shawshank_search() -> String {
    common::search_page(&[
        SearchBlock {
            title: "Skazani na Shawshank (1994)",
            href: "napisy-1234-Skazani-na-Shawshank",
            imdb_id: Some("tt0111161"),
        },
        SearchBlock {
            title: "Zielona mila (1999)",
            href: "napisy-555-Zielona-mila",
            imdb_id: Some("tt0120689"),
        },
    ])
}

fn shawshank_transport() -> MockTransport {
    MockTransport::new()
        .on_post(SEARCH_URL, shawshank_search())
        .on_get(
            &format!("{}/napisy1,1,1-dla-1234-", BASE_URL),
            common::detail_page(&[
                DetailRow::new("far", "1:20:00", "500"),
                DetailRow::new("exact", "1:30:00", "10"),
                DetailRow::new("nodur", "brak", "1000"),
            ]),
        )
        .on_get(&format!("{}/napisy2,1,1-dla-1234-", BASE_URL), common::empty_detail_page())
}

/// Full listing: search, match, enumerate and rank
#[tokio::test]
async fn test_listSubtitles_withMatchingTitle_shouldRankByDistance() {
    let transport = shawshank_transport();
    let query = MediaQuery::new("Skazani na Shawshank").with_year(1994);
    let signal = VideoSignal::new(Some(5400.0), Some(23.976));

    let entries = service(&transport)
        .list_subtitles(&query, &signal, &RequestContext::new())
        .await;

    let handles: Vec<&str> = entries.iter().map(|e| e.handle.as_str()).collect();
    assert_eq!(handles, vec!["exact", "far", "nodur"]);
    assert!(entries[0].exact_match);

    let requests = transport.requests();
    let search = &requests[0];
    assert_eq!(search.method, MockMethod::Post);
    assert_eq!(search.url, SEARCH_URL);
    assert_eq!(search.field("queryKind"), Some("2"));
    assert_eq!(search.field("queryString"), Some("skazani na shawshank"));
    assert_eq!(search.field("queryYear"), Some("1994"));
    assert_eq!(
        requests[1].url,
        "https://catalog.test/napisy1,1,1-dla-1234-Skazani-na-Shawshank-(1994)"
    );
    // Zielona mila is never enumerated
    assert!(requests.iter().all(|r| !r.url.contains("-555-")));
}

/// Without a video signal the most downloaded entry comes first
#[tokio::test]
async fn test_listSubtitles_withoutSignal_shouldRankByDownloads() {
    let transport = shawshank_transport();
    let query = MediaQuery::new("Skazani na Shawshank");

    let entries = service(&transport)
        .list_subtitles(&query, &VideoSignal::default(), &RequestContext::new())
        .await;

    let handles: Vec<&str> = entries.iter().map(|e| e.handle.as_str()).collect();
    assert_eq!(handles, vec!["nodur", "far", "exact"]);
}

/// Episode queries are sent as series searches with an episode suffix
#[tokio::test]
async fn test_listSubtitles_withEpisode_shouldSearchSeriesAndAddSuffix() {
    let transport = MockTransport::new()
        .on_post(
            SEARCH_URL,
            common::search_page(&[
                SearchBlock {
                    title: "Dr House",
                    href: "napisy-42-Dr-House",
                    imdb_id: None,
                },
                SearchBlock {
                    title: "Dr House S02E11",
                    href: "napisy-43-Dr-House-S02E11",
                    imdb_id: None,
                },
            ]),
        )
        .on_get(
            &format!("{}/napisy1,1,1-dla-43-", BASE_URL),
            common::detail_page(&[DetailRow::new("ep", "42:00", "1")]),
        )
        .on_get(&format!("{}/napisy2,1,1-dla-43-", BASE_URL), common::empty_detail_page());
    let query = MediaQuery::new("Dr House").with_episode(2, 11);

    let entries = service(&transport)
        .list_subtitles(&query, &VideoSignal::default(), &RequestContext::new())
        .await;

    assert_eq!(entries.len(), 1);
    let requests = transport.requests();
    assert_eq!(requests[0].field("queryKind"), Some("1"));
    assert_eq!(
        requests[1].url,
        "https://catalog.test/napisy1,1,1-dla-43-Dr-House-S02E11-s02e11"
    );
}

/// Main and alternate titles are both searched and the matches merged
#[tokio::test]
async fn test_searchCandidates_withAlternateTitle_shouldUnionResults() {
    let transport = MockTransport::new()
        .on_post_field(
            SEARCH_URL,
            "queryString",
            "skazani na shawshank",
            common::search_page(&[SearchBlock {
                title: "Skazani na Shawshank",
                href: "napisy-1-Skazani",
                imdb_id: None,
            }]),
        )
        .on_post_field(
            SEARCH_URL,
            "queryString",
            "the shawshank redemption",
            common::search_page(&[
                SearchBlock {
                    title: "The Shawshank Redemption",
                    href: "napisy-2-Shawshank",
                    imdb_id: None,
                },
                SearchBlock {
                    title: "Skazani na Shawshank",
                    href: "napisy-1-Skazani",
                    imdb_id: None,
                },
            ]),
        );
    let query = MediaQuery::new("Skazani na Shawshank").with_alternate_title("The Shawshank Redemption");

    let candidates = service(&transport)
        .search_candidates(&query, &RequestContext::new())
        .await
        .unwrap();

    let hrefs: Vec<&str> = candidates.iter().map(|c| c.detail_href.as_str()).collect();
    assert_eq!(hrefs, vec!["napisy-1-Skazani", "napisy-2-Shawshank"]);
    assert_eq!(transport.request_count(), 2);
}

/// A search without matches reports no match
#[tokio::test]
async fn test_searchCandidates_withoutMatch_shouldReturnNoMatch() {
    let transport = MockTransport::new().on_post(SEARCH_URL, shawshank_search());
    let query = MediaQuery::new("Nieistniejący film");

    let result = service(&transport).search_candidates(&query, &RequestContext::new()).await;

    assert!(matches!(result, Err(CatalogError::NoMatch(_))));
}

/// A failing service yields an empty listing, not an error
#[tokio::test]
async fn test_listSubtitles_withFailingService_shouldReturnEmpty() {
    let transport = MockTransport::failing(ProviderError::ApiError {
        status_code: 503,
        message: "maintenance".to_string(),
    });
    let query = MediaQuery::new("Skazani na Shawshank");

    let entries = service(&transport)
        .list_subtitles(&query, &VideoSignal::default(), &RequestContext::new())
        .await;

    assert!(entries.is_empty());
    assert_eq!(transport.request_count(), 1);
}

/// Queries without titles or id are not sent
#[tokio::test]
async fn test_listSubtitles_withEmptyQuery_shouldNotSearch() {
    let transport = shawshank_transport();

    let entries = service(&transport)
        .list_subtitles(&MediaQuery::default(), &VideoSignal::default(), &RequestContext::new())
        .await;

    assert!(entries.is_empty());
    assert_eq!(transport.request_count(), 0);
}

#[derive(Debug)]
struct FixedResolver;

#[async_trait]
impl TitleResolver for FixedResolver {
    async fn resolve(&self, primary_id: &str, _ctx: &RequestContext) -> Option<ResolvedTitle> {
        (primary_id == "tt0111161").then(|| ResolvedTitle {
            title: Some("Skazani na Shawshank".to_string()),
            tvshow: None,
            year: Some(1994),
        })
    }
}

/// Id-only queries take their title from the resolver
#[tokio::test]
async fn test_listSubtitles_withIdOnlyQuery_shouldUseResolvedTitle() {
    let transport = shawshank_transport();
    let service = service(&transport).with_resolver(Arc::new(FixedResolver));
    let query = MediaQuery::default().with_primary_id("tt0111161");

    let entries = service
        .list_subtitles(&query, &VideoSignal::default(), &RequestContext::new())
        .await;

    assert_eq!(entries.len(), 3);
    let search = &transport.requests()[0];
    assert_eq!(search.field("queryString"), Some("skazani na shawshank"));
    assert_eq!(search.field("queryYear"), Some("1994"));
    assert_eq!(search.field("associate"), Some("tt0111161"));
}

/// Id-only queries without a resolver search by id and match by reference
#[tokio::test]
async fn test_listSubtitles_withIdOnlyQueryAndNoResolver_shouldMatchByReference() {
    let transport = shawshank_transport();
    let query = MediaQuery::default().with_primary_id("tt0111161");

    let entries = service(&transport)
        .list_subtitles(&query, &VideoSignal::default(), &RequestContext::new())
        .await;

    assert_eq!(entries.len(), 3);
    assert_eq!(transport.requests()[0].field("queryString"), Some("tt0111161"));
}

/// A container payload is decoded and converted to SRT
#[tokio::test]
async fn test_fetchCaption_withContainer_shouldReturnSrt() {
    let transport = MockTransport::new().on_post_field(
        DOWNLOAD_URL,
        "downloaded_subtitles_id",
        "exact",
        common::download_response(&encode_container(common::MICRODVD_SAMPLE).unwrap()),
    );

    let srt = service(&transport).fetch_caption("exact", &RequestContext::new()).await.unwrap();

    assert_eq!(srt.as_deref(), Some(EXPECTED_SRT));

    let request = &transport.requests()[0];
    assert_eq!(request.field("mode"), Some("17"));
    assert_eq!(request.field("client"), Some("NapiProjekt"));
    assert_eq!(request.field("downloaded_subtitles_lang"), Some("PL"));
    assert_eq!(request.field("downloaded_subtitles_txt"), Some("1"));
}

/// Plain text payloads are converted too
#[tokio::test]
async fn test_fetchCaption_withPlainText_shouldReturnSrt() {
    let transport = MockTransport::new().on_post(
        DOWNLOAD_URL,
        common::download_response(common::MICRODVD_SAMPLE.as_bytes()),
    );

    let srt = service(&transport).fetch_caption("h", &RequestContext::new()).await.unwrap();

    assert_eq!(srt.as_deref(), Some(EXPECTED_SRT));
}

/// A corrupted download is retried once
#[tokio::test]
async fn test_fetchCaption_withCorruptedFirstDownload_shouldRetry() {
    let good = encode_container(common::MICRODVD_SAMPLE).unwrap();
    let mut bad = good.clone();
    let last = bad.len() - 1;
    bad[last] ^= 0xFF;

    let transport = MockTransport::new().on_post_field_sequence(
        DOWNLOAD_URL,
        "downloaded_subtitles_id",
        "h",
        vec![Ok(common::download_response(&bad)), Ok(common::download_response(&good))],
    );

    let srt = service(&transport).fetch_caption("h", &RequestContext::new()).await.unwrap();

    assert_eq!(srt.as_deref(), Some(EXPECTED_SRT));
    assert_eq!(transport.request_count(), 2);
}

/// Repeated corruption is reported after the second attempt
#[tokio::test]
async fn test_fetchCaption_withPersistentCorruption_shouldFail() {
    let mut bad = encode_container(common::MICRODVD_SAMPLE).unwrap();
    let last = bad.len() - 1;
    bad[last] ^= 0xFF;
    let transport = MockTransport::new().on_post(DOWNLOAD_URL, common::download_response(&bad));

    let result = service(&transport).fetch_caption("h", &RequestContext::new()).await;

    assert!(matches!(result, Err(CatalogError::Payload(PayloadError::Checksum { .. }))));
    assert_eq!(transport.request_count(), 2);
}

/// An empty payload means there is nothing to show
#[tokio::test]
async fn test_fetchCaption_withEmptyContent_shouldReturnNone() {
    let transport = MockTransport::new().on_post(
        DOWNLOAD_URL,
        "<result><status>success</status><content></content></result>",
    );

    let srt = service(&transport).fetch_caption("h", &RequestContext::new()).await.unwrap();

    assert!(srt.is_none());
    assert_eq!(transport.request_count(), 1);
}

/// Text in an unknown notation is not returned
#[tokio::test]
async fn test_fetchCaption_withUnknownNotation_shouldReturnNone() {
    let transport = MockTransport::new().on_post(
        DOWNLOAD_URL,
        common::download_response("just some words\nwithout timing".as_bytes()),
    );

    let srt = service(&transport).fetch_caption("h", &RequestContext::new()).await.unwrap();

    assert!(srt.is_none());
}

/// Transport failures surface as provider errors
#[tokio::test]
async fn test_fetchCaption_withTransportFailure_shouldFail() {
    let transport = MockTransport::failing(ProviderError::ConnectionError("refused".to_string()));

    let result = service(&transport).fetch_caption("h", &RequestContext::new()).await;

    assert!(matches!(
        result,
        Err(CatalogError::Provider(ProviderError::ConnectionError(_)))
    ));
}

/// Blocking callers can drive the service on their own runtime
#[test]
fn test_fetchCaption_fromBlockingCaller_shouldReturnSrt() {
    let transport = MockTransport::new().on_post(
        DOWNLOAD_URL,
        common::download_response(&encode_container(common::MICRODVD_SAMPLE).unwrap()),
    );
    let service = service(&transport);

    let result = tokio_test::block_on(async { service.fetch_caption("h", &RequestContext::new()).await });

    assert_eq!(result.unwrap().as_deref(), Some(EXPECTED_SRT));
}
