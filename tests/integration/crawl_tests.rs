//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end against in-memory storage.

use linkscan::config::Config;
use linkscan::output::{get_report, severity, severity_at_least, status_is};
use linkscan::storage::{self, share, SharedStorage, SqliteStorage, Storage};
use linkscan::{normalize, start_crawl, Coordinator, JobStatus, ScanError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a test configuration with a short timeout
fn test_config(page_limit: usize) -> Config {
    let mut config = Config::default();
    config.crawler.page_limit = page_limit;
    config.crawler.timeout_secs = 2;
    config
}

fn memory_storage() -> SharedStorage {
    share(SqliteStorage::new_in_memory().expect("in-memory database"))
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Serves `/page/N` linking to `/page/N+1`, forever
struct Pagination;

impl Respond for Pagination {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let current: u64 = request
            .url
            .path()
            .trim_start_matches("/page/")
            .parse()
            .unwrap_or(0);
        html(&format!(r#"<a href="/page/{}">Next</a>"#, current + 1))
    }
}

/// Cancels the crawl when the `nth` request (1-based) reaches this mock
struct CancelOnRequest {
    token: CancellationToken,
    nth: usize,
    seen: AtomicUsize,
    response: ResponseTemplate,
}

impl CancelOnRequest {
    fn new(token: CancellationToken, nth: usize, response: ResponseTemplate) -> Self {
        Self {
            token,
            nth,
            seen: AtomicUsize::new(0),
            response,
        }
    }
}

impl Respond for CancelOnRequest {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        if self.seen.fetch_add(1, Ordering::SeqCst) + 1 == self.nth {
            self.token.cancel();
        }
        self.response.clone()
    }
}

#[tokio::test]
async fn test_single_page_with_placeholder_link() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="javascript:void(0)">Menu</a>"#).await;

    let shared = memory_storage();
    let job = start_crawl(test_config(100), shared.clone(), &server.uri(), "owner")
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.pages_visited, 1);
    assert_eq!(job.requester, "owner");

    let guard = storage::lock(&shared).unwrap();
    assert_eq!(guard.count_edges(job.id).unwrap(), 1);

    let placeholder = guard
        .get_probe(job.id, "javascript:void(0)")
        .unwrap()
        .expect("placeholder recorded");
    assert_eq!(severity(&placeholder), 0);
    assert_eq!(placeholder.status_code, None);

    // Root plus the placeholder
    assert_eq!(guard.count_probes(job.id).unwrap(), 2);
}

#[tokio::test]
async fn test_self_link_does_not_recurse() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/">Home</a><a href="/#top">Top</a>"#))
        // One probe of the root plus one fetch
        .expect(2)
        .mount(&server)
        .await;

    let shared = memory_storage();
    let job = start_crawl(test_config(100), shared.clone(), &server.uri(), "owner")
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.pages_visited, 1);

    let guard = storage::lock(&shared).unwrap();
    assert_eq!(guard.count_edges(job.id).unwrap(), 2);
    assert_eq!(guard.count_probes(job.id).unwrap(), 1);
}

#[tokio::test]
async fn test_404_report_lists_every_source() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/a">A</a><a href="/missing">Missing</a><a href="/missing">Again</a>"#,
    )
    .await;
    mount_page(&server, "/a", r#"<a href="/missing">Missing</a>"#).await;
    // /missing is unmatched, so wiremock answers 404

    let shared = memory_storage();
    let job = start_crawl(test_config(100), shared.clone(), &server.uri(), "owner")
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed);

    let root_key = normalize(&server.uri());
    let missing_key = format!("{}/missing", root_key);

    let guard = storage::lock(&shared).unwrap();
    let report = get_report(&*guard, job.id, status_is(404)).unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(
        report.sources(&missing_key).unwrap().to_vec(),
        vec![root_key.clone(), format!("{}/a", root_key)]
    );
}

#[tokio::test]
async fn test_report_includes_orphan_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let shared = memory_storage();
    let job = start_crawl(test_config(100), shared.clone(), &server.uri(), "owner")
        .await
        .unwrap();

    let guard = storage::lock(&shared).unwrap();
    let report = get_report(&*guard, job.id, severity_at_least(1)).unwrap();

    let root_key = normalize(&server.uri());
    assert_eq!(report.sources(&root_key).unwrap().len(), 0);
}

#[tokio::test]
async fn test_flat_file_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/archive.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 1024]))
        // Probed once, never fetched for links
        .expect(1)
        .mount(&server)
        .await;

    let root = format!("{}/files/archive.zip", server.uri());
    let shared = memory_storage();
    let job = start_crawl(test_config(100), shared.clone(), &root, "owner")
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);

    let guard = storage::lock(&shared).unwrap();
    assert_eq!(guard.count_edges(job.id).unwrap(), 0);

    let probe = guard
        .get_probe(job.id, &normalize(&root))
        .unwrap()
        .expect("root probed");
    assert_eq!(probe.status_code, Some(200));
}

#[tokio::test]
async fn test_cycle_is_visited_once() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">A</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<a href="/b">B</a><a href="/">Home</a>"#))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html(r#"<a href="/a">A</a>"#))
        .expect(2)
        .mount(&server)
        .await;

    let shared = memory_storage();
    let job = start_crawl(test_config(100), shared.clone(), &server.uri(), "owner")
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.pages_visited, 3);

    let guard = storage::lock(&shared).unwrap();
    assert_eq!(guard.count_probes(job.id).unwrap(), 3);
    assert_eq!(guard.count_edges(job.id).unwrap(), 4);
}

#[tokio::test]
async fn test_external_link_probed_not_followed() {
    let site = MockServer::start().await;
    let external = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(html(r#"<a href="/deeper">Deeper</a>"#))
        .expect(1)
        .mount(&external)
        .await;

    let external_link = format!("{}/elsewhere", external.uri());
    mount_page(
        &site,
        "/",
        &format!(r#"<a href="{}">Elsewhere</a>"#, external_link),
    )
    .await;

    let shared = memory_storage();
    let job = start_crawl(test_config(100), shared.clone(), &site.uri(), "owner")
        .await
        .unwrap();

    assert_eq!(job.pages_visited, 1);

    let guard = storage::lock(&shared).unwrap();
    let probe = guard
        .get_probe(job.id, &normalize(&external_link))
        .unwrap()
        .expect("external link probed");
    assert_eq!(probe.status_code, Some(200));
    assert!(guard
        .get_probe(job.id, &format!("{}/deeper", normalize(&external.uri())))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_same_host_outside_root_path_not_followed() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/blog",
        r#"<a href="/about">About</a><a href="/blog/post">Post</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(r#"<a href="/about/team">Team</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blog/post"))
        .respond_with(html("<p>No links</p>"))
        .expect(2)
        .mount(&server)
        .await;

    let root = format!("{}/blog", server.uri());
    let shared = memory_storage();
    let job = start_crawl(test_config(100), shared.clone(), &root, "owner")
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.pages_visited, 2);

    let guard = storage::lock(&shared).unwrap();
    let about_key = format!("{}/about", normalize(&server.uri()));
    assert_eq!(
        guard.sources_for(job.id, &about_key).unwrap(),
        vec![normalize(&root)]
    );
}

#[tokio::test]
async fn test_relative_links_resolve_against_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="docs/">Docs</a>"#).await;
    mount_page(&server, "/docs/", r#"<a href="intro">Intro</a>"#).await;
    mount_page(&server, "/docs/intro", "<p>Intro</p>").await;

    let shared = memory_storage();
    let job = start_crawl(test_config(100), shared.clone(), &server.uri(), "owner")
        .await
        .unwrap();

    assert_eq!(job.pages_visited, 3);

    let guard = storage::lock(&shared).unwrap();
    let intro = guard
        .get_probe(job.id, &format!("{}/docs/intro", normalize(&server.uri())))
        .unwrap()
        .expect("intro probed");
    assert_eq!(intro.status_code, Some(200));
    assert_eq!(intro.url_raw, "intro");
}

#[tokio::test]
async fn test_failing_page_yields_no_links() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/broken">Broken</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_raw(
            r#"<a href="/hidden">Hidden</a>"#,
            "text/html",
        ))
        .mount(&server)
        .await;

    let shared = memory_storage();
    let job = start_crawl(test_config(100), shared.clone(), &server.uri(), "owner")
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.pages_visited, 2);

    let guard = storage::lock(&shared).unwrap();
    let broken_key = format!("{}/broken", normalize(&server.uri()));
    let report = get_report(&*guard, job.id, severity_at_least(1)).unwrap();
    assert!(report.sources(&broken_key).is_some());
    assert_eq!(guard.count_probes(job.id).unwrap(), 2);
}

#[tokio::test]
async fn test_page_limit_halts_infinite_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(Pagination)
        .mount(&server)
        .await;

    let shared = memory_storage();
    let job = start_crawl(test_config(5), shared.clone(), &server.uri(), "owner")
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::LimitExceeded);
    assert!(job.is_partial());
    assert_eq!(job.pages_visited, 5);
    assert!(job.finished_at.is_some());

    let guard = storage::lock(&shared).unwrap();
    // Root, /page/1..4 visited; /page/5 was discovered and probed
    assert_eq!(guard.count_probes(job.id).unwrap(), 6);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(r#"<a href="/a">A</a>"#))
        .expect(0)
        .mount(&server)
        .await;

    let shared = memory_storage();
    let coordinator =
        Coordinator::new(test_config(100), shared.clone(), &server.uri(), "owner", "hash").unwrap();
    coordinator.cancellation_token().cancel();

    let job = coordinator.run().await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.pages_visited, 0);
    assert_eq!(job.config_hash, "hash");

    let guard = storage::lock(&shared).unwrap();
    assert_eq!(guard.count_probes(job.id).unwrap(), 0);
}

#[tokio::test]
async fn test_flat_files_recorded_without_request() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/video.mp4">Video</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/video.mp4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(100);
    config.crawler.probe_flat_files = false;

    let shared = memory_storage();
    let job = start_crawl(config, shared.clone(), &server.uri(), "owner")
        .await
        .unwrap();

    let guard = storage::lock(&shared).unwrap();
    let video = guard
        .get_probe(job.id, &format!("{}/video.mp4", normalize(&server.uri())))
        .unwrap()
        .expect("flat file recorded");
    assert_eq!(video.status_code, None);
    assert_eq!(video.note.as_deref(), Some("Flat file not checked"));
}

#[tokio::test]
async fn test_invalid_root_is_rejected() {
    let result = start_crawl(test_config(100), memory_storage(), "ftp://example.com/", "owner").await;
    assert!(matches!(result, Err(ScanError::InvalidRoot { .. })));
}

#[tokio::test]
async fn test_jobs_are_independent() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&server, "/a", "<p>A</p>").await;

    let shared = memory_storage();
    let first = start_crawl(test_config(100), shared.clone(), &server.uri(), "one")
        .await
        .unwrap();
    let second = start_crawl(test_config(100), shared.clone(), &server.uri(), "two")
        .await
        .unwrap();

    assert_ne!(first.id, second.id);

    let guard = storage::lock(&shared).unwrap();
    assert_eq!(guard.count_probes(first.id).unwrap(), 2);
    assert_eq!(guard.count_probes(second.id).unwrap(), 2);
}

#[tokio::test]
async fn test_relative_links_follow_redirected_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/docs">Docs</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/docs/"))
        .mount(&server)
        .await;
    mount_page(&server, "/docs/", r#"<a href="intro">Intro</a>"#).await;
    mount_page(&server, "/docs/intro", "<p>Intro</p>").await;

    let shared = memory_storage();
    let job = start_crawl(test_config(100), shared.clone(), &server.uri(), "owner")
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed);

    let root_key = normalize(&server.uri());
    let guard = storage::lock(&shared).unwrap();

    let intro = guard
        .get_probe(job.id, &format!("{}/docs/intro", root_key))
        .unwrap()
        .expect("intro resolved against the redirect target");
    assert_eq!(intro.status_code, Some(200));
    assert!(guard
        .get_probe(job.id, &format!("{}/intro", root_key))
        .unwrap()
        .is_none());

    let report = get_report(&*guard, job.id, status_is(404)).unwrap();
    assert!(report.is_empty());
}

#[tokio::test]
async fn test_cancelled_while_fetching_page() {
    let server = MockServer::start().await;
    let shared = memory_storage();
    let coordinator =
        Coordinator::new(test_config(100), shared.clone(), &server.uri(), "owner", "").unwrap();

    // First request checks the root, the second fetches it for links
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(CancelOnRequest::new(
            coordinator.cancellation_token(),
            2,
            html(r#"<a href="/a">A</a>"#).set_delay(Duration::from_secs(1)),
        ))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html("<p>A</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let job = coordinator.run().await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(job.is_partial());
    assert_eq!(job.pages_visited, 1);

    let guard = storage::lock(&shared).unwrap();
    assert_eq!(guard.count_probes(job.id).unwrap(), 1);
    assert_eq!(guard.count_edges(job.id).unwrap(), 0);
}

#[tokio::test]
async fn test_cancelled_while_checking_links() {
    let server = MockServer::start().await;
    let mut config = test_config(100);
    config.crawler.max_concurrent_probes = 1;

    let shared = memory_storage();
    let coordinator =
        Coordinator::new(config, shared.clone(), &server.uri(), "owner", "").unwrap();

    mount_page(
        &server,
        "/",
        r#"<a href="/first">First</a><a href="/second">Second</a>"#,
    )
    .await;
    // The in-flight check of /first completes; nothing starts afterwards
    Mock::given(method("GET"))
        .and(path("/first"))
        .respond_with(CancelOnRequest::new(
            coordinator.cancellation_token(),
            1,
            html(r#"<a href="/first/child">Child</a>"#).set_delay(Duration::from_millis(200)),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/second"))
        .respond_with(html("<p>Second</p>"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/first/child"))
        .respond_with(html("<p>Child</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let job = coordinator.run().await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.pages_visited, 1);

    let root_key = normalize(&server.uri());
    let guard = storage::lock(&shared).unwrap();

    let first = guard
        .get_probe(job.id, &format!("{}/first", root_key))
        .unwrap()
        .expect("in-flight check recorded");
    assert_eq!(first.status_code, Some(200));
    assert!(guard
        .get_probe(job.id, &format!("{}/second", root_key))
        .unwrap()
        .is_none());
    // Edges of the fetched page are kept as partial results
    assert_eq!(guard.count_edges(job.id).unwrap(), 2);
}
