//! Integration tests for the crawl engine
//!
//! These tests use wiremock to create mock HTTP servers and test the
//! full crawl cycle end-to-end, plus mock backends for retry behavior
//! that a real server cannot express deterministically.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docharvest::backend::{
    Backend, BackendCriteria, BackendRegistry, FetchConfig, FetchResponse, HttpBackend,
};
use docharvest::config::Config;
use docharvest::crawler::UrlDiscovery;
use docharvest::processor::{
    BasicQualityChecker, ContentProcessor, HtmlProcessor, MemoryOrganizer, ProcessedContent,
};
use docharvest::url::UrlInfo;
use docharvest::{BackendError, CrawlError, CrawlOrchestrator, CrawlTarget, ProcessError};

/// Creates a fast test configuration with retries enabled
fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.concurrent_requests = 5;
    config.crawler.rate_limit_secs = 0.0; // No throttling in tests
    config.crawler.max_retries = 3;
    config.crawler.retry_base_delay_ms = 1;
    config.crawler.retry_max_delay_ms = 10;
    config
}

/// Builds an orchestrator around the given registry with the default
/// HTML processor and in-memory collaborators
fn orchestrator_with(config: Config, registry: BackendRegistry) -> CrawlOrchestrator {
    CrawlOrchestrator::new(
        config,
        Arc::new(registry),
        Arc::new(HtmlProcessor::new()),
        Arc::new(BasicQualityChecker::default()),
        Arc::new(MemoryOrganizer::new()),
    )
}

fn http_registry(config: &Config) -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry
        .register(
            "http",
            Arc::new(HttpBackend::new(&config.user_agent.full_agent()).unwrap()),
            BackendCriteria::with_priority(10),
        )
        .unwrap();
    registry
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        "Home",
        &format!(
            r#"<a href="{0}/page1">Page 1</a> <a href="{0}/page2">Page 2</a>"#,
            base_url
        ),
    )
    .await;
    mount_page(&mock_server, "/page1", "Page 1", "Content 1").await;
    mount_page(&mock_server, "/page2", "Page 2", "Content 2").await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new(&format!("{}/", base_url), 2);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    assert_eq!(result.stats.pages_crawled, 3);
    assert_eq!(result.stats.successful_crawls, 3);
    assert_eq!(result.stats.failed_crawls, 0);
    assert_eq!(result.documents.len(), 3);
    assert!(result.stats.end_time.is_some());
    assert!(result.stats.bytes_processed > 0);

    let titles: Vec<_> = result
        .documents
        .iter()
        .filter_map(|d| d.title.as_deref())
        .collect();
    assert!(titles.contains(&"Home"));
    assert!(titles.contains(&"Page 1"));
    assert!(titles.contains(&"Page 2"));

    let structure = result.structure.expect("Missing corpus structure");
    assert_eq!(structure.total_documents, 3);
}

#[tokio::test]
async fn test_depth_zero_crawls_seed_only() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        "Root",
        &format!(r#"<a href="{}/level1">Level 1</a>"#, base_url),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/level1"))
        .respond_with(html_page("Level 1", ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new(&format!("{}/", base_url), 0);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    assert_eq!(result.stats.pages_crawled, 1);
    assert_eq!(result.documents.len(), 1);
    assert_eq!(result.crawled_urls.len(), 1);
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Chain: / -> level1 -> level2 -> level3; depth 2 stops before level3
    mount_page(
        &mock_server,
        "/",
        "Root",
        &format!(r#"<a href="{}/level1">Level 1</a>"#, base_url),
    )
    .await;
    mount_page(
        &mock_server,
        "/level1",
        "Level 1",
        &format!(r#"<a href="{}/level2">Level 2</a>"#, base_url),
    )
    .await;
    mount_page(
        &mock_server,
        "/level2",
        "Level 2",
        &format!(r#"<a href="{}/level3">Level 3</a>"#, base_url),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/level3"))
        .respond_with(html_page("Level 3", ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new(&format!("{}/", base_url), 2);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    assert_eq!(result.stats.pages_crawled, 3);
    assert_eq!(result.stats.failed_crawls, 0);
}

#[tokio::test]
async fn test_max_pages_bounds_the_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="{}/page{}">P{}</a> "#, base_url, i, i))
        .collect();
    mount_page(&mock_server, "/", "Home", &links).await;
    for i in 1..=5 {
        mount_page(&mock_server, &format!("/page{}", i), &format!("P{}", i), "x").await;
    }

    let mut config = test_config();
    // Serial dispatch keeps the crawl order deterministic
    config.crawler.concurrent_requests = 1;
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let mut target = CrawlTarget::new(&format!("{}/", base_url), 2);
    target.max_pages = 2;
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    assert_eq!(result.stats.pages_crawled, 2);
    assert_eq!(result.documents.len(), 2);
}

#[tokio::test]
async fn test_max_pages_exact_under_concurrency() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="{}/page{}">P{}</a> "#, base_url, i, i))
        .collect();
    mount_page(&mock_server, "/", "Home", &links).await;
    for i in 1..=5 {
        mount_page(&mock_server, &format!("/page{}", i), &format!("P{}", i), "x").await;
    }

    // Each batch is capped by the remaining page budget, so even with
    // five slots the crawl lands exactly on the limit
    let config = test_config(); // concurrent_requests = 5
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let mut target = CrawlTarget::new(&format!("{}/", base_url), 2);
    target.max_pages = 2;
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    assert_eq!(result.stats.pages_crawled, 2);
    assert_eq!(result.documents.len(), 2);
}

#[tokio::test]
async fn test_external_links_not_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        "Home",
        &format!(
            r#"<a href="{}/internal">In</a> <a href="https://elsewhere.example/doc">Out</a>"#,
            base_url
        ),
    )
    .await;
    mount_page(&mock_server, "/internal", "Internal", "x").await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new(&format!("{}/", base_url), 2);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    assert_eq!(result.stats.pages_crawled, 2);
    assert_eq!(result.stats.failed_crawls, 0);
    assert!(result
        .crawled_urls
        .iter()
        .all(|u| !u.contains("elsewhere.example")));
}

#[tokio::test]
async fn test_exclude_wins_over_include() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        "Home",
        &format!(
            r#"<a href="{0}/keep">Keep</a> <a href="{0}/skip-me">Skip</a>"#,
            base_url
        ),
    )
    .await;
    mount_page(&mock_server, "/keep", "Keep", "x").await;
    Mock::given(method("GET"))
        .and(path("/skip-me"))
        .respond_with(html_page("Skip", "x"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let mut target = CrawlTarget::new(&format!("{}/", base_url), 2);
    // skip-me matches both lists; exclude must win
    target.include_patterns = vec![".*".to_string()];
    target.exclude_patterns = vec![".*skip-me.*".to_string()];
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    assert_eq!(result.stats.pages_crawled, 2);
    assert!(result.crawled_urls.iter().all(|u| !u.contains("skip-me")));
}

#[tokio::test]
async fn test_http_error_fails_without_retry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        "Home",
        &format!(r#"<a href="{}/gone">Gone</a>"#, base_url),
    )
    .await;
    // An explicit status is permanent: exactly one attempt
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new(&format!("{}/", base_url), 2);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    assert_eq!(result.stats.pages_crawled, 1);
    assert_eq!(result.stats.failed_crawls, 1);
    assert_eq!(result.failed_urls.len(), 1);
    let detail = result.errors.values().next().expect("Missing error detail");
    assert!(detail.contains("404"), "unexpected detail: {}", detail);
}

#[tokio::test]
async fn test_content_type_mismatch_counts_toward_nothing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        "Home",
        &format!(r#"<a href="{}/document.pdf">PDF</a>"#, base_url),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/document.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x25, 0x50, 0x44, 0x46]) // %PDF
                .insert_header("content-type", "application/pdf"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new(&format!("{}/", base_url), 2);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    // The PDF was fetched but is neither a success nor a failure
    assert_eq!(result.stats.pages_crawled, 1);
    assert_eq!(result.stats.successful_crawls, 1);
    assert_eq!(result.stats.failed_crawls, 0);
    assert!(result.crawled_urls.iter().all(|u| !u.contains(".pdf")));
}

#[tokio::test]
async fn test_redirects_to_same_page_produce_one_document() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        "Home",
        &format!(
            r#"<a href="{0}/old1">Old 1</a> <a href="{0}/old2">Old 2</a>"#,
            base_url
        ),
    )
    .await;
    let target_url = format!("{}/target", base_url);
    for old in ["/old1", "/old2"] {
        Mock::given(method("GET"))
            .and(path(old))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", target_url.as_str()),
            )
            .mount(&mock_server)
            .await;
    }
    mount_page(&mock_server, "/target", "Target", "final content").await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new(&format!("{}/", base_url), 2);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    // Home plus exactly one document for the redirect target
    let target_docs = result
        .documents
        .iter()
        .filter(|d| d.url.contains("/target"))
        .count();
    assert_eq!(target_docs, 1);
    assert_eq!(result.stats.pages_crawled, 2);
    assert_eq!(result.stats.failed_crawls, 0);
}

#[tokio::test]
async fn test_cancellation_returns_partial_result() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(html_page("Never", ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let (tx, rx) = watch::channel(false);
    tx.send(true).expect("receiver dropped");

    let target = CrawlTarget::new(&format!("{}/", base_url), 2);
    let result = orchestrator
        .crawl_with_cancel(&target, rx)
        .await
        .expect("Cancelled crawl must still return a result");

    assert_eq!(result.stats.pages_crawled, 0);
    assert!(result.documents.is_empty());
    assert!(result.stats.end_time.is_some());
}

#[tokio::test]
async fn test_no_backend_for_seed_is_fatal() {
    let config = test_config();
    let orchestrator = orchestrator_with(config, BackendRegistry::new());

    let target = CrawlTarget::new("https://example.com/docs/", 1);
    let result = orchestrator.crawl(&target).await;
    assert!(matches!(
        result,
        Err(CrawlError::NoBackendAvailable { .. })
    ));
}

#[tokio::test]
async fn test_non_url_target_without_discovery_fails() {
    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new("serde", 1);
    let result = orchestrator.crawl(&target).await;
    assert!(matches!(result, Err(CrawlError::Discovery { .. })));
}

struct FixedDiscovery {
    url: String,
}

#[async_trait]
impl UrlDiscovery for FixedDiscovery {
    async fn resolve(&self, _name: &str) -> docharvest::Result<String> {
        Ok(self.url.clone())
    }
}

#[tokio::test]
async fn test_discovery_resolves_package_name() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", "Resolved Docs", "content").await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry).with_discovery(Arc::new(
        FixedDiscovery {
            url: format!("{}/", base_url),
        },
    ));

    let target = CrawlTarget::new("some-package", 0);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    assert_eq!(result.stats.pages_crawled, 1);
    assert_eq!(
        result.documents[0].title.as_deref(),
        Some("Resolved Docs")
    );
}

/// Backend that fails transiently a fixed number of times, then succeeds
struct FlakyBackend {
    attempts: AtomicU32,
    failures_before_success: u32,
}

#[async_trait]
impl Backend for FlakyBackend {
    async fn fetch(
        &self,
        info: &UrlInfo,
        _config: &FetchConfig,
    ) -> Result<FetchResponse, BackendError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures_before_success {
            return Err(BackendError::Connection {
                url: info.normalized.clone(),
                message: "reset by peer".to_string(),
            });
        }
        Ok(FetchResponse {
            status: 200,
            final_url: None,
            content: "<html><head><title>Flaky</title></head><body>ok</body></html>".to_string(),
            content_type: Some("text/html".to_string()),
            metadata: Default::default(),
        })
    }
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let backend = Arc::new(FlakyBackend {
        attempts: AtomicU32::new(0),
        failures_before_success: 2,
    });
    let mut registry = BackendRegistry::new();
    registry
        .register("flaky", Arc::clone(&backend) as Arc<dyn Backend>, BackendCriteria::default())
        .unwrap();

    let config = test_config(); // max_retries = 3
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new("https://example.com/docs/", 0);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    assert_eq!(backend.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(result.stats.successful_crawls, 1);
    assert_eq!(result.stats.failed_crawls, 0);
}

#[tokio::test]
async fn test_retries_exhausted_records_failure() {
    let backend = Arc::new(FlakyBackend {
        attempts: AtomicU32::new(0),
        failures_before_success: u32::MAX,
    });
    let mut registry = BackendRegistry::new();
    registry
        .register("flaky", Arc::clone(&backend) as Arc<dyn Backend>, BackendCriteria::default())
        .unwrap();

    let config = test_config();
    let max_retries = config.crawler.max_retries;
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new("https://example.com/docs/", 0);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    // Exactly max_retries attempts, then one recorded failure
    assert_eq!(backend.attempts.load(Ordering::SeqCst), max_retries);
    assert_eq!(result.stats.pages_crawled, 0);
    assert_eq!(result.stats.failed_crawls, 1);
    assert!(result.errors.contains_key("https://example.com/docs"));
}

#[tokio::test]
async fn test_quality_findings_reach_the_result() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // No title and nearly no content: the default checker must complain
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>tiny</body></html>", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new(&format!("{}/", base_url), 0);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    assert_eq!(result.stats.pages_crawled, 1);
    assert!(result.stats.quality_issues >= 1);
    let (_, issues) = result.issues.iter().next().expect("Missing issue entry");
    assert!(issues.iter().any(|i| i.message.contains("No title")));
    let (_, metrics) = result.metrics.iter().next().expect("Missing metrics");
    assert!(metrics.contains_key("word_count"));
}

struct FailingProcessor;

#[async_trait]
impl ContentProcessor for FailingProcessor {
    async fn process(
        &self,
        _raw_content: &str,
        _base_url: &Url,
    ) -> Result<ProcessedContent, ProcessError> {
        Err(ProcessError::Parse("boom".to_string()))
    }
}

#[tokio::test]
async fn test_processor_error_is_recorded_not_propagated() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", "Home", "content").await;

    let config = test_config();
    let registry = http_registry(&config);
    let orchestrator = CrawlOrchestrator::new(
        config,
        Arc::new(registry),
        Arc::new(FailingProcessor),
        Arc::new(BasicQualityChecker::default()),
        Arc::new(MemoryOrganizer::new()),
    );

    let target = CrawlTarget::new(&format!("{}/", base_url), 0);
    let result = orchestrator
        .crawl(&target)
        .await
        .expect("A processor error must not abort the crawl");

    assert_eq!(result.stats.pages_crawled, 0);
    assert_eq!(result.stats.failed_crawls, 1);
    assert!(result.documents.is_empty());
    let detail = result.errors.values().next().expect("Missing error detail");
    assert!(detail.contains("boom"), "unexpected detail: {}", detail);
}

#[tokio::test]
async fn test_selection_failure_for_discovered_url_continues() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        "Home",
        &format!(r#"<a href="{}/other">Other</a>"#, base_url),
    )
    .await;
    // Never fetched: selection fails before any backend call
    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(html_page("Other", "x"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = test_config();
    let mut registry = BackendRegistry::new();
    // Backend scoped to the site root only; the discovered page matches
    // no registered criteria
    registry
        .register(
            "root-only",
            Arc::new(HttpBackend::new(&config.user_agent.full_agent()).unwrap()),
            BackendCriteria {
                priority: 10,
                url_patterns: vec![".*/$".to_string()],
                ..Default::default()
            },
        )
        .unwrap();
    let orchestrator = orchestrator_with(config, registry);

    let target = CrawlTarget::new(&format!("{}/", base_url), 2);
    let result = orchestrator.crawl(&target).await.expect("Crawl failed");

    // Seed crawled, discovered URL recorded as a failure, crawl intact
    assert_eq!(result.stats.pages_crawled, 1);
    assert_eq!(result.stats.failed_crawls, 1);
    let (failed_url, detail) = result.errors.iter().next().expect("Missing error entry");
    assert!(failed_url.ends_with("/other"), "wrong URL: {}", failed_url);
    assert!(detail.contains("No backend"), "unexpected detail: {}", detail);
}
