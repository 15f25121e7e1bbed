//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a miniature ATC index and run the
//! full crawl cycle end-to-end, checking the CSV feed and close reason.

use atc_spider::config::Config;
use atc_spider::crawler::{ClassificationRecord, Coordinator, CrawlOutcome, CrawlRequest, PageNode};
use atc_spider::output::{OutputError, OutputResult, RecordSink};
use atc_spider::report::CrawlObserver;
use atc_spider::state::CrawlState;
use atc_spider::AtcError;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDEX_PATH: &str = "/atc_ddd_index/";

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = format!("{}{}", server.uri(), INDEX_PATH);
    config.site.allowed_domains = vec!["127.0.0.1".to_string()];
    config.crawler.download_delay_ms = 0;
    config.crawler.concurrent_requests = 4;
    config.crawler.download_timeout_secs = 5;
    config.output.directory = output_dir.to_string_lossy().into_owned();
    config
}

fn link(code: &str, label: &str) -> String {
    format!(
        r#"<a href="./?code={}&amp;showdescription=no">{}</a>"#,
        code, label
    )
}

fn section_links(entries: &[(&str, &str)]) -> String {
    entries
        .iter()
        .map(|(code, label)| format!("<p><b>{}</b></p>", link(code, label)))
        .collect()
}

/// The index page nests its content one level deeper
fn root_page(entries: &[(&str, &str)]) -> String {
    format!(
        r#"<html><body><div id="content"><div><div>{}</div></div></div></body></html>"#,
        section_links(entries)
    )
}

fn section_page(entries: &[(&str, &str)]) -> String {
    format!(
        r#"<html><body><div id="content">{}</div></body></html>"#,
        section_links(entries)
    )
}

fn leaf_page(entries: &[(&str, &str)]) -> String {
    let rows: String = entries
        .iter()
        .map(|(code, label)| format!("<tr><td>{}</td><td>1 g</td></tr>", link(code, label)))
        .collect();
    format!(
        r#"<html><body><div id="content"><table>{}</table></div></body></html>"#,
        rows
    )
}

/// Mounts the page for `code`; child pages must be mounted before the index
async fn mount_code_page(server: &MockServer, code: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("code", code))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts the index page; matches any request to the index path not
/// claimed by a mock mounted earlier
async fn mount_root_page(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Feed rows without the header, sorted
fn read_feed(outcome: &CrawlOutcome) -> (String, Vec<String>) {
    let path = outcome.output_path.as_ref().expect("feed path");
    let content = std::fs::read_to_string(path).expect("feed file");
    let mut lines = content.lines().map(str::to_string);
    let header = lines.next().unwrap_or_default();
    let mut rows: Vec<String> = lines.collect();
    rows.sort();
    (header, rows)
}

async fn crawl(config: Config) -> CrawlOutcome {
    Coordinator::new(config)
        .expect("coordinator")
        .run()
        .await
        .expect("crawl")
}

/// Records every observer event as a short string
#[derive(Clone, Default)]
struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }
}

impl CrawlObserver for EventLog {
    fn on_response(&mut self, _request: &CrawlRequest) {
        self.push("response".to_string());
    }

    fn on_page_processed(&mut self, _page: &PageNode) {
        self.push("page".to_string());
    }

    fn on_idle(&mut self) {
        self.push("idle".to_string());
    }

    fn on_closed(&mut self, state: CrawlState) {
        self.push(format!("closed:{}", state.reason()));
    }

    fn on_aborted(&mut self, _error: &AtcError) {
        self.push("aborted".to_string());
    }
}

async fn crawl_with_log(config: Config, log: &EventLog) -> CrawlOutcome {
    let mut coordinator = Coordinator::new(config).expect("coordinator");
    coordinator.add_observer(Box::new(log.clone()));
    coordinator.run().await.expect("crawl")
}

/// A sink whose disk is always full
struct FullDiskSink;

impl RecordSink for FullDiskSink {
    fn write_record(&mut self, _record: &ClassificationRecord) -> OutputResult<()> {
        Err(OutputError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "no space left on device",
        )))
    }

    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }

    fn records_written(&self) -> u64 {
        0
    }
}

/// Mounts an index page that answers only after `delay`
async fn mount_slow_root_page(server: &MockServer, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(root_page(&[("A", "ALIMENTARY TRACT AND METABOLISM")]))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_writes_every_code() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_code_page(&server, "A", section_page(&[("A01", "STOMATOLOGICAL PREPARATIONS")])).await;
    mount_code_page(
        &server,
        "A01",
        leaf_page(&[("A01AA01", "sodium fluoride"), ("A01AA02", "sodium monofluorophosphate")]),
    )
    .await;
    mount_code_page(&server, "B", leaf_page(&[("B01AA03", "warfarin")])).await;

    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(header("user-agent", "ATC_Bot"))
        .respond_with(ResponseTemplate::new(200).set_body_string(root_page(&[
            ("A", "ALIMENTARY TRACT AND METABOLISM"),
            ("B", "BLOOD AND BLOOD FORMING ORGANS"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = crawl(create_test_config(&server, output.path())).await;

    assert_eq!(outcome.state, CrawlState::Finished);
    assert_eq!(outcome.stats.pages_processed, 4);
    assert_eq!(outcome.stats.records, 6);
    assert_eq!(outcome.stats.total_errors(), 0);

    let (header, rows) = read_feed(&outcome);
    assert_eq!(header, "atc_code,atc_value");
    assert_eq!(
        rows,
        vec![
            "A,ALIMENTARY TRACT AND METABOLISM",
            "A01,STOMATOLOGICAL PREPARATIONS",
            "A01AA01,sodium fluoride",
            "A01AA02,sodium monofluorophosphate",
            "B,BLOOD AND BLOOD FORMING ORGANS",
            "B01AA03,warfarin",
        ]
    );

    // The feed lives in a timestamped directory under the output root
    let feed = outcome.output_path.as_ref().unwrap();
    assert!(feed.starts_with(output.path()));
    assert!(feed.ends_with("atc.csv"));
}

#[tokio::test]
async fn test_depth_limit_stops_recursion() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_code_page(&server, "A", section_page(&[("A01", "STOMATOLOGICAL PREPARATIONS")])).await;

    // One level below the limit; must never be requested
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("code", "A01"))
        .respond_with(ResponseTemplate::new(200).set_body_string(leaf_page(&[("A01AA01", "sodium fluoride")])))
        .expect(0)
        .mount(&server)
        .await;

    mount_root_page(&server, root_page(&[("A", "ALIMENTARY TRACT AND METABOLISM")])).await;

    let mut config = create_test_config(&server, output.path());
    config.crawler.max_depth = 1;

    let outcome = crawl(config).await;

    assert_eq!(outcome.state, CrawlState::Finished);
    assert_eq!(outcome.stats.depth_filtered, 1);

    let (_, rows) = read_feed(&outcome);
    assert_eq!(
        rows,
        vec![
            "A,ALIMENTARY TRACT AND METABOLISM",
            "A01,STOMATOLOGICAL PREPARATIONS",
        ]
    );
}

#[tokio::test]
async fn test_error_budget_closes_crawl() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let codes = ["A", "B", "C", "D", "G", "H"];
    for code in codes {
        Mock::given(method("GET"))
            .and(path(INDEX_PATH))
            .and(query_param("code", code))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
    }

    let entries: Vec<(&str, &str)> = codes.iter().map(|code| (*code, "GROUP")).collect();
    mount_root_page(&server, root_page(&entries)).await;

    let mut config = create_test_config(&server, output.path());
    config.retry.times = 0;
    config.close_spider.error_count = 5;

    let outcome = crawl(config).await;

    assert_eq!(outcome.state, CrawlState::ErrorLimitExceeded);
    assert_eq!(outcome.stats.request_failures, 5);

    // Records from the index page were written before the failures
    let (_, rows) = read_feed(&outcome);
    assert_eq!(rows.len(), 6);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("code", "B"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_code_page(&server, "B", leaf_page(&[("B01AA03", "warfarin")])).await;
    mount_root_page(&server, root_page(&[("B", "BLOOD AND BLOOD FORMING ORGANS")])).await;

    let outcome = crawl(create_test_config(&server, output.path())).await;

    assert_eq!(outcome.state, CrawlState::Finished);
    assert_eq!(outcome.stats.request_failures, 0);

    let (_, rows) = read_feed(&outcome);
    assert!(rows.contains(&"B01AA03,warfarin".to_string()));
}

#[tokio::test]
async fn test_not_found_is_ignored() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("code", "A"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_code_page(&server, "B", leaf_page(&[("B01AA03", "warfarin")])).await;
    mount_root_page(
        &server,
        root_page(&[("A", "ALIMENTARY TRACT AND METABOLISM"), ("B", "BLOOD AND BLOOD FORMING ORGANS")]),
    )
    .await;

    let mut config = create_test_config(&server, output.path());
    config.close_spider.error_count = 1;

    let outcome = crawl(config).await;

    // A 404 is neither retried nor counted against the error budget
    assert_eq!(outcome.state, CrawlState::Finished);
    assert_eq!(outcome.stats.http_ignored, 1);
    assert_eq!(outcome.stats.total_errors(), 0);
}

#[tokio::test]
async fn test_robots_txt_is_obeyed() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /atc_ddd_index/?code=B\n"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("code", "B"))
        .respond_with(ResponseTemplate::new(200).set_body_string(leaf_page(&[("B01AA03", "warfarin")])))
        .expect(0)
        .mount(&server)
        .await;
    mount_code_page(&server, "A", leaf_page(&[("A01AA01", "sodium fluoride")])).await;
    mount_root_page(
        &server,
        root_page(&[("A", "ALIMENTARY TRACT AND METABOLISM"), ("B", "BLOOD AND BLOOD FORMING ORGANS")]),
    )
    .await;

    let outcome = crawl(create_test_config(&server, output.path())).await;

    assert_eq!(outcome.state, CrawlState::Finished);
    assert_eq!(outcome.stats.robots_denied, 1);

    let (_, rows) = read_feed(&outcome);
    assert!(rows.contains(&"A01AA01,sodium fluoride".to_string()));
    assert!(!rows.iter().any(|row| row.starts_with("B01")));
}

#[tokio::test]
async fn test_structural_mismatch_counts_as_error() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    // A table link without a code: two labels, one code
    let broken = r#"<html><body><div id="content"><table>
        <tr><td><a href="./?code=A01AA01&amp;showdescription=no">sodium fluoride</a></td></tr>
        <tr><td><a href="/about/">About</a></td></tr>
        </table></div></body></html>"#;
    mount_code_page(&server, "A", broken.to_string()).await;
    mount_root_page(&server, root_page(&[("A", "ALIMENTARY TRACT AND METABOLISM")])).await;

    let log = EventLog::default();
    let outcome = crawl_with_log(create_test_config(&server, output.path()), &log).await;

    assert_eq!(outcome.state, CrawlState::Finished);
    assert_eq!(outcome.stats.structural_errors, 1);
    assert_eq!(outcome.stats.total_errors(), 1);

    // The broken page still counts as downloaded
    assert_eq!(log.count("response"), 2);
    assert_eq!(log.count("page"), 1);

    // Nothing from the broken page is written
    let (_, rows) = read_feed(&outcome);
    assert_eq!(rows, vec!["A,ALIMENTARY TRACT AND METABOLISM"]);
}

#[tokio::test]
async fn test_empty_index_finishes_with_header_only() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_root_page(&server, "<html><body><p>Maintenance</p></body></html>".to_string()).await;

    let outcome = crawl(create_test_config(&server, output.path())).await;

    assert_eq!(outcome.state, CrawlState::Finished);
    assert_eq!(outcome.stats.pages_processed, 1);

    let (header, rows) = read_feed(&outcome);
    assert_eq!(header, "atc_code,atc_value");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_idle_timeout_closes_crawl_as_stalled() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_slow_root_page(&server, Duration::from_secs(3)).await;

    let mut config = create_test_config(&server, output.path());
    config.close_spider.timeout_secs = 0;
    config.close_spider.timeout_no_item_secs = 1;

    let log = EventLog::default();
    let outcome = crawl_with_log(config, &log).await;

    assert_eq!(outcome.state, CrawlState::Stalled);
    assert_eq!(outcome.state.reason(), "closespider_timeout_no_item");
    assert_eq!(outcome.stats.records, 0);

    // A limit close skips the idle hook
    assert_eq!(log.events(), vec!["closed:closespider_timeout_no_item"]);

    let (header, rows) = read_feed(&outcome);
    assert_eq!(header, "atc_code,atc_value");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_crawl_timeout_closes_crawl_as_timed_out() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_slow_root_page(&server, Duration::from_secs(3)).await;

    let mut config = create_test_config(&server, output.path());
    config.close_spider.timeout_secs = 1;
    config.close_spider.timeout_no_item_secs = 0;

    let log = EventLog::default();
    let outcome = crawl_with_log(config, &log).await;

    assert_eq!(outcome.state, CrawlState::TimedOut);
    assert_eq!(outcome.state.reason(), "closespider_timeout");
    assert_eq!(log.count("idle"), 0);
    assert_eq!(log.events().last().map(String::as_str), Some("closed:closespider_timeout"));
}

#[tokio::test]
async fn test_observers_see_idle_once_before_finished() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_code_page(&server, "B", leaf_page(&[("B01AA03", "warfarin")])).await;
    mount_root_page(&server, root_page(&[("B", "BLOOD AND BLOOD FORMING ORGANS")])).await;

    let log = EventLog::default();
    let outcome = crawl_with_log(create_test_config(&server, output.path()), &log).await;

    assert_eq!(outcome.state, CrawlState::Finished);
    assert_eq!(
        log.events(),
        vec!["response", "page", "response", "page", "idle", "closed:finished"]
    );
}

#[tokio::test]
async fn test_sink_failure_aborts_observers() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_root_page(&server, root_page(&[("A", "ALIMENTARY TRACT AND METABOLISM")])).await;

    let config = create_test_config(&server, output.path());
    let log = EventLog::default();
    let mut coordinator = Coordinator::with_sink(config, Box::new(FullDiskSink)).expect("coordinator");
    coordinator.add_observer(Box::new(log.clone()));

    let result = coordinator.run().await;

    assert!(matches!(result, Err(AtcError::Output(_))));
    assert_eq!(log.count("aborted"), 1);
    assert!(!log.events().iter().any(|e| e.starts_with("closed:") || e == "idle"));
}
