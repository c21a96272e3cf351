// Tests for crawl functionality

use delve_core::crawl::{CrawlOptions, execute_crawl, extract_url_path, parse_delay};
use delve_crawler::{CancellationToken, CrawlError, PageStatus};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

// ============================================================================
// Report Path Tests
// ============================================================================

#[test]
fn test_extract_url_path() {
    let cases = [
        ("http://example.com/", "/"),
        ("http://example.com", "/"),
        ("http://example.com/docs/intro", "/docs/intro"),
        ("http://example.com/search?q=rust#top", "/search"),
        ("http://localhost:3000/a/", "/a/"),
        ("http://[::1]/api", "/api"),
    ];
    for (url, expected) in cases {
        assert_eq!(extract_url_path(url), expected, "path of {}", url);
    }
}

#[test]
fn test_extract_url_path_falls_back_to_input() {
    assert_eq!(extract_url_path("not a valid url"), "not a valid url");
}

/// `(id, url)` pairs from an index file.
fn read_index(path: &Path) -> Vec<(u64, String)> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| {
            let (id, url) = line.split_once(' ').expect("index line is `<id> <url>`");
            (id.parse().unwrap(), url.to_string())
        })
        .collect()
}

// ============================================================================
// Option Validation Tests
// ============================================================================

#[test]
fn test_parse_delay_accepts_fractions_and_zero() {
    assert_eq!(parse_delay(0.5).unwrap(), Duration::from_millis(500));
    assert_eq!(parse_delay(0.0).unwrap(), Duration::ZERO);
    assert_eq!(parse_delay(2.0).unwrap(), Duration::from_secs(2));
}

#[test]
fn test_parse_delay_rejects_negative_and_nan() {
    assert!(matches!(parse_delay(-1.0), Err(CrawlError::Config(_))));
    assert!(matches!(parse_delay(f64::NAN), Err(CrawlError::Config(_))));
    assert!(matches!(parse_delay(f64::INFINITY), Err(CrawlError::Config(_))));
}

#[test]
fn test_options_defaults() {
    let options = CrawlOptions::new("https://example.com", "./out");
    assert_eq!(options.max_depth, 2);
    assert_eq!(options.delay, Duration::from_millis(500));
    assert_eq!(options.workers, 1);
    assert!(options.validate().is_ok());
}

#[test]
fn test_options_reject_zero_depth_and_workers() {
    let mut options = CrawlOptions::new("https://example.com", "./out");
    options.max_depth = 0;
    assert!(matches!(options.validate(), Err(CrawlError::Config(_))));

    let mut options = CrawlOptions::new("https://example.com", "./out");
    options.workers = 0;
    assert!(matches!(options.validate(), Err(CrawlError::Config(_))));

    let mut options = CrawlOptions::new("https://example.com", "./out");
    options.timeout = Duration::ZERO;
    assert!(matches!(options.validate(), Err(CrawlError::Config(_))));
}

// ============================================================================
// Session Tests
// ============================================================================

async fn mount_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html.to_string(), "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

fn fast_options(seed: String, output: &std::path::Path, depth: usize) -> CrawlOptions {
    let mut options = CrawlOptions::new(seed, output);
    options.max_depth = depth;
    options.delay = Duration::ZERO;
    options.timeout = Duration::from_secs(5);
    options
}

#[tokio::test]
async fn test_session_writes_index_and_pages() {
    let mock_server = MockServer::start().await;
    let root = r#"<a href="/about">About</a><a href="about/team">Team</a><a href="https://other.com/x">X</a>"#;
    mount_page(&mock_server, "/", root).await;
    mount_page(&mock_server, "/about", "<p>about</p>").await;
    mount_page(&mock_server, "/about/team", "<p>team</p>").await;

    let temp_dir = TempDir::new().unwrap();
    let summary = execute_crawl(
        fast_options(mock_server.uri(), temp_dir.path(), 2),
        CancellationToken::new(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(summary.saved_count(), 3);

    let entries = read_index(&temp_dir.path().join("urls.txt"));
    let paths: Vec<(u64, String)> = entries
        .iter()
        .map(|(id, url)| (*id, extract_url_path(url)))
        .collect();
    assert_eq!(
        paths,
        vec![
            (1, "/".to_string()),
            (2, "/about".to_string()),
            (3, "/about/team".to_string()),
        ]
    );
    assert!(entries.iter().all(|(_, url)| !url.contains("other.com")));

    let data_dir = temp_dir.path().join("data");
    assert_eq!(fs::read_to_string(data_dir.join("1.html")).unwrap(), root);
    assert_eq!(fs::read_to_string(data_dir.join("3.html")).unwrap(), "<p>team</p>");
    assert_eq!(fs::read_dir(&data_dir).unwrap().count(), 3);
}

#[tokio::test]
async fn test_unreachable_seed_leaves_empty_output() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("data")).unwrap();
    fs::write(temp_dir.path().join("data").join("9.html"), "stale").unwrap();
    fs::write(temp_dir.path().join("urls.txt"), "9 https://stale/\n").unwrap();

    let summary = execute_crawl(
        fast_options(mock_server.uri(), temp_dir.path(), 2),
        CancellationToken::new(),
        None,
    )
    .await
    .unwrap();

    assert!(summary.seed_unreachable);
    assert_eq!(summary.pages[0].status, PageStatus::HttpError(404));
    assert_eq!(fs::read_to_string(temp_dir.path().join("urls.txt")).unwrap(), "");
    assert!(temp_dir.path().join("data").is_dir());
    assert_eq!(fs::read_dir(temp_dir.path().join("data")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_seed_reached_message_is_reported_once() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", r#"<a href="/next">next</a>"#).await;
    mount_page(&mock_server, "/next", "end").await;

    let messages = Arc::new(Mutex::new(Vec::new()));
    let messages_clone = messages.clone();
    let temp_dir = TempDir::new().unwrap();

    execute_crawl(
        fast_options(mock_server.uri(), temp_dir.path(), 2),
        CancellationToken::new(),
        Some(Arc::new(move |message: String| {
            messages_clone.lock().unwrap().push(message);
        })),
    )
    .await
    .unwrap();

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Initial page was reached successfully"));
}

#[tokio::test]
async fn test_invalid_seed_does_not_touch_output() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("urls.txt"), "1 https://keep/\n").unwrap();

    let result = execute_crawl(
        fast_options("ftp://example.com/".to_string(), temp_dir.path(), 2),
        CancellationToken::new(),
        None,
    )
    .await;

    assert!(matches!(result, Err(CrawlError::InvalidSeed(_))));
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("urls.txt")).unwrap(),
        "1 https://keep/\n"
    );
}

#[tokio::test]
async fn test_cancelled_session_is_clean() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token = CancellationToken::new();
    token.cancel();
    let temp_dir = TempDir::new().unwrap();

    let summary = execute_crawl(
        fast_options(mock_server.uri(), temp_dir.path(), 3),
        token,
        None,
    )
    .await
    .unwrap();

    assert!(summary.cancelled);
    assert!(read_index(&temp_dir.path().join("urls.txt")).is_empty());
}
