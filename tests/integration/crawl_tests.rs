//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end over plain HTTP (no Tor proxy).

use tempfile::TempDir;
use torcrawl::config::{CrawlerConfig, ExportFormat, NetworkConfig, PassMode};
use torcrawl::crawler::{CrawlEngine, HttpFetcher, IdentityPool};
use torcrawl::output::export_all;
use torcrawl::Bucket;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Network settings for talking to a local mock server
fn create_network_config() -> NetworkConfig {
    NetworkConfig {
        use_tor: false,
        timeout_secs: 5,
        ..NetworkConfig::default()
    }
}

fn create_crawler_config(depth: u32, pass_mode: PassMode) -> CrawlerConfig {
    CrawlerConfig {
        depth,
        pass_mode,
        patterns_file: None,
        ..CrawlerConfig::default()
    }
}

fn html_page(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
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
        r#"<html><head><title>Home</title></head><body>
        <a href="/page1">Page 1</a>
        <a href="page2">Page 2</a>
        <a href="mailto:test@example.com">Mail</a>
        <a href="tel:012-013-104-5">Call</a>
        <img src="/logo.png"><a href="/logo.png">Logo</a>
        <a href="https://external.example.org/path">Elsewhere</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(&mock_server, "/page1", "<html><body>Content 1</body></html>".to_string()).await;
    mount_page(&mock_server, "/page2", "<html><body>Content 2</body></html>".to_string()).await;

    let fetcher = HttpFetcher::new(&create_network_config(), &[]).unwrap();
    let mut engine = CrawlEngine::new(
        &base_url,
        &create_crawler_config(2, PassMode::Growing),
        fetcher,
    )
    .unwrap();

    let visited = engine.crawl().await.unwrap();
    let result = engine.result();

    assert_eq!(visited.len(), 3, "visited: {:?}", visited);
    assert_eq!(result.links().len(), 3);
    assert!(result.contains_link(&format!("{}/page1", base_url)));
    assert!(result.contains_link(&format!("{}/page2", base_url)));
    assert_eq!(result.bucket(Bucket::Email), ["test@example.com"]);
    assert_eq!(result.bucket(Bucket::Telephone), ["012-013-104-5"]);
    assert_eq!(result.bucket(Bucket::Image), ["/logo.png"]);
    assert_eq!(
        result.bucket(Bucket::ExternalLink),
        ["https://external.example.org/path"]
    );
    assert_eq!(result.title(&base_url), Some("Home"));
}

#[tokio::test]
async fn test_snapshot_mode_stops_at_depth() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/level1">1</a>"#.to_string()).await;
    mount_page(&mock_server, "/level1", r#"<a href="/level2">2</a>"#.to_string()).await;

    // Discovered on the second pass but never fetched
    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(html_page("<p>deep</p>".to_string()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&create_network_config(), &[]).unwrap();
    let mut engine = CrawlEngine::new(
        &base_url,
        &create_crawler_config(2, PassMode::Snapshot),
        fetcher,
    )
    .unwrap();

    let visited = engine.crawl().await.unwrap();

    assert_eq!(visited.len(), 2);
    assert!(engine
        .result()
        .contains_link(&format!("{}/level2", base_url)));
}

#[tokio::test]
async fn test_growing_mode_follows_mid_pass_discoveries() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/level1">1</a>"#.to_string()).await;
    mount_page(&mock_server, "/level1", r#"<a href="/level2">2</a>"#.to_string()).await;

    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(html_page("<p>deep</p>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&create_network_config(), &[]).unwrap();
    let mut engine = CrawlEngine::new(
        &base_url,
        &create_crawler_config(1, PassMode::Growing),
        fetcher,
    )
    .unwrap();

    let visited = engine.crawl().await.unwrap();
    assert_eq!(visited.len(), 3);
}

#[tokio::test]
async fn test_http_errors_are_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/missing">gone</a><a href="/ok">ok</a>"#.to_string(),
    )
    .await;
    mount_page(&mock_server, "/ok", r#"<a href="/after">after</a>"#.to_string()).await;
    mount_page(&mock_server, "/after", "<p>end</p>".to_string()).await;
    // /missing has no mock and gets wiremock's default 404

    let fetcher = HttpFetcher::new(&create_network_config(), &[]).unwrap();
    let mut engine = CrawlEngine::new(
        &base_url,
        &create_crawler_config(2, PassMode::Snapshot),
        fetcher,
    )
    .unwrap();

    let visited = engine.crawl().await.unwrap();

    assert!(visited.contains(&format!("{}/missing", base_url)));
    assert!(visited.contains(&format!("{}/ok", base_url)));
    assert!(engine.result().contains_link(&format!("{}/after", base_url)));
}

#[tokio::test]
async fn test_pattern_discovery_finds_unlinked_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        format!("<p>Mirror lives at {}/hidden, tell no one.</p>", base_url),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html_page("<p>found</p>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&create_network_config(), &[]).unwrap();
    let mut engine = CrawlEngine::new(
        &base_url,
        &create_crawler_config(2, PassMode::Snapshot),
        fetcher,
    )
    .unwrap();

    engine.crawl().await.unwrap();
    assert!(engine
        .result()
        .contains_link(&format!("{}/hidden", base_url)));
}

#[tokio::test]
async fn test_rotated_user_agent_is_sent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Only answers when the rotated agent is presented
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestAgent/1.0"))
        .respond_with(html_page(r#"<a href="/page1">1</a>"#.to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pool = IdentityPool::from_entries(vec!["TestAgent/1.0".to_string()], vec![]);
    let fetcher = HttpFetcher::new(&create_network_config(), pool.proxies()).unwrap();
    let mut engine = CrawlEngine::new(
        &base_url,
        &create_crawler_config(1, PassMode::Snapshot),
        fetcher,
    )
    .unwrap()
    .with_identities(pool, true, false)
    .with_rng_seed(7);

    engine.crawl().await.unwrap();
    assert!(engine
        .result()
        .contains_link(&format!("{}/page1", base_url)));
}

#[tokio::test]
async fn test_crawl_then_export() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/about">About</a><a href="mailto:admin@example.com">Mail</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(&mock_server, "/about", "<p>about</p>".to_string()).await;

    let fetcher = HttpFetcher::new(&create_network_config(), &[]).unwrap();
    let mut engine = CrawlEngine::new(
        &base_url,
        &create_crawler_config(1, PassMode::Growing),
        fetcher,
    )
    .unwrap();
    engine.crawl().await.unwrap();
    let result = engine.into_result();

    let dir = TempDir::new().unwrap();
    let written = export_all(
        &result,
        dir.path(),
        "run",
        &[ExportFormat::Text, ExportFormat::Json, ExportFormat::Sqlite],
        true,
    )
    .unwrap();

    assert!(written.contains(&dir.path().join("run_links.txt")));
    assert!(written.contains(&dir.path().join("run_emails.txt")));
    assert!(written.contains(&dir.path().join("run_log.txt")));

    let links = std::fs::read_to_string(dir.path().join("run_links.txt")).unwrap();
    assert_eq!(links.lines().count(), 2);

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("run_results.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["start_url"], base_url.as_str());
    assert_eq!(json["emails"][0], "admin@example.com");

    let conn = rusqlite::Connection::open(dir.path().join("run_results.db")).unwrap();
    let edges: i64 = conn
        .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))
        .unwrap();
    assert_eq!(edges, 1);
}
