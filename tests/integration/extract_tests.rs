//! Integration tests for content extraction

use tempfile::TempDir;
use torcrawl::config::NetworkConfig;
use torcrawl::crawler::HttpFetcher;
use torcrawl::extract::{ContentExtractor, ExtractOutcome, KeywordRules};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_fetcher() -> HttpFetcher {
    let config = NetworkConfig {
        use_tor: false,
        timeout_secs: 5,
        ..NetworkConfig::default()
    };
    HttpFetcher::new(&config, &[]).unwrap()
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_folder_extraction_numbers_duplicates() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/", "<html><body>home</body></html>").await;
    mount_page(&mock_server, "/docs/page.html", "<html><body>doc</body></html>").await;

    let dir = TempDir::new().unwrap();
    let addresses = vec![
        format!("{}/", base_url),
        base_url.clone(),
        format!("{}/docs/page.html", base_url),
    ];

    let mut extractor = ContentExtractor::new(create_fetcher());
    let outcomes = extractor.to_folder(&addresses, dir.path()).await;

    assert_eq!(
        outcomes,
        vec![
            ExtractOutcome::Written(dir.path().join("index.htm")),
            ExtractOutcome::Written(dir.path().join("index.htm(1)")),
            ExtractOutcome::Written(dir.path().join("page.html")),
        ]
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("page.html")).unwrap(),
        "<html><body>doc</body></html>"
    );
}

#[tokio::test]
async fn test_rules_gate_extraction() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/plain", "<html><body>nothing to see</body></html>").await;
    mount_page(&mock_server, "/market", "<html><body>Bitcoin escrow</body></html>").await;

    let rules = KeywordRules::from_toml("[[rule]]\nname = \"crypto\"\npatterns = [\"bitcoin\"]\n")
        .unwrap();
    let dir = TempDir::new().unwrap();

    let mut extractor = ContentExtractor::new(create_fetcher())
        .with_rules(Box::new(rules))
        .text_only(true);
    let outcomes = extractor
        .to_folder(
            &[format!("{}/plain", base_url), format!("{}/market", base_url)],
            dir.path(),
        )
        .await;

    assert_eq!(
        outcomes,
        vec![
            ExtractOutcome::NoMatch,
            ExtractOutcome::Written(dir.path().join("market")),
        ]
    );
    assert!(!dir.path().join("plain").exists());
}

#[tokio::test]
async fn test_single_address_to_file_and_writer() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/", "<html><body><p>Hello</p><script>x()</script></body></html>").await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out.html");

    let mut extractor = ContentExtractor::new(create_fetcher());
    let outcome = extractor.to_file(&base_url, &target).await.unwrap();
    assert_eq!(outcome, ExtractOutcome::Written(target.clone()));
    assert!(std::fs::read_to_string(&target).unwrap().contains("<p>Hello</p>"));

    let mut printed = Vec::new();
    let mut extractor = ContentExtractor::new(create_fetcher()).text_only(true);
    let outcomes = extractor
        .to_writer(&[base_url.clone()], &mut printed)
        .await
        .unwrap();

    assert_eq!(outcomes, vec![ExtractOutcome::Printed]);
    let text = String::from_utf8(printed).unwrap();
    assert!(text.contains("Hello"));
    assert!(!text.contains("x()"));
}

#[tokio::test]
async fn test_failed_fetch_is_reported() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    let mut extractor = ContentExtractor::new(create_fetcher());
    let outcomes = extractor
        .to_folder(&[format!("{}/gone", base_url)], dir.path())
        .await;

    assert!(matches!(outcomes.as_slice(), [ExtractOutcome::Failed(_)]));
}
