//! Integration tests for the exit address check

use torcrawl::config::NetworkConfig;
use torcrawl::crawler::{exit_ip, CheckError, HttpFetcher};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_network_config() -> NetworkConfig {
    NetworkConfig {
        use_tor: false,
        timeout_secs: 5,
        ..NetworkConfig::default()
    }
}

#[tokio::test]
async fn test_exit_ip_from_json_echo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ip":"198.51.100.23"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&create_network_config(), &[]).unwrap();
    let ip = exit_ip(&fetcher, &format!("{}/?format=json", server.uri()))
        .await
        .unwrap();

    assert_eq!(ip.to_string(), "198.51.100.23");
}

#[tokio::test]
async fn test_echo_service_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&create_network_config(), &[]).unwrap();
    let err = exit_ip(&fetcher, &server.uri()).await.unwrap_err();

    assert!(matches!(err, CheckError::Status { status_code: 503, .. }));
    assert!(!err.is_unreachable());
}

#[tokio::test]
async fn test_dead_tor_proxy_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("198.51.100.23"))
        .expect(0)
        .mount(&server)
        .await;

    // Nothing listens on port 1, so the SOCKS handshake never starts
    let config = NetworkConfig {
        use_tor: true,
        tor_proxy: "127.0.0.1:1".to_string(),
        ..create_network_config()
    };
    let fetcher = HttpFetcher::new(&config, &[]).unwrap();
    let err = exit_ip(&fetcher, &server.uri()).await.unwrap_err();

    assert!(err.is_unreachable());
}
