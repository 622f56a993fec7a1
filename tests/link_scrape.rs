//! Integration tests for the link-scrape monitor against a mock page.

use std::{collections::HashMap, sync::Arc};

use reqwest_middleware::ClientWithMiddleware;
use vigil::{
    monitor::{FetchError, Monitor},
    monitors::{LinkScrapeConfig, LinkScrapeMonitor},
};

fn create_test_http_client() -> Arc<ClientWithMiddleware> {
    Arc::new(reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build())
}

fn create_monitor(page_url: String, require_http2: bool) -> LinkScrapeMonitor {
    let config = LinkScrapeConfig {
        identity: "test.dat".to_string(),
        display_name: "Test Scrape".to_string(),
        url: page_url,
        user_agent: Some("vigil-test".to_string()),
        referer: None,
        headers: HashMap::from([("X-Requested-With".to_string(), "XMLHttpRequest".to_string())]),
        required_substrings: vec!["bedrock".to_string(), "linux".to_string(), ".zip".to_string()],
        excluded_substrings: vec!["preview".to_string()],
        require_http2,
    };
    LinkScrapeMonitor::new(config, create_test_http_client())
}

#[tokio::test]
async fn returns_the_first_matching_link_entry() {
    let mut server = mockito::Server::new_async().await;

    let html = r#"
        <html><body>
        <a href="/downloads/preview-linux/bedrock-server-1.22.0.1.zip">Preview build</a>
        <a href="/downloads/bin-linux/bedrock-server-1.21.50.zip">Bedrock Server v1.21.50</a>
        <a href="/downloads/bin-linux/bedrock-server-1.21.44.zip">Bedrock Server v1.21.44</a>
        </body></html>
    "#;
    let mock = server
        .mock("GET", "/server/bedrock")
        .match_header("user-agent", "vigil-test")
        .match_header("x-requested-with", "XMLHttpRequest")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(html)
        .create_async()
        .await;

    let monitor = create_monitor(format!("{}/server/bedrock", server.url()), false);
    let value = monitor.fetch_current_value().await.unwrap();

    assert!(value.starts_with("- Bedrock Server v1.21.50 ("));
    assert!(value.contains("/downloads/bin-linux/bedrock-server-1.21.50.zip"));
    mock.assert_async().await;
}

#[tokio::test]
async fn zero_matches_is_an_extraction_error() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/server/bedrock")
        .with_status(200)
        .with_body(r#"<a href="/downloads/win/bedrock-server.zip">Windows only</a>"#)
        .create_async()
        .await;

    let monitor = create_monitor(format!("{}/server/bedrock", server.url()), false);
    let err = monitor.fetch_current_value().await.unwrap_err();
    assert!(matches!(err, FetchError::Extraction(_)));
}

#[tokio::test]
async fn non_success_status_is_an_upstream_error() {
    let mut server = mockito::Server::new_async().await;

    server.mock("GET", "/server/bedrock").with_status(503).create_async().await;

    let monitor = create_monitor(format!("{}/server/bedrock", server.url()), false);
    let err = monitor.fetch_current_value().await.unwrap_err();
    assert!(matches!(err, FetchError::Upstream(status) if status.as_u16() == 503));
}

#[tokio::test]
async fn http2_precondition_fails_against_an_http1_server() {
    let mut server = mockito::Server::new_async().await;

    // mockito serves HTTP/1.1, so a monitor requiring HTTP/2 must report a
    // protocol mismatch instead of a value.
    server.mock("GET", "/server/bedrock").with_status(200).create_async().await;

    let monitor = create_monitor(format!("{}/server/bedrock", server.url()), true);
    let err = monitor.fetch_current_value().await.unwrap_err();
    assert!(matches!(err, FetchError::ProtocolMismatch(_)));
}

#[tokio::test]
async fn unreachable_source_is_a_network_error() {
    // Nothing listens here.
    let monitor = create_monitor("http://127.0.0.1:1/server/bedrock".to_string(), false);
    let err = monitor.fetch_current_value().await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
}
