use crate::common::{gate, http_fetcher};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TTL: Duration = Duration::from_secs(3600);

async fn serve_html_heads(server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_robots_rules_cached_per_host() {
    let server = MockServer::start().await;
    serve_html_heads(&server).await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
        .expect(1)
        .mount(&server)
        .await;

    let gate = gate(http_fetcher(), TTL);
    let base = server.uri();

    assert!(!gate.authorize(&format!("{}/private", base)).await);
    assert!(gate.authorize(&format!("{}/public", base)).await);
    assert!(gate.locks().is_empty());
}

#[tokio::test]
async fn test_non_html_skips_robots_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(0)
        .mount(&server)
        .await;

    let gate = gate(http_fetcher(), TTL);
    assert!(!gate.authorize(&format!("{}/report.pdf", server.uri())).await);
}

#[tokio::test]
async fn test_group_for_product_token() {
    let server = MockServer::start().await;
    serve_html_heads(&server).await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "User-agent: TestBot\nDisallow: /\n\nUser-agent: *\nAllow: /",
        ))
        .mount(&server)
        .await;

    let gate = gate(http_fetcher(), TTL);
    assert!(!gate.authorize(&format!("{}/anything", server.uri())).await);
}

#[tokio::test]
async fn test_missing_robots_allows() {
    let server = MockServer::start().await;
    serve_html_heads(&server).await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let gate = gate(http_fetcher(), TTL);
    assert!(gate.authorize(&format!("{}/page", server.uri())).await);
    assert!(gate.authorize(&format!("{}/other", server.uri())).await);
}

#[tokio::test]
async fn test_server_error_fails_closed_and_is_not_cached() {
    let server = MockServer::start().await;
    serve_html_heads(&server).await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let gate = gate(http_fetcher(), TTL);
    assert!(!gate.authorize(&format!("{}/page", server.uri())).await);
    assert!(!gate.authorize(&format!("{}/page", server.uri())).await);
    assert!(gate.locks().is_empty());
}

#[tokio::test]
async fn test_unreachable_host_fails_closed() {
    // Port 9 (discard) is closed on loopback
    let gate = gate(http_fetcher(), TTL);
    assert!(!gate.authorize("http://127.0.0.1:9/page").await);
    assert!(gate.locks().is_empty());
}

#[tokio::test]
async fn test_concurrent_checks_leave_no_locks() {
    let server = MockServer::start().await;
    serve_html_heads(&server).await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /private")
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let gate = Arc::new(gate(http_fetcher(), TTL));
    let base = server.uri();

    let checks = (0..20).map(|i| {
        let gate = gate.clone();
        let url = if i % 2 == 0 {
            format!("{}/private/{}", base, i)
        } else {
            format!("{}/public/{}", base, i)
        };
        tokio::spawn(async move { gate.authorize(&url).await })
    });

    let results: Vec<bool> = join_all(checks)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|allowed| **allowed).count(), 10);
    assert!(gate.locks().is_empty());

    // The lock is returned before the cache write, so a few checks may refetch
    let robots_fetches = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/robots.txt")
        .count();
    assert!((1..=20).contains(&robots_fetches));
}
