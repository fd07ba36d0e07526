use crate::common::pipeline;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use crawlkeeper::server::router;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn crawl_request(url: &str) -> Request<Body> {
    let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
    Request::builder()
        .method("POST")
        .uri(format!("/crawl?url={}", encoded))
        .body(Body::empty())
        .unwrap()
}

async fn site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><a href=\"/next\">next</a></body></html>", "text/html"),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_crawl_returns_no_content() {
    let server = site().await;
    let p = pipeline(16 * 1024, 2);
    let app = router(p.orchestrator.clone());

    let response = app
        .oneshot(crawl_request(&format!("{}/", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(p.broker.records().len(), 1);
}

#[tokio::test]
async fn test_disallowed_url_also_returns_no_content() {
    let server = site().await;
    let p = pipeline(16 * 1024, 2);
    let app = router(p.orchestrator.clone());

    let response = app
        .oneshot(crawl_request(&format!("{}/private", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(p.broker.records().is_empty());
}

#[tokio::test]
async fn test_publish_failure_is_bad_gateway() {
    let server = site().await;
    let p = pipeline(16 * 1024, 2);
    p.broker.set_failing(true);
    let app = router(p.orchestrator.clone());

    let response = app
        .oneshot(crawl_request(&format!("{}/", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_missing_url_param_is_bad_request() {
    let p = pipeline(16 * 1024, 2);
    let app = router(p.orchestrator.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/crawl")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let p = pipeline(16 * 1024, 2);
    let app = router(p.orchestrator.clone());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_crawl_finishes_after_caller_gives_up() {
    let server = site().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><a href=\"/next\">next</a></body></html>", "text/html")
                .set_delay(std::time::Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    let p = pipeline(16 * 1024, 2);
    let app = router(p.orchestrator.clone());

    let abandoned = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        app.oneshot(crawl_request(&format!("{}/slow", server.uri()))),
    )
    .await;
    assert!(abandoned.is_err());

    let mut published = false;
    for _ in 0..50 {
        if p.broker.records().len() == 1 {
            published = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert!(published, "crawl should complete without the caller");
}
