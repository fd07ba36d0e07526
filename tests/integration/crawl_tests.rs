use crate::common::{pipeline, published_links, SUMMARY_TOPIC};
use crawlkeeper::crawler::CrawlOutcome;
use crawlkeeper::publish::{RecordBatch, BATCH_HEADER_BYTES};
use crawlkeeper::storage::ContentHash;
use crawlkeeper::CrawlError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn allow_everything(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .mount(server)
        .await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(server)
        .await;
}

async fn serve_page(server: &MockServer, page: &str, body: impl Into<Vec<u8>>) {
    let body: Vec<u8> = body.into();
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_page() {
    let server = MockServer::start().await;
    let base = server.uri();
    allow_everything(&server).await;
    serve_page(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="/page1">Page 1</a>
            <a href="page2#section">Page 2</a>
            <a href="{}/page1">Page 1 again</a>
            <a href="https://other.example/x">Elsewhere</a>
            <a href="mailto:someone@example.com">Mail</a>
            <a href="javascript:void(0)">Script</a>
            </body></html>"#,
            base
        ),
    )
    .await;

    let p = pipeline(16 * 1024, 3);
    let url = format!("{}/", base);

    let outcome = p.orchestrator.crawl(&url).await.unwrap();

    let mut expected = vec![
        format!("{}/page1", base),
        format!("{}/page2", base),
        "https://other.example/x".to_string(),
    ];
    expected.sort();

    let CrawlOutcome::Crawled { hash, title, links } = outcome else {
        panic!("expected the page to be crawled");
    };
    assert_eq!(title.as_deref(), Some("Home"));
    assert_eq!(links, expected);

    let record = p
        .orchestrator
        .store()
        .metadata()
        .get_page(&url)
        .await
        .unwrap()
        .expect("record stored");
    assert_eq!(record.hash, hash);
    assert_eq!(record.title.as_deref(), Some("Home"));
    assert!(p.orchestrator.store().blobs().contains(&hash).await.unwrap());

    let summaries = p.broker.records();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].topic, SUMMARY_TOPIC);
    let summary: serde_json::Value = serde_json::from_slice(&summaries[0].payload).unwrap();
    assert_eq!(summary, serde_json::json!([url, expected]));

    assert_eq!(published_links(&p.broker), expected);
    assert!(p
        .broker
        .batches()
        .iter()
        .flat_map(|b| b.records.iter())
        .all(|r| r.timestamp_ms == summaries[0].timestamp_ms));
}

#[tokio::test]
async fn test_robots_disallowed_page_is_not_fetched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let p = pipeline(16 * 1024, 2);
    let outcome = p
        .orchestrator
        .crawl(&format!("{}/admin", server.uri()))
        .await
        .unwrap();

    assert_eq!(outcome, CrawlOutcome::Disallowed);
    assert!(p.broker.records().is_empty());
    assert!(p.broker.batches().is_empty());
}

#[tokio::test]
async fn test_recrawl_replaces_content() {
    let server = MockServer::start().await;
    allow_everything(&server).await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("hello", "text/html"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    serve_page(&server, "/a", "world").await;

    let p = pipeline(16 * 1024, 2);
    let url = format!("{}/a", server.uri());
    let hello = ContentHash::of(b"hello");
    let world = ContentHash::of(b"world");

    p.orchestrator.crawl(&url).await.unwrap();
    assert!(p.orchestrator.store().blobs().contains(&hello).await.unwrap());

    p.orchestrator.crawl(&url).await.unwrap();
    let blobs = p.orchestrator.store().blobs();
    assert!(!blobs.contains(&hello).await.unwrap());
    assert!(blobs.contains(&world).await.unwrap());
}

#[tokio::test]
async fn test_fallback_encoding() {
    let server = MockServer::start().await;
    allow_everything(&server).await;

    // "<title>Привет</title>" in windows-1251, with no declared charset
    let mut body = b"<html><head><title>".to_vec();
    body.extend_from_slice(&[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2]);
    body.extend_from_slice(b"</title></head></html>");
    serve_page(&server, "/ru", body).await;

    let p = pipeline(16 * 1024, 2);
    let outcome = p
        .orchestrator
        .crawl(&format!("{}/ru", server.uri()))
        .await
        .unwrap();

    let CrawlOutcome::Crawled { title, .. } = outcome else {
        panic!("expected the page to be crawled");
    };
    assert_eq!(title.as_deref(), Some("Привет"));
}

#[tokio::test]
async fn test_missing_page_is_skipped() {
    let server = MockServer::start().await;
    allow_everything(&server).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let p = pipeline(16 * 1024, 2);
    let outcome = p
        .orchestrator
        .crawl(&format!("{}/gone", server.uri()))
        .await
        .unwrap();

    assert_eq!(outcome, CrawlOutcome::BadStatus { status: 410 });
    assert!(p.broker.records().is_empty());
}

#[tokio::test]
async fn test_links_spread_over_partitions() {
    let server = MockServer::start().await;
    let base = server.uri();
    allow_everything(&server).await;

    let anchors: String = (0..10)
        .map(|i| format!(r#"<a href="/p{:02}">{}</a>"#, i, i))
        .collect();
    serve_page(&server, "/", format!("<html><body>{}</body></html>", anchors)).await;

    // Room for exactly four links per batch
    let link_len = format!("{}/p00", base).len();
    let p = pipeline(BATCH_HEADER_BYTES + 4 * RecordBatch::record_size(link_len), 2);

    p.orchestrator
        .crawl(&format!("{}/", base))
        .await
        .unwrap();

    let batches = p.broker.batches();
    let shape: Vec<(i32, usize)> = batches
        .iter()
        .map(|b| (b.partition, b.records.len()))
        .collect();
    assert_eq!(shape, vec![(0, 4), (1, 4), (0, 2)]);

    let expected: Vec<String> = (0..10).map(|i| format!("{}/p{:02}", base, i)).collect();
    assert_eq!(published_links(&p.broker), expected);
}

#[tokio::test]
async fn test_broker_failure_fails_crawl() {
    let server = MockServer::start().await;
    allow_everything(&server).await;
    serve_page(&server, "/", "<html><body><a href=\"/x\">x</a></body></html>").await;

    let p = pipeline(16 * 1024, 2);
    p.broker.set_failing(true);

    let result = p.orchestrator.crawl(&format!("{}/", server.uri())).await;
    assert!(matches!(result, Err(CrawlError::Publish(_))));
}
