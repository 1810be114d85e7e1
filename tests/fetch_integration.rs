//! Integration tests for the retrying fetcher and ranged retrieval.
//!
//! These tests run the HTTP client against wiremock servers.

use std::time::Duration;

use aonui_core::download::{ByteRange, DownloadError, FetchStrategy, HttpClient};
use url::Url;
use wiremock::matchers::{header, headers, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quick_strategy(max_retries: u32) -> FetchStrategy {
    FetchStrategy::new(max_retries, Duration::from_millis(50), Duration::from_secs(5))
}

fn url_for(server: &MockServer, path: &str) -> Url {
    Url::parse(&format!("{}{path}", server.uri())).expect("mock server URI should parse")
}

#[tokio::test]
async fn test_fetch_always_500_makes_exactly_max_retries_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gfs/prod/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let started = std::time::Instant::now();
    let err = client
        .fetch(&url_for(&server, "/gfs/prod/"), &quick_strategy(3))
        .await
        .expect_err("every attempt fails");

    match err {
        DownloadError::RetriesExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, DownloadError::HttpStatus { status: 500, .. }));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    // Two sleeps separate three attempts.
    assert!(started.elapsed() >= Duration::from_millis(100));
    server.verify().await;
}

#[tokio::test]
async fn test_fetch_recovers_after_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let body = client
        .fetch_text(&url_for(&server, "/index.html"), &quick_strategy(3))
        .await
        .expect("third attempt succeeds");

    assert_eq!(body, "<html></html>");
}

#[tokio::test]
async fn test_fetch_non_200_success_status_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let err = client
        .fetch(&url_for(&server, "/index.html"), &quick_strategy(1))
        .await
        .expect_err("204 is not 200");

    assert!(matches!(err, DownloadError::RetriesExhausted { attempts: 1, .. }));
}

#[tokio::test]
async fn test_content_length_from_head() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/gfs.t00z.pgrb2f00"))
        .and(header("accept-encoding", "identity"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 400]))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let length = client
        .content_length(&url_for(&server, "/gfs.t00z.pgrb2f00"))
        .await
        .expect("HEAD succeeds");

    assert_eq!(length, 400);
    server.verify().await;
}

#[tokio::test]
async fn test_content_length_requires_200() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let err = client
        .content_length(&url_for(&server, "/missing"))
        .await
        .expect_err("404 is an error");

    assert!(matches!(err, DownloadError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_fetch_ranges_sends_multi_range_header_and_streams_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gfs.t00z.pgrb2f06"))
        .and(headers("range", vec!["bytes=0-3", "10-13"]))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(b"GRIBGRIB".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let ranges = [
        ByteRange::from_extent(0, 4).expect("non-empty"),
        ByteRange::from_extent(10, 4).expect("non-empty"),
    ];
    let mut sink: Vec<u8> = Vec::new();
    let client = HttpClient::new();
    let written = client
        .fetch_ranges(
            &url_for(&server, "/gfs.t00z.pgrb2f06"),
            &ranges,
            &mut sink,
            Duration::from_secs(5),
        )
        .await
        .expect("206 response");

    assert_eq!(written, 8);
    assert_eq!(sink, b"GRIBGRIB");
    server.verify().await;
}

#[tokio::test]
async fn test_fetch_ranges_requests_uncompressed_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gfs.t00z.pgrb2f06"))
        .and(header("range", "bytes=0-3"))
        .and(header("accept-encoding", "identity"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(b"GRIB".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let mut sink: Vec<u8> = Vec::new();
    let client = HttpClient::new();
    client
        .fetch_ranges(
            &url_for(&server, "/gfs.t00z.pgrb2f06"),
            &[ByteRange::from_extent(0, 4).expect("non-empty")],
            &mut sink,
            Duration::from_secs(5),
        )
        .await
        .expect("identity-encoded range request matches");

    assert_eq!(sink, b"GRIB");
    server.verify().await;
}

#[tokio::test]
async fn test_fetch_ranges_rejects_full_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gfs.t00z.pgrb2f06"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 32]))
        .mount(&server)
        .await;

    let mut sink: Vec<u8> = Vec::new();
    let client = HttpClient::new();
    let err = client
        .fetch_ranges(
            &url_for(&server, "/gfs.t00z.pgrb2f06"),
            &[ByteRange::from_extent(0, 4).expect("non-empty")],
            &mut sink,
            Duration::from_secs(5),
        )
        .await
        .expect_err("200 is not 206");

    assert!(matches!(err, DownloadError::HttpStatus { status: 200, .. }));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_fetch_ranges_times_out_on_slow_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(206)
                .set_body_bytes(b"late".to_vec())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut sink: Vec<u8> = Vec::new();
    let client = HttpClient::new();
    let started = std::time::Instant::now();
    let err = client
        .fetch_ranges(
            &url_for(&server, "/slow"),
            &[ByteRange::from_extent(0, 4).expect("non-empty")],
            &mut sink,
            Duration::from_millis(200),
        )
        .await
        .expect_err("deadline expires first");

    assert!(matches!(err, DownloadError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(3));
}
