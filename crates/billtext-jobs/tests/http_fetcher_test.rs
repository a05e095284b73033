use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use billtext_jobs::{DocumentFetcher, Error, HttpFetcher};

#[tokio::test]
async fn test_fetch_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/LegislationDetail/O2024-1.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 body".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(None).unwrap();
    let body = fetcher
        .fetch(&format!("{}/LegislationDetail/O2024-1.pdf", server.uri()))
        .await
        .unwrap();

    assert_eq!(body, b"%PDF-1.4 body");
}

#[tokio::test]
async fn test_fetch_non_success_status_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>Not Found</html>"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(None).unwrap();
    let err = fetcher
        .fetch(&format!("{}/missing.pdf", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch(_)));
    assert!(err.to_string().contains("404"), "got: {}", err);
}

#[tokio::test]
async fn test_fetch_server_error_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(None).unwrap();
    let err = fetcher
        .fetch(&format!("{}/a.pdf", server.uri()))
        .await
        .unwrap_err();

    assert!(err.is_row_scoped());
}

#[tokio::test]
async fn test_fetch_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old.txt"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/new.txt", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(None).unwrap();
    let body = fetcher
        .fetch(&format!("{}/old.txt", server.uri()))
        .await
        .unwrap();

    assert_eq!(body, b"moved");
}

#[tokio::test]
async fn test_fetch_timeout_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("slow")
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Some(std::time::Duration::from_millis(200))).unwrap();
    let err = fetcher
        .fetch(&format!("{}/slow.txt", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch(_)));
}
