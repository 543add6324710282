//! Catalog client tests against a local canned-response server.

mod common;

use catalog_mirror::{CatalogClient, MirrorError};
use common::{page, Reply, TestServer};
use std::thread;
use std::time::Duration;

#[test]
fn fetch_page_parses_envelope() {
    let server = TestServer::start(|_| {
        Reply::json(page(&["a", "b", "c"], Some("http://next.test/?page=2")))
    });
    let mut client = CatalogClient::new(Duration::from_secs(10));

    let env = client.fetch_page(&server.url("/api/products/")).unwrap();

    let slugs: Vec<&str> = env.products.iter().map(|p| p.slug().unwrap()).collect();
    assert_eq!(slugs, vec!["a", "b", "c"]);
    assert_eq!(env.next_page_url.as_deref(), Some("http://next.test/?page=2"));
}

#[test]
fn fetch_page_sends_a_single_get_to_the_exact_url() {
    let server = TestServer::start(|_| Reply::json(page(&[], None)));
    let mut client = CatalogClient::new(Duration::from_secs(10));

    client.fetch_page(&server.url("/api/products/?page=3")).unwrap();

    let reqs = server.requests();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].method, "GET");
    assert_eq!(reqs[0].target, "/api/products/?page=3");
    assert!(reqs[0].header("user-agent").unwrap().starts_with("catalog-mirror/"));
}

#[test]
fn fetch_page_reuses_client_across_pages() {
    let server = TestServer::start(|_| Reply::json(page(&["x"], None)));
    let mut client = CatalogClient::new(Duration::from_secs(10));

    client.fetch_page(&server.url("/p1")).unwrap();
    client.fetch_page(&server.url("/p2")).unwrap();

    let targets: Vec<String> = server.requests().into_iter().map(|r| r.target).collect();
    assert_eq!(targets, vec!["/p1", "/p2"]);
}

#[test]
fn non_2xx_status_is_a_transport_failure() {
    let server = TestServer::start(|_| Reply::status(503, "maintenance"));
    let mut client = CatalogClient::new(Duration::from_secs(10));

    let err = client.fetch_page(&server.url("/api/products/")).unwrap_err();

    match err {
        MirrorError::Status { status, url } => {
            assert_eq!(status.as_u16(), 503);
            assert!(url.ends_with("/api/products/"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn non_json_body_is_a_transport_failure() {
    let server = TestServer::start(|_| Reply::text("<html>oops</html>"));
    let mut client = CatalogClient::new(Duration::from_secs(10));

    let err = client.fetch_page(&server.url("/api/products/")).unwrap_err();

    assert!(matches!(err, MirrorError::Http(_)));
}

#[test]
fn missing_products_is_malformed() {
    let server = TestServer::start(|_| Reply::json(serde_json::json!({"error": "rate limited"})));
    let mut client = CatalogClient::new(Duration::from_secs(10));

    let err = client.fetch_page(&server.url("/api/products/")).unwrap_err();

    assert!(matches!(err, MirrorError::MalformedResponse(_)));
}

#[test]
fn connection_refused_is_a_transport_failure() {
    // Bind then drop to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut client = CatalogClient::new(Duration::from_secs(10));

    let err = client
        .fetch_page(&format!("http://127.0.0.1:{port}/api/products/"))
        .unwrap_err();

    assert!(matches!(err, MirrorError::Http(_)));
}

#[test]
fn slow_server_hits_the_timeout() {
    let server = TestServer::start(|_| {
        thread::sleep(Duration::from_millis(1500));
        Reply::json(page(&[], None))
    });
    let mut client = CatalogClient::new(Duration::from_millis(200));

    let err = client.fetch_page(&server.url("/api/products/")).unwrap_err();

    match err {
        MirrorError::Http(e) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}
