use std::io::Read;
use std::time::Duration;

use http::Method;
use httpmock::MockServer;

use crate::http_client::reqwest::ReqwestHttpClient;
use crate::http_client::HttpClient;
use crate::{Body, ClientConfig, Request};

fn request(method: Method, uri: String, body: Body) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("X-Custom-Header", "test_validate_verify")
        .body(body)
        .unwrap()
}

#[test]
fn execute() {
    let body = "{\"result\": \"content\"}";

    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/defaults")
            .body(body)
            .header("X-Custom-Header", "test_validate_verify")
            .header("Content-Type", "application/json");
        then.status(200).body("pong");
    });

    let client = ReqwestHttpClient::create(ClientConfig::default()).unwrap();
    let mut res = client
        .execute(
            request(Method::POST, server.url("/defaults"), Body::from(body)),
            None,
        )
        .unwrap();

    let mut received = String::new();
    res.body_mut().read_to_string(&mut received).unwrap();

    mock.assert();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(received, "pong");
}

#[test]
fn execute_streamed_body() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::PUT)
            .path("/streamed")
            .body("streamed payload");
        then.status(204);
    });

    let client = ReqwestHttpClient::create(ClientConfig::default()).unwrap();
    let res = client
        .execute(
            request(
                Method::PUT,
                server.url("/streamed"),
                Body::from_reader(&b"streamed payload"[..]),
            ),
            None,
        )
        .unwrap();

    mock.assert();
    assert_eq!(res.status().as_u16(), 204);
}

#[test]
fn per_request_timeout() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/slow");
        then.status(200).delay(Duration::from_millis(500));
    });

    let client = ReqwestHttpClient::create(ClientConfig::default()).unwrap();
    let err = client
        .execute(
            request(Method::GET, server.url("/slow"), Body::empty()),
            Some(Duration::from_millis(50)),
        )
        .unwrap_err();

    assert!(err.is_timeout(), "{err}");
}

#[test]
fn client_timeout_from_config() {
    let client = ReqwestHttpClient::create(
        ClientConfig::default().timeout(Some(Duration::from_secs(3))),
    )
    .unwrap();
    assert_eq!(client.timeout(), Some(Duration::from_secs(3)));

    let unbounded = ReqwestHttpClient::create(ClientConfig::default().timeout(None)).unwrap();
    assert_eq!(unbounded.timeout(), None);
}

#[test]
fn unrepresentable_timeouts_are_dropped() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/forever");
        then.status(200);
    });

    let client =
        ReqwestHttpClient::create(ClientConfig::default().timeout(Some(Duration::MAX))).unwrap();
    assert_eq!(client.timeout(), None);

    let res = client
        .execute(
            request(Method::GET, server.url("/forever"), Body::empty()),
            Some(Duration::MAX),
        )
        .unwrap();

    mock.assert();
    assert_eq!(res.status().as_u16(), 200);
}
