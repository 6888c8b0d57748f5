#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fluent_request::{HttpClient, Request, Response, ResponseBody, Result};
use http::HeaderMap;

/// Answers every request with status 200 and the request body as the
/// response body. Records the request headers.
#[derive(Default)]
pub struct EchoClient {
    pub headers: Mutex<Option<HeaderMap>>,
}

impl EchoClient {
    pub fn shared() -> Arc<EchoClient> {
        Arc::new(EchoClient::default())
    }

    pub fn received_header(&self, name: &str) -> Option<String> {
        let headers = self.headers.lock().unwrap();
        headers
            .as_ref()
            .and_then(|headers| headers.get(name))
            .map(|value| value.to_str().unwrap().to_string())
    }
}

impl HttpClient for EchoClient {
    fn execute(&self, request: Request, _timeout: Option<Duration>) -> Result<Response> {
        let (parts, body) = request.into_parts();
        *self.headers.lock().unwrap() = Some(parts.headers);

        Ok(http::Response::builder()
            .status(200)
            .body(ResponseBody::new(body))
            .unwrap())
    }

    fn timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(5))
    }
}

pub fn read_to_string(mut reader: impl Read) -> String {
    let mut buf = String::new();
    reader.read_to_string(&mut buf).unwrap();
    buf
}
