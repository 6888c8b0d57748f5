use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};

use crate::http_client::HttpClient;
use crate::{CancelHandle, Error, Request, Response, ResponseBody, Result};

/// What a [`RecordingClient`] saw of the last request.
#[derive(Debug, Clone)]
pub(crate) struct Seen {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub timeout: Option<Duration>,
}

/// Reads the whole request body and answers with a canned response.
#[derive(Debug)]
pub(crate) struct RecordingClient {
    status: StatusCode,
    body: Bytes,
    timeout: Option<Duration>,
    seen: Mutex<Option<Seen>>,
}

impl RecordingClient {
    pub(crate) fn new(status: StatusCode, body: &'static str) -> Self {
        RecordingClient {
            status,
            body: Bytes::from_static(body.as_bytes()),
            timeout: Some(Duration::from_secs(5)),
            seen: Mutex::new(None),
        }
    }

    pub(crate) fn ok() -> Self {
        Self::new(StatusCode::OK, "")
    }

    pub(crate) fn seen(&self) -> Seen {
        self.seen
            .lock()
            .unwrap()
            .clone()
            .expect("client was not called")
    }

    pub(crate) fn was_called(&self) -> bool {
        self.seen.lock().unwrap().is_some()
    }
}

impl HttpClient for RecordingClient {
    fn execute(&self, request: Request, timeout: Option<Duration>) -> Result<Response> {
        let (parts, mut body) = request.into_parts();
        let mut buf = Vec::new();
        let read = body.read_to_end(&mut buf);

        *self.seen.lock().unwrap() = Some(Seen {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body: buf,
            timeout,
        });
        read.map_err(Error::transport)?;

        let response = http::Response::builder()
            .status(self.status)
            .header("content-type", "application/json")
            .body(ResponseBody::from(self.body.clone()))
            .unwrap();
        Ok(response)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Responds with a body that fails part way through.
#[derive(Debug)]
pub(crate) struct BrokenBodyClient;

/// Yields `{` and then fails. Records when it is dropped.
#[derive(Default)]
pub(crate) struct BrokenReader {
    sent: bool,
    dropped: Arc<AtomicBool>,
}

impl BrokenReader {
    pub(crate) fn dropped(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.dropped)
    }
}

impl Drop for BrokenReader {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if !self.sent && !buf.is_empty() {
            self.sent = true;
            buf[0] = b'{';
            return Ok(1);
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        ))
    }
}

impl HttpClient for BrokenBodyClient {
    fn execute(&self, _request: Request, _timeout: Option<Duration>) -> Result<Response> {
        Ok(http::Response::builder()
            .status(StatusCode::OK)
            .body(ResponseBody::new(BrokenReader::default()))
            .unwrap())
    }

    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Reads part of the request body, cancels the context, then reads the rest.
#[derive(Debug)]
pub(crate) struct CancelDuringUpload(pub CancelHandle);

impl HttpClient for CancelDuringUpload {
    fn execute(&self, request: Request, _timeout: Option<Duration>) -> Result<Response> {
        let mut body = request.into_body();
        let mut head = [0u8; 16];
        body.read_exact(&mut head).map_err(Error::transport)?;

        self.0.cancel();
        let mut rest = Vec::new();
        body.read_to_end(&mut rest).map_err(Error::transport)?;

        Ok(http::Response::new(ResponseBody::empty()))
    }

    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Responds with a body that cancels the context as soon as it is read.
#[derive(Debug)]
pub(crate) struct CancelDuringDownload(pub CancelHandle);

struct CancellingReader {
    handle: CancelHandle,
    data: &'static [u8],
}

impl Read for CancellingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.handle.cancel();
        self.data.read(buf)
    }
}

impl HttpClient for CancelDuringDownload {
    fn execute(&self, _request: Request, _timeout: Option<Duration>) -> Result<Response> {
        let reader = CancellingReader {
            handle: self.0.clone(),
            data: b"partial response",
        };
        Ok(http::Response::builder()
            .status(StatusCode::OK)
            .body(ResponseBody::new(reader))
            .unwrap())
    }

    fn timeout(&self) -> Option<Duration> {
        None
    }
}
