use std::fmt;
use std::io::{self, Read};

use bytes::Bytes;

/// Body of a response returned by an [`HttpClient`].
///
/// Once closed, every read fails.
///
/// [`HttpClient`]: crate::http_client::HttpClient
pub struct ResponseBody {
    inner: Option<Box<dyn Read + Send>>,
}

impl ResponseBody {
    pub fn new<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        ResponseBody {
            inner: Some(Box::new(reader)),
        }
    }

    pub fn empty() -> Self {
        ResponseBody::new(io::empty())
    }

    /// Releases the underlying reader.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            tracing::trace!(target: "fluent_request::body", "response body closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Some(reader) => reader.read(buf),
            None => Err(io::Error::other("read on closed response body")),
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        ResponseBody::new(io::Cursor::new(bytes))
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        ResponseBody::new(io::Cursor::new(bytes))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(s: &'static str) -> Self {
        ResponseBody::new(s.as_bytes())
    }
}
