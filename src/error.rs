use std::io;
use std::sync::Arc;

use bytes::Bytes;

use crate::context::{Cancelled, DeadlineExceeded};
use crate::format::Format;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The method, URL or headers could not form a request. Nothing was sent.
    #[error("invalid request: {0}")]
    RequestConstruction(String),
    /// Sending the request failed: network failure, timeout, an expired
    /// deadline or a cancelled context.
    #[error("error sending request: {0}")]
    Transport(#[source] BoxError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// Draining the response body failed. The body is closed regardless.
    #[error("failed to read response body: {0}")]
    BodyRead(#[source] io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl Error {
    pub(crate) fn transport<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Transport(error.into())
    }

    /// Returns true if the request failed because a timeout or deadline expired.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Transport(source) => {
                source.is::<DeadlineExceeded>()
                    || source
                        .downcast_ref::<reqwest::Error>()
                        .is_some_and(reqwest::Error::is_timeout)
            }
            _ => false,
        }
    }

    /// Returns true if the request failed because its context was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Transport(source) if source.is::<Cancelled>())
    }
}

/// Serializing a request body failed while the body was being sent.
///
/// The same error is returned by reads of the failed body and by dispatch,
/// so it is cheap to clone.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to encode {format} request body: {source}")]
pub struct EncodeError {
    format: Format,
    #[source]
    source: Arc<dyn std::error::Error + Send + Sync>,
}

impl EncodeError {
    pub(crate) fn new(format: Format, source: BoxError) -> Self {
        EncodeError {
            format,
            source: Arc::from(source),
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

/// Unmarshaling a response body failed.
///
/// The response metadata and the raw bytes that failed to decode are kept so
/// that callers can still inspect error responses.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode response body ({status}): {source}", status = .parts.status)]
pub struct DecodeError {
    format: Option<Format>,
    parts: http::response::Parts,
    raw_data: Bytes,
    #[source]
    source: BoxError,
}

impl DecodeError {
    pub(crate) fn new(
        format: Option<Format>,
        parts: http::response::Parts,
        raw_data: Bytes,
        source: BoxError,
    ) -> Self {
        DecodeError {
            format,
            parts,
            raw_data,
            source,
        }
    }

    pub fn format(&self) -> Option<Format> {
        self.format
    }

    pub fn status(&self) -> http::StatusCode {
        self.parts.status
    }

    /// Status, version and headers of the response that failed to decode.
    pub fn parts(&self) -> &http::response::Parts {
        &self.parts
    }

    pub fn raw_data(&self) -> &Bytes {
        &self.raw_data
    }

    pub fn into_raw_data(self) -> Bytes {
        self.raw_data
    }
}
