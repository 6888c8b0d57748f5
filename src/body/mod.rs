use std::fmt;
use std::io::{self, Read};

use bytes::{Buf, Bytes};
use serde::Serialize;

use crate::format::Format;

pub(crate) use self::pipe::EncodeSlot;
pub use self::response::ResponseBody;

mod pipe;
mod response;


/// Source of a request body.
///
/// A body is read once, while the request is being sent.
pub struct Body {
    kind: Kind,
}

enum Kind {
    Empty,
    Bytes(Bytes),
    Reader(Box<dyn Read + Send>),
    Encoded(pipe::EncodedReader),
}

impl Body {
    pub fn empty() -> Self {
        Body { kind: Kind::Empty }
    }

    /// Streams the body from `reader`.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Body {
            kind: Kind::Reader(Box::new(reader)),
        }
    }

    /// Streams `value` serialized as `format`.
    ///
    /// Serialization starts on the first read and runs on its own thread,
    /// writing into a bounded pipe. The returned slot receives the error if
    /// serialization fails.
    pub(crate) fn encoded<T>(format: Format, value: T) -> (Self, EncodeSlot)
    where
        T: Serialize + Send + 'static,
    {
        let slot = EncodeSlot::default();
        let reader = pipe::EncodedReader::new(format, slot.clone(), move |writer| {
            format.encode(&value, writer)
        });
        let body = Body {
            kind: Kind::Encoded(reader),
        };
        (body, slot)
    }

    /// Length of the body if it is known up front.
    pub fn len(&self) -> Option<u64> {
        match &self.kind {
            Kind::Empty => Some(0),
            Kind::Bytes(bytes) => Some(bytes.len() as u64),
            Kind::Reader(_) | Kind::Encoded(_) => None,
        }
    }

    /// Returns the in-memory contents, or the body itself if it is streamed.
    pub fn into_bytes(self) -> Result<Bytes, Body> {
        match self.kind {
            Kind::Empty => Ok(Bytes::new()),
            Kind::Bytes(bytes) => Ok(bytes),
            kind => Err(Body { kind }),
        }
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Empty => Ok(0),
            Kind::Bytes(bytes) => {
                let n = buf.len().min(bytes.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                bytes.advance(n);
                Ok(n)
            }
            Kind::Reader(reader) => reader.read(buf),
            Kind::Encoded(reader) => reader.read(buf),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Empty => f.write_str("Body::Empty"),
            Kind::Bytes(bytes) => f.debug_tuple("Body::Bytes").field(bytes).finish(),
            Kind::Reader(_) => f.write_str("Body::Reader"),
            Kind::Encoded(reader) => f.debug_tuple("Body::Encoded").field(reader).finish(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body {
            kind: Kind::Bytes(bytes),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Bytes::from(s).into()
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Bytes::from_static(s.as_bytes()).into()
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Bytes::from_static(bytes).into()
    }
}
