use std::fmt;
use std::io;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::BoxError;

/// Wire formats a body can be encoded to or decoded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    /// Canonical MIME type, used for Content-Type and Accept headers.
    pub fn mime(self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Xml => "application/xml",
        }
    }

    pub(crate) fn encode<T, W>(self, value: &T, writer: W) -> Result<(), BoxError>
    where
        T: Serialize + ?Sized,
        W: io::Write,
    {
        match self {
            Format::Json => serde_json::to_writer(writer, value).map_err(Into::into),
            Format::Xml => {
                let mut writer = FmtWriter {
                    inner: writer,
                    error: None,
                };
                match quick_xml::se::to_writer(&mut writer, value) {
                    Ok(_) => Ok(()),
                    Err(e) => Err(match writer.error.take() {
                        Some(io) => io.into(),
                        None => e.into(),
                    }),
                }
            }
        }
    }

    pub(crate) fn decode<T>(self, raw: &[u8]) -> Result<T, BoxError>
    where
        T: DeserializeOwned,
    {
        match self {
            Format::Json => serde_json::from_slice(raw).map_err(Into::into),
            Format::Xml => quick_xml::de::from_reader(raw).map_err(Into::into),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("JSON"),
            Format::Xml => f.write_str("XML"),
        }
    }
}

// quick-xml serializes into `fmt::Write`, the body pipe is an `io::Write`.
struct FmtWriter<W> {
    inner: W,
    error: Option<io::Error>,
}

impl<W: io::Write> fmt::Write for FmtWriter<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.inner.write_all(s.as_bytes()).map_err(|e| {
            self.error = Some(e);
            fmt::Error
        })
    }
}
