use std::fmt;
use std::io::Read;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::context::{Cancellable, Cancelled, Context};
use crate::error::{BoxError, DecodeError};
use crate::format::Format;
use crate::{Error, RequestBuilder, Response, ResponseBody, Result};


/// The result of sending a request and reading its response body.
#[derive(Debug)]
pub struct Outcome<T = ()> {
    /// The response, with its body read to completion and closed. Reading
    /// from the body fails.
    pub response: Response,
    /// Everything read from the response body.
    pub raw_data: Bytes,
    /// The decoded body.
    pub value: T,
}

impl<T> Outcome<T> {
    pub fn status(&self) -> http::StatusCode {
        self.response.status()
    }
}

/// Turns the raw response body into a value.
pub trait Decoder {
    type Output;

    /// Format to advertise in the Accept header, if any.
    fn format(&self) -> Option<Format>;

    fn decode(&self, raw: &[u8]) -> std::result::Result<Self::Output, BoxError>;
}

/// Keeps the raw bytes only.
#[derive(Clone, Copy, Debug, Default)]
pub struct Raw;

impl Decoder for Raw {
    type Output = ();

    fn format(&self) -> Option<Format> {
        None
    }

    fn decode(&self, _raw: &[u8]) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

macro_rules! format_decoder {
    ($(#[$doc:meta])* $name:ident, $format:expr) => {
        $(#[$doc])*
        pub struct $name<T>(PhantomData<fn() -> T>);

        impl<T> $name<T> {
            pub fn new() -> Self {
                $name(PhantomData)
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(stringify!($name))
            }
        }

        impl<T: DeserializeOwned> Decoder for $name<T> {
            type Output = T;

            fn format(&self) -> Option<Format> {
                Some($format)
            }

            fn decode(&self, raw: &[u8]) -> std::result::Result<T, BoxError> {
                $format.decode(raw)
            }
        }
    };
}

format_decoder!(
    /// Decodes the body as JSON.
    Json,
    Format::Json
);
format_decoder!(
    /// Decodes the body as XML.
    Xml,
    Format::Xml
);

/// A [`RequestBuilder`] whose response body is read, closed and decoded.
#[derive(Debug)]
pub struct WithResult<D> {
    builder: RequestBuilder,
    decoder: D,
}

impl<D: Decoder> WithResult<D> {
    pub(crate) fn new(builder: RequestBuilder, decoder: D) -> Self {
        let builder = match decoder.format() {
            Some(format) if !builder.headers().contains("Accept") => {
                builder.header("Accept", format.mime())
            }
            _ => builder,
        };
        WithResult { builder, decoder }
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Sends the request with a [`Context::background`] context.
    pub fn send(self, method: &str, url: &str) -> Result<Outcome<D::Output>> {
        self.send_with_context(&Context::background(), method, url)
    }

    /// Sends the request and reads the whole response body.
    ///
    /// The body is closed on every path. If decoding fails, the error keeps
    /// the response metadata and the raw bytes.
    pub fn send_with_context(
        self,
        ctx: &Context,
        method: &str,
        url: &str,
    ) -> Result<Outcome<D::Output>> {
        let prepared = self.builder.prepare(method, url)?;
        let encode_slot = prepared.encode_slot();
        let mut response = prepared.execute(ctx)?;

        let raw_data = match drain(ctx, response.body_mut()) {
            Ok(raw_data) => raw_data,
            Err(_) if ctx.is_cancelled() => return Err(Error::transport(Cancelled)),
            Err(e) => {
                return Err(match encode_slot.as_ref().and_then(|slot| slot.take()) {
                    Some(encode) => encode.into(),
                    None => Error::BodyRead(e),
                });
            }
        };

        match self.decoder.decode(&raw_data) {
            Ok(value) => Ok(Outcome {
                response,
                raw_data,
                value,
            }),
            Err(source) => {
                let (parts, _) = response.into_parts();
                Err(DecodeError::new(self.decoder.format(), parts, raw_data, source).into())
            }
        }
    }
}

/// Reads `body` to the end and closes it, whatever the outcome.
///
/// Stops with an error at the first read after `ctx` is cancelled.
fn drain(ctx: &Context, body: &mut ResponseBody) -> std::io::Result<Bytes> {
    struct CloseGuard<'a>(&'a mut ResponseBody);

    impl Drop for CloseGuard<'_> {
        fn drop(&mut self) {
            self.0.close();
        }
    }

    let mut guard = CloseGuard(body);
    let mut buf = Vec::new();
    Cancellable::new(ctx, &mut *guard.0).read_to_end(&mut buf)?;
    Ok(buf.into())
}
