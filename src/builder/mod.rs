use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::body::EncodeSlot;
use crate::config::representable;
use crate::context::{resolve_client, Cancellable, Cancelled, Context, DeadlineExceeded};
use crate::format::Format;
use crate::header::HeaderSet;
use crate::http_client::HttpClient;
use crate::result::{Json, Raw, WithResult, Xml};
use crate::{Body, Error, Request, Response, Result};


/// Builds and sends HTTP requests.
///
/// ```no_run
/// use fluent_request::RequestBuilder;
///
/// let response = RequestBuilder::new()
///     .bearer_auth("token")
///     .json_body(serde_json::json!({ "text": "hello" }))
///     .send("POST", "http://localhost:8080/notes")?;
/// # Ok::<(), fluent_request::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct RequestBuilder {
    headers: HeaderSet,
    timeout: Option<Duration>,
    body: Option<Body>,
    encode_slot: Option<EncodeSlot>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total timeout of the request, overriding the client's.
    ///
    /// A zero duration is treated as no override.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout).filter(|t| !t.is_zero());
        self
    }

    /// Sets the body of the request, replacing any previous body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self.encode_slot = None;
        self
    }

    /// Sets the body to the JSON representation of `value` and the
    /// Content-Type header to `application/json`.
    ///
    /// The value is serialized while the request is sent. A serialization
    /// failure is reported by `send` as [`Error::Encode`].
    pub fn json_body<T>(self, value: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        self.encoded_body(Format::Json, value)
    }

    /// Sets the body to the XML representation of `value` and the
    /// Content-Type header to `application/xml`.
    pub fn xml_body<T>(self, value: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        self.encoded_body(Format::Xml, value)
    }

    fn encoded_body<T>(mut self, format: Format, value: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        let (body, slot) = Body::encoded(format, value);
        self.body = Some(body);
        self.encode_slot = Some(slot);
        self.headers.set("Content-Type", format.mime());
        self
    }

    /// Sets the header `name` to the single `value`, replacing existing values.
    /// The name is case insensitive.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Appends `value` to the values of header `name`.
    pub fn multi_valued_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn content_type(self, value: impl Into<String>) -> Self {
        self.header("Content-Type", value)
    }

    /// Uses HTTP Basic authentication with the given credentials.
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        self.header("Authorization", format!("Basic {credentials}"))
    }

    /// Uses HTTP Bearer authentication with `token`.
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Reads the whole response body into the result without decoding it.
    pub fn with_result(self) -> WithResult<Raw> {
        WithResult::new(self, Raw)
    }

    /// Reads the whole response body and decodes it from JSON into `T`.
    ///
    /// Sets the Accept header to `application/json` unless one is set.
    pub fn with_json_result<T: DeserializeOwned>(self) -> WithResult<Json<T>> {
        WithResult::new(self, Json::new())
    }

    /// Reads the whole response body and decodes it from XML into `T`.
    ///
    /// Sets the Accept header to `application/xml` unless one is set.
    pub fn with_xml_result<T: DeserializeOwned>(self) -> WithResult<Xml<T>> {
        WithResult::new(self, Xml::new())
    }

    /// Sends the request with a [`Context::background`] context.
    pub fn send(self, method: &str, url: &str) -> Result<Response> {
        self.send_with_context(&Context::background(), method, url)
    }

    /// Sends the request with the client and deadline of `ctx`.
    ///
    /// An empty `method` means GET.
    pub fn send_with_context(self, ctx: &Context, method: &str, url: &str) -> Result<Response> {
        self.prepare(method, url)?.execute(ctx)
    }

    pub(crate) fn prepare(self, method: &str, url: &str) -> Result<Prepared> {
        let method = match method {
            "" => http::Method::GET,
            method => http::Method::from_bytes(method.as_bytes()).map_err(|e| {
                Error::RequestConstruction(format!("invalid method {method:?}: {e}"))
            })?,
        };
        let url = Url::parse(url)
            .map_err(|e| Error::RequestConstruction(format!("invalid url {url:?}: {e}")))?;
        let headers = self.headers.to_header_map()?;

        let mut request = http::Request::builder()
            .method(method)
            .uri(url.as_str())
            .body(self.body.unwrap_or_default())
            .map_err(|e| Error::RequestConstruction(e.to_string()))?;
        *request.headers_mut() = headers;

        Ok(Prepared {
            request,
            timeout: self.timeout,
            encode_slot: self.encode_slot,
        })
    }
}

/// A request ready to be handed to a client.
#[derive(Debug)]
pub(crate) struct Prepared {
    request: Request,
    timeout: Option<Duration>,
    encode_slot: Option<EncodeSlot>,
}

impl Prepared {
    pub(crate) fn encode_slot(&self) -> Option<EncodeSlot> {
        self.encode_slot.clone()
    }

    pub(crate) fn execute(self, ctx: &Context) -> Result<Response> {
        if ctx.is_cancelled() {
            return Err(Error::transport(Cancelled));
        }
        let client = resolve_client(ctx)?;

        let timeout = match (self.timeout, ctx.remaining()) {
            (_, Some(remaining)) if remaining.is_zero() => {
                return Err(Error::transport(DeadlineExceeded));
            }
            (Some(timeout), Some(remaining)) => Some(timeout.min(remaining)),
            (Some(timeout), None) => Some(timeout),
            (None, Some(remaining)) => Some(match client.timeout() {
                Some(timeout) => timeout.min(remaining),
                None => remaining,
            }),
            (None, None) => None,
        };
        let timeout = representable(timeout);

        // streamed bodies stop at the next read once the context is cancelled
        let (parts, body) = self.request.into_parts();
        let body = if ctx.is_cancellable() && body.len().is_none() {
            Body::from_reader(Cancellable::new(ctx, body))
        } else {
            body
        };
        let request = Request::from_parts(parts, body);

        let method = request.method().clone();
        let uri = request.uri().clone();
        tracing::debug!(target: "fluent_request::builder", %method, %uri, ?timeout, "sending request");

        let error = match client.execute(request, timeout) {
            Ok(response) => {
                tracing::debug!(target: "fluent_request::builder", %method, %uri, status = %response.status(), "received response");
                return Ok(response);
            }
            Err(error) => error,
        };

        if ctx.is_cancelled() {
            tracing::debug!(target: "fluent_request::builder", %method, %uri, "request cancelled");
            return Err(Error::transport(Cancelled));
        }
        match self.encode_slot.as_ref().and_then(EncodeSlot::take) {
            Some(encode) => Err(encode.into()),
            None => {
                tracing::debug!(target: "fluent_request::builder", %method, %uri, %error, "request failed");
                Err(error)
            }
        }
    }
}
