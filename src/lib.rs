//! # fluent-request
//!
//! fluent-request is syntactic sugar for sending HTTP requests. A
//! [`RequestBuilder`] accumulates headers, a body, authentication and a
//! timeout, then sends exactly one request through an [`HttpClient`].
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use fluent_request::RequestBuilder;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Note {
//!     id: String,
//!     text: String,
//! }
//!
//! let outcome = RequestBuilder::new()
//!     .timeout(Duration::from_secs(10))
//!     .basic_auth("username", "password")
//!     .with_json_result::<Note>()
//!     .send("GET", "http://localhost:8080/notes/1")?;
//!
//! println!("{}: {}", outcome.status(), outcome.value.text);
//! # Ok::<(), fluent_request::Error>(())
//! ```
//!
//! ## Clients
//!
//! Requests are executed by the client attached to the [`Context`] they are
//! sent with. Without one, a [`ReqwestHttpClient`] with a timeout of
//! [`default_client_timeout`] is built for the request.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fluent_request::http_client::reqwest::ReqwestHttpClient;
//! use fluent_request::{ClientConfig, Context, RequestBuilder};
//!
//! let client = ReqwestHttpClient::create(ClientConfig::new(true))?;
//! let ctx = Context::background().with_client(Arc::new(client));
//!
//! let response = RequestBuilder::new()
//!     .bearer_auth("token")
//!     .send_with_context(&ctx, "DELETE", "http://localhost:8080/notes/1")?;
//! # Ok::<(), fluent_request::Error>(())
//! ```
//!
//! ## Bodies
//!
//! [`RequestBuilder::json_body`] and [`RequestBuilder::xml_body`] serialize
//! their value while the request is being sent instead of buffering it. The
//! encoder only starts once the client reads the body, so a builder dropped
//! before sending leaves nothing behind.
//!
//! ## Results
//!
//! [`RequestBuilder::with_result`], [`RequestBuilder::with_json_result`] and
//! [`RequestBuilder::with_xml_result`] read the whole response body, close it
//! and decode it. A [`DecodeError`] still carries the status, headers and raw
//! bytes of the response.

mod body;
mod builder;
mod config;
mod context;
mod error;
mod format;
mod header;
pub mod http_client;
mod result;

pub use crate::body::{Body, ResponseBody};
pub use crate::builder::RequestBuilder;
pub use crate::config::{
    default_client_timeout, set_default_client_timeout, ClientConfig, DEFAULT_CLIENT_TIMEOUT,
};
pub use crate::context::{
    attach_client, resolve_client, CancelHandle, Cancelled, Context, DeadlineExceeded,
};
pub use crate::error::{BoxError, DecodeError, EncodeError, Error};
pub use crate::format::Format;
pub use crate::header::{canonical_name, HeaderSet};
pub use crate::http_client::reqwest::ReqwestHttpClient;
pub use crate::http_client::HttpClient;
pub use crate::result::{Decoder, Json, Outcome, Raw, WithResult, Xml};

pub type Result<T> = std::result::Result<T, Error>;

pub type Request = http::Request<Body>;

pub type Response = http::Response<ResponseBody>;
