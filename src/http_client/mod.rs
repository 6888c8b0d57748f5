use std::sync::Arc;
use std::time::Duration;

use crate::{Request, Response, Result};

#[cfg(test)]
pub(crate) mod mock;
#[cfg(test)]
mod tests;

pub mod reqwest;

/// Executes a single request.
pub trait HttpClient: Send + Sync {
    /// Sends `request` and returns the response with its body unread.
    ///
    /// `timeout`, when present, applies to this request only and takes
    /// precedence over [`HttpClient::timeout`].
    fn execute(&self, request: Request, timeout: Option<Duration>) -> Result<Response>;

    /// Timeout applied to requests that carry no timeout of their own.
    fn timeout(&self) -> Option<Duration>;
}

impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    fn execute(&self, request: Request, timeout: Option<Duration>) -> Result<Response> {
        (**self).execute(request, timeout)
    }

    fn timeout(&self) -> Option<Duration> {
        (**self).timeout()
    }
}

impl<T: HttpClient + ?Sized> HttpClient for Box<T> {
    fn execute(&self, request: Request, timeout: Option<Duration>) -> Result<Response> {
        (**self).execute(request, timeout)
    }

    fn timeout(&self) -> Option<Duration> {
        (**self).timeout()
    }
}
