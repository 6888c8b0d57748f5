use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::http_client::reqwest::ReqwestHttpClient;
use crate::http_client::HttpClient;
use crate::{ClientConfig, Result};


/// Request-scoped values passed to [`RequestBuilder::send_with_context`].
///
/// A context optionally carries the [`HttpClient`] that executes requests,
/// a deadline after which requests fail, and a cancellation signal. Requests
/// sent with a context that has no client use a fresh default client, see
/// [`resolve_client`].
///
/// [`RequestBuilder::send_with_context`]: crate::RequestBuilder::send_with_context
#[derive(Clone, Default)]
pub struct Context {
    client: Option<Arc<dyn HttpClient>>,
    deadline: Option<Instant>,
    cancel: CancelSignal,
}

impl Context {
    /// An empty context: default client, no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Uses `client` for every request sent with this context.
    pub fn with_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Fails requests that are still pending at `deadline`.
    ///
    /// A deadline can only be moved earlier; a later one is ignored.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Sets the deadline `timeout` from now.
    ///
    /// A timeout too large to be represented as an instant sets no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Returns a cancellable copy of this context and the handle that cancels it.
    ///
    /// Cancelling the copy leaves this context untouched, but a copy derived
    /// from an already cancellable context is also cancelled by the parent's
    /// handle.
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let handle = CancelHandle::default();
        self.cancel.0.push(Arc::clone(&handle.cancelled));
        (self, handle)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_set()
    }

    pub(crate) fn is_cancellable(&self) -> bool {
        !self.cancel.0.is_empty()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, zero once it has passed.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("client", &self.client.as_ref().map(|_| "HttpClient"))
            .field("deadline", &self.deadline)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Cancels the requests sent with the [`Context`] it was created with.
///
/// Cancellation is checked before a request is sent and between reads of the
/// request and response bodies. A request already waiting on the network
/// notices it at its next body read.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Cancels the context.
    ///
    /// Returns `false` if it was already cancelled.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
struct CancelSignal(Vec<Arc<AtomicBool>>);

impl CancelSignal {
    fn is_set(&self) -> bool {
        self.0.iter().any(|flag| flag.load(Ordering::SeqCst))
    }
}

/// Fails reads once the context it was created from is cancelled.
pub(crate) struct Cancellable<R> {
    inner: R,
    cancel: CancelSignal,
}

impl<R> Cancellable<R> {
    pub(crate) fn new(ctx: &Context, inner: R) -> Self {
        Cancellable {
            inner,
            cancel: ctx.cancel.clone(),
        }
    }
}

impl<R: io::Read> io::Read for Cancellable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cancel.is_set() {
            return Err(io::Error::other(Cancelled));
        }
        self.inner.read(buf)
    }
}

/// Returns a copy of `ctx` carrying `client`.
pub fn attach_client(ctx: &Context, client: Arc<dyn HttpClient>) -> Context {
    ctx.clone().with_client(client)
}

/// Returns the client attached to `ctx`.
///
/// Without one, a new [`ReqwestHttpClient`] with the process-wide default
/// timeout is built for each call, so no state is shared between requests
/// that do not share a context.
pub fn resolve_client(ctx: &Context) -> Result<Arc<dyn HttpClient>> {
    match &ctx.client {
        Some(client) => Ok(Arc::clone(client)),
        None => Ok(Arc::new(ReqwestHttpClient::create(ClientConfig::default())?)),
    }
}

/// The context deadline passed before the request could complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("context deadline exceeded")]
pub struct DeadlineExceeded;

/// The context was cancelled through its [`CancelHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("context cancelled")]
pub struct Cancelled;
