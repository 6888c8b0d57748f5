use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Timeout of the client used when no client is attached to the [`Context`].
///
/// [`Context`]: crate::Context
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

static DEFAULT_TIMEOUT_NANOS: AtomicU64 = AtomicU64::new(DEFAULT_CLIENT_TIMEOUT.as_nanos() as u64);

/// Current process-wide timeout for default clients.
pub fn default_client_timeout() -> Duration {
    Duration::from_nanos(DEFAULT_TIMEOUT_NANOS.load(Ordering::Relaxed))
}

/// Overrides the process-wide timeout for default clients.
///
/// Meant to be called once during start-up. Requests already resolving a
/// default client may observe either value. A zero duration disables the
/// timeout of default clients.
pub fn set_default_client_timeout(timeout: Duration) {
    let nanos = u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX);
    DEFAULT_TIMEOUT_NANOS.store(nanos, Ordering::Relaxed);
}

/// Drops a timeout whose deadline would not fit in an [`Instant`].
///
/// Such a timeout can never fire, and reqwest panics computing its deadline.
pub(crate) fn representable(timeout: Option<Duration>) -> Option<Duration> {
    timeout.filter(|timeout| Instant::now().checked_add(*timeout).is_some())
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Total timeout applied to every request; `None` means no timeout.
    pub timeout: Option<Duration>,
    pub ssl_check: bool,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Some(default_client_timeout()).filter(|t| !t.is_zero()),
            ssl_check: true,
            user_agent: Some(format!("fluent-request/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl ClientConfig {
    pub fn new(ssl_check: bool) -> Self {
        Self {
            ssl_check,
            ..Self::default()
        }
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
