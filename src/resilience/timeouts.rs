//! Timeout enforcement.
//!
//! # Responsibilities
//! - Build the shared upstream client with a connect timeout and idle pool
//! - Bound every wait on the upstream by a read timeout and a total deadline
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - The client adds no headers of its own and never follows redirects
//! - One `Deadline` per request covers the response head and every body read
//! - Timed-out requests surface as upstream failures and return 502

use std::future::Future;
use std::time::Duration;

use axum::body::Body;
use futures_util::stream::{self, Stream, StreamExt};
use hyper_tls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use tokio::time::Instant;

use crate::config::TimeoutConfig;

/// Upstream client shared by all requests (HTTP and HTTPS).
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the upstream HTTP client shared by all requests.
pub fn build_upstream_client(timeouts: &TimeoutConfig) -> Result<UpstreamClient, native_tls::Error> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

    let tls = native_tls::TlsConnector::new()?;
    let connector = HttpsConnector::from((http, tls.into()));

    Ok(Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
        .pool_timer(TokioTimer::new())
        .build(connector))
}

/// The upstream made no progress before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("upstream made no progress before its deadline")]
pub struct TimedOut;

/// Per-request time budget: each wait is bounded by `read`, all of them by `total`.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    read: Duration,
    expires: Instant,
}

impl Deadline {
    pub fn new(read: Duration, total: Duration) -> Self {
        Self {
            read,
            expires: Instant::now() + total,
        }
    }

    /// Start the budget for one request.
    pub fn start(timeouts: &TimeoutConfig) -> Self {
        Self::new(
            Duration::from_secs(timeouts.read_secs),
            Duration::from_secs(timeouts.request_secs),
        )
    }

    fn next_wait(&self) -> Instant {
        (Instant::now() + self.read).min(self.expires)
    }

    /// Run one wait under the budget.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, TimedOut> {
        tokio::time::timeout_at(self.next_wait(), fut)
            .await
            .map_err(|_| TimedOut)
    }
}

/// Apply `deadline` to every item of a fallible stream.
///
/// A timeout yields one error item and ends the stream, dropping `inner`.
pub fn with_deadline<S, T, E>(inner: S, deadline: Deadline) -> impl Stream<Item = Result<T, E>>
where
    S: Stream<Item = Result<T, E>> + Send + 'static,
    E: From<TimedOut>,
{
    stream::unfold(Some(Box::pin(inner)), move |state| async move {
        let mut inner = state?;
        match deadline.run(inner.next()).await {
            Ok(Some(item)) => Some((item, Some(inner))),
            Ok(None) => None,
            Err(timed_out) => Some((Err(E::from(timed_out)), None)),
        }
    })
}
