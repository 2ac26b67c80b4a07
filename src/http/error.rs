//! Per-request failures and their HTTP translation.
//!
//! # Responsibilities
//! - Classify why a request stopped before relay
//! - Map routing failures to 400 and upstream failures to 502
//! - Log the cause and count upstream failures by kind
//!
//! # Design Decisions
//! - Upstream causes name internal hosts, so 502 bodies are a fixed message
//! - 400 bodies name the offending Host; the client sent it

use std::error::Error as _;
use std::io;

use axum::http::{uri::InvalidUri, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::observability::metrics;
use crate::resilience::timeouts::TimedOut;
use crate::routing::RoutingError;

/// Body returned for any upstream transport failure.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Upstream request failed";

/// Everything that can stop a request before the upstream response is relayed.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("invalid upstream target {target:?}")]
    InvalidTarget {
        target: String,
        #[source]
        source: InvalidUri,
    },

    #[error("upstream request to registry {registry} failed")]
    Upstream {
        registry: String,
        #[source]
        source: UpstreamFailure,
    },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Routing(_) | ProxyError::InvalidTarget { .. } => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Registry the request was routed to, if routing succeeded.
    pub fn registry(&self) -> Option<&str> {
        match self {
            ProxyError::Upstream { registry, .. } => Some(registry.as_str()),
            _ => None,
        }
    }
}

/// Why the upstream call produced no response.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamFailure {
    #[error(transparent)]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error(transparent)]
    Timeout(#[from] TimedOut),
}

impl UpstreamFailure {
    /// Metric label: `timeout`, `connect` or `other`.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamFailure::Timeout(_) => "timeout",
            UpstreamFailure::Transport(err) if caused_by_timeout(err) => "timeout",
            UpstreamFailure::Transport(err) if err.is_connect() => "connect",
            UpstreamFailure::Transport(_) => "other",
        }
    }
}

fn caused_by_timeout(err: &hyper_util::client::legacy::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ProxyError::Routing(err) => {
                tracing::warn!(error = %err, "Rejected: no registry for host");
                (status, err.to_string()).into_response()
            }
            ProxyError::InvalidTarget { target, source } => {
                tracing::warn!(uri = %target, error = %source, "Rejected: invalid upstream target");
                (status, "Invalid request target").into_response()
            }
            ProxyError::Upstream { registry, source } => {
                let kind = source.kind();
                // The cause names internal hosts; it stays in the logs.
                tracing::error!(registry = %registry, kind, error = %source, "Upstream request failed");
                metrics::record_upstream_failure(&registry, kind);
                (status, UPSTREAM_FAILURE_MESSAGE).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_routing_error_is_bad_request() {
        let err = ProxyError::from(RoutingError::UnknownHost("unknown.example.com".into()));
        assert_eq!(err.registry(), None);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Registry for host unknown.example.com not supported");
    }

    #[tokio::test]
    async fn test_missing_host_is_bad_request() {
        let response = ProxyError::from(RoutingError::MissingHost).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Host header missing");
    }

    #[tokio::test]
    async fn test_timeout_is_bad_gateway_with_generic_body() {
        let err = ProxyError::Upstream {
            registry: "azure".into(),
            source: UpstreamFailure::from(TimedOut),
        };
        assert_eq!(err.registry(), Some("azure"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], UPSTREAM_FAILURE_MESSAGE.as_bytes());
    }

    #[test]
    fn test_failure_kind() {
        assert_eq!(UpstreamFailure::from(TimedOut).kind(), "timeout");
    }
}
