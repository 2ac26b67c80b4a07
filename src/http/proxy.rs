//! Per-request proxy handler.
//!
//! # Request lifecycle
//! ```text
//! Received → Routed → Forwarding → Relaying
//!     │          │          │
//!     └──────────┴──────────┴──→ Rejected (400 / 502)
//! ```
//!
//! One upstream attempt per request; no transition leads back to `Routed`.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    response::{IntoResponse, Response},
};

use crate::http::error::{ProxyError, UpstreamFailure};
use crate::http::server::AppState;
use crate::http::{request, response};
use crate::observability::metrics;
use crate::resilience::timeouts::Deadline;

/// Axum entry point: forward the request and record the outcome.
pub async fn proxy_handler(State(state): State<AppState>, inbound: Request<Body>) -> Response {
    let start = Instant::now();
    let method = inbound.method().clone();

    match forward(&state, inbound).await {
        Ok((registry, response)) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), &registry, start);
            response
        }
        Err(err) => {
            let registry = err.registry().unwrap_or("none").to_string();
            let response = err.into_response();
            metrics::record_request(method.as_str(), response.status().as_u16(), &registry, start);
            response
        }
    }
}

/// Route, forward and relay one request.
///
/// Returns the registry id alongside the relayed response.
pub async fn forward(
    state: &AppState,
    inbound: Request<Body>,
) -> Result<(String, Response), ProxyError> {
    let (parts, body) = inbound.into_parts();

    tracing::info!(method = %parts.method, uri = %parts.uri, "Incoming request");
    tracing::debug!(
        headers = ?parts.headers.keys().collect::<Vec<_>>(),
        has_authorization = parts.headers.contains_key(header::AUTHORIZATION),
        "Request headers"
    );

    let host = parts
        .headers
        .get(header::HOST)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
    let upstream = state.routes.resolve(host.as_deref())?;
    let registry = upstream.id().to_string();

    tracing::info!(registry = %registry, host = ?host, "Routed");

    let target = request::target_uri(upstream.base_url(), &parts.uri).map_err(|source| {
        ProxyError::InvalidTarget {
            target: format!("{}{}", upstream.base_url(), parts.uri),
            source,
        }
    })?;

    tracing::debug!(registry = %registry, url = %target, "Forwarding");

    let outbound = request::outbound_request(
        parts.method,
        target,
        &parts.headers,
        body,
        state.forwarding.strip_hop_by_hop,
    );

    let deadline = Deadline::start(&state.timeouts);
    let upstream_response = match deadline.run(state.client.request(outbound)).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => return Err(upstream_failure(&registry, err.into())),
        Err(timed_out) => return Err(upstream_failure(&registry, timed_out.into())),
    };

    tracing::info!(
        registry = %registry,
        status = %upstream_response.status(),
        "Upstream responded"
    );

    Ok((
        registry,
        response::relay(upstream_response, &state.forwarding, deadline),
    ))
}

fn upstream_failure(registry: &str, source: UpstreamFailure) -> ProxyError {
    ProxyError::Upstream {
        registry: registry.to_string(),
        source,
    }
}
