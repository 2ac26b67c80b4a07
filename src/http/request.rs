//! Outbound request construction.
//!
//! # Responsibilities
//! - Rebuild the upstream URI from base URL + inbound path and query
//! - Filter inbound headers for the upstream leg
//! - Hand the inbound body to the upstream client as a stream
//!
//! # Design Decisions
//! - Path and query are appended byte-for-byte (no decoding, no dot-segment removal)
//! - A bare `?` is never appended for an empty query
//! - Bodies are streamed, never collected in memory

use axum::body::Body;
use axum::http::{header, uri::InvalidUri, HeaderMap, Method, Request, Uri};

use crate::http::headers::copy_headers;

/// Upstream target for an inbound request URI.
///
/// Only the path and query of `uri` are used, so absolute-form request
/// targets are rewritten onto the upstream too.
pub fn target_uri(base_url: &str, uri: &Uri) -> Result<Uri, InvalidUri> {
    let path = uri.path();
    let mut target = String::with_capacity(base_url.len() + path.len() + 1);
    target.push_str(base_url.trim_end_matches('/'));
    if !path.starts_with('/') {
        target.push('/');
    }
    target.push_str(path);

    if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }

    Uri::try_from(target)
}

/// Headers to send upstream: everything the client sent except `Host`.
pub fn outbound_headers(inbound: &HeaderMap, strip_hop_by_hop: bool) -> HeaderMap {
    copy_headers(inbound, &[header::HOST], strip_hop_by_hop)
}

/// Assemble the upstream request; the inbound body is passed through as a stream.
pub fn outbound_request(
    method: Method,
    target: Uri,
    inbound_headers: &HeaderMap,
    body: Body,
    strip_hop_by_hop: bool,
) -> Request<Body> {
    let mut outbound = Request::new(body);
    *outbound.method_mut() = method;
    *outbound.uri_mut() = target;
    *outbound.headers_mut() = outbound_headers(inbound_headers, strip_hop_by_hop);
    outbound
}
