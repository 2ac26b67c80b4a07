//! Upstream response relay.
//!
//! # Responsibilities
//! - Copy upstream status and headers to the client response
//! - Stream the upstream body in bounded chunks
//! - Abort the client transfer if the upstream body fails or stalls mid-stream
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped per forwarding policy
//! - Dropping the client body drops the upstream stream (cancellation)

use axum::body::{Body, Bytes};
use axum::response::Response;
use axum::BoxError;
use futures_util::stream::{self, Stream, StreamExt, TryStreamExt};
use hyper::body::Incoming;

use crate::config::ForwardingConfig;
use crate::http::headers::copy_headers;
use crate::resilience::timeouts::{with_deadline, Deadline};

/// Re-chunk a byte stream so no item is larger than `max_chunk` bytes.
///
/// Splitting is zero-copy; errors from the inner stream are passed through.
pub fn bounded_chunks<S, E>(inner: S, max_chunk: usize) -> impl Stream<Item = Result<Bytes, E>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
{
    let max_chunk = max_chunk.max(1);
    stream::unfold(
        (Box::pin(inner), Bytes::new()),
        move |(mut inner, mut pending)| async move {
            loop {
                if !pending.is_empty() {
                    let chunk = pending.split_to(pending.len().min(max_chunk));
                    return Some((Ok(chunk), (inner, pending)));
                }
                match inner.next().await? {
                    Ok(bytes) => pending = bytes,
                    Err(e) => return Some((Err(e), (inner, pending))),
                }
            }
        },
    )
}

/// Turn an upstream response into the client response.
///
/// Each body read stays under `deadline`; a stall ends the client transfer.
pub fn relay(
    upstream: axum::http::Response<Incoming>,
    policy: &ForwardingConfig,
    deadline: Deadline,
) -> Response {
    let (parts, incoming) = upstream.into_parts();
    let headers = copy_headers(&parts.headers, &[], policy.strip_hop_by_hop);

    tracing::debug!(status = %parts.status, headers = ?headers, "Relaying upstream response");

    let data = Body::new(incoming)
        .into_data_stream()
        .map_err(|err| -> BoxError { Box::new(err) });
    let body = bounded_chunks(with_deadline(data, deadline), policy.max_chunk_bytes).inspect_err(
        |err| {
            tracing::warn!(error = %err, "Upstream body stream aborted");
        },
    );

    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = parts.status;
    *response.headers_mut() = headers;
    response
}
