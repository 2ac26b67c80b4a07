//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, method filter, tracing span with request ID)
//!     → proxy.rs (Host lookup in the routing table)
//!     → request.rs + headers.rs (upstream URI, filtered headers, body stream)
//!     → upstream call (shared hyper client, per-request deadline)
//!     → response.rs (status, headers, bounded body chunks)
//!     → error.rs (400 / 502 on failure)
//!     → Send to client
//! ```

pub mod error;
pub mod headers;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use error::{ProxyError, UpstreamFailure};
pub use server::{AppState, HttpServer};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: axum::http::HeaderName = axum::http::HeaderName::from_static("x-request-id");
