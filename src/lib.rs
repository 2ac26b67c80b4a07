//! Host-based reverse proxy for package and container registries.
//!
//! Every inbound request is routed by its `Host` header to one configured
//! upstream registry, forwarded with its method, path, query, headers and
//! body, and the upstream response is streamed back unchanged.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::RoutingTable;
