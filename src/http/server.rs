//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler on every path
//! - Restrict inbound methods to GET, HEAD, POST, PUT, DELETE
//! - Wire up middleware (tracing with a per-request ID in the span)
//! - Bind server to listener and shut down gracefully

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    routing::{on, MethodFilter},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestId, MakeRequestUuid},
    trace::TraceLayer,
};

use crate::config::{validate_config, ConfigError, ForwardingConfig, ProxyConfig, TimeoutConfig};
use crate::http::proxy::proxy_handler;
use crate::http::X_REQUEST_ID;
use crate::resilience::timeouts::{build_upstream_client, UpstreamClient};
use crate::routing::RoutingTable;

/// Methods the proxy accepts; anything else gets 405.
const PROXIED_METHODS: MethodFilter = MethodFilter::GET
    .or(MethodFilter::HEAD)
    .or(MethodFilter::POST)
    .or(MethodFilter::PUT)
    .or(MethodFilter::DELETE);

/// Process-wide context injected into every request.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RoutingTable>,
    pub client: UpstreamClient,
    pub forwarding: Arc<ForwardingConfig>,
    pub timeouts: Arc<TimeoutConfig>,
}

impl AppState {
    /// Build the routing table and upstream client from validated config.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let routes = RoutingTable::new(&config.registries).map_err(|errors| {
            ConfigError::Validation(errors.into_iter().map(Into::into).collect())
        })?;
        let client = build_upstream_client(&config.timeouts)?;

        Ok(Self {
            routes: Arc::new(routes),
            client,
            forwarding: Arc::new(config.forwarding.clone()),
            timeouts: Arc::new(config.timeouts.clone()),
        })
    }
}

/// HTTP server for the registry proxy.
pub struct HttpServer {
    router: Router,
    routes: Arc<RoutingTable>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails if the configuration is invalid; no traffic is served then.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let state = AppState::from_config(&config)?;
        let routes = state.routes.clone();

        for upstream in routes.iter() {
            tracing::info!(
                registry = upstream.id(),
                host = upstream.authority(),
                base_url = upstream.base_url(),
                "Registry route"
            );
        }

        Ok(Self {
            router: Self::build_router(state),
            routes,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", on(PROXIED_METHODS, proxy_handler))
            .route("/{*path}", on(PROXIED_METHODS, proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                // A client-supplied id is kept; otherwise one is minted for
                // the span only and never added to the forwarded headers.
                let request_id = match request.headers().get(X_REQUEST_ID) {
                    Some(value) => value.to_str().unwrap_or("invalid").to_owned(),
                    None => MakeRequestUuid
                        .make_request_id(request)
                        .and_then(|id| id.header_value().to_str().ok().map(str::to_owned))
                        .unwrap_or_default(),
                };
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
    }

    /// The configured router, for serving or driving directly in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Routing table the server was built with.
    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    /// Run the server until `shutdown` completes, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            registries = self.routes.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
