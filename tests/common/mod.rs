//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::stream;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use registry_proxy::config::{ProxyConfig, RegistryEntry};
use registry_proxy::HttpServer;

/// Size of the body served by `/large`.
pub const LARGE_BODY_LEN: usize = 1024 * 1024 + 17;

/// Deterministic content of the `/large` body.
pub fn large_body() -> Vec<u8> {
    (0..LARGE_BODY_LEN).map(|i| (i % 251) as u8).collect()
}

/// Echo the request back: body as body, request line and headers as `x-echo-*`.
async fn echo(request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert("x-echo-method", HeaderValue::from_str(parts.method.as_str()).unwrap());
    headers.insert("x-echo-uri", HeaderValue::from_str(&parts.uri.to_string()).unwrap());

    let names: Vec<&str> = parts.headers.keys().map(|k| k.as_str()).collect();
    headers.insert("x-echo-headers", HeaderValue::from_str(&names.join(",")).unwrap());

    if let Some(host) = parts.headers.get(header::HOST) {
        headers.insert("x-echo-host", host.clone());
    }
    for value in parts.headers.get_all(header::AUTHORIZATION) {
        headers.append("x-echo-authorization", value.clone());
    }
    response
}

async fn multi() -> Response {
    let mut response = (StatusCode::CREATED, "created").into_response();
    let headers = response.headers_mut();
    headers.append(header::SET_COOKIE, HeaderValue::from_static("session=1"));
    headers.append(header::SET_COOKIE, HeaderValue::from_static("theme=dark"));
    headers.append("x-multi", HeaderValue::from_static("a"));
    headers.append("x-multi", HeaderValue::from_static("b"));
    headers.append("x-multi", HeaderValue::from_static("c"));
    response
}

async fn large() -> Response {
    let chunks: Vec<Result<Bytes, std::io::Error>> = large_body()
        .chunks(100_000)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    let mut response = Response::new(Body::from_stream(stream::iter(chunks)));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
    response
}

/// Size advertised for `/blob`.
pub const BLOB_LEN: usize = 4096;

async fn blob() -> Vec<u8> {
    vec![7u8; BLOB_LEN]
}

async fn blob_head() -> Response {
    let mut response = Response::new(Body::empty());
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(BLOB_LEN));
    response
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

async fn redirect() -> Response {
    (
        StatusCode::TEMPORARY_REDIRECT,
        [(header::LOCATION, "https://blobs.internal.example/layer")],
    )
        .into_response()
}

/// Start a mock upstream on an ephemeral port.
pub async fn start_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/multi", get(multi))
        .route("/large", get(large))
        .route("/slow", get(slow))
        .route("/redirect", get(redirect))
        .route("/blob", get(blob).head(blob_head))
        .fallback(echo);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Sends once on drop; lives inside a response stream.
struct DropSignal(mpsc::UnboundedSender<()>);

impl Drop for DropSignal {
    fn drop(&mut self) {
        let _ = self.0.send(());
    }
}

/// Start an upstream that streams a body forever on every path.
///
/// The receiver gets a message each time a response stream is dropped.
pub async fn start_endless_upstream() -> (SocketAddr, mpsc::UnboundedReceiver<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().fallback(move || {
        let signal = DropSignal(tx.clone());
        async move {
            let body = stream::unfold(signal, |signal| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Some((Ok::<_, std::io::Error>(Bytes::from(vec![0u8; 8192])), signal))
            });
            Response::new(Body::from_stream(body))
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, rx)
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Proxy config with a single registry `local` pointing at `upstream`.
pub fn proxy_config(upstream: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.registries = vec![
        RegistryEntry::new("local", format!("http://{upstream}")),
        RegistryEntry::new("azure", "https://mirantis.azurecr.io"),
    ];
    config
}

/// Router for a proxy in front of `upstream`.
pub fn proxy_router(config: ProxyConfig) -> Router {
    HttpServer::new(config).unwrap().router()
}
