//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing, request ID)
//! - Bound each proxied request by the configured request timeout
//! - Bind server to listener
//! - Select an upstream per request host and forward through the failover dialer

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::proxy::{ProxyError, ReverseProxy};
use crate::net::dialer::{Dial, TcpDialer};
use crate::net::failover::FailoverDialer;
use crate::observability::metrics;
use crate::registry::Registry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn Registry>,
    pub proxy: Arc<ReverseProxy>,
    pub request_timeout: Duration,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server dialing upstreams over TCP.
    pub fn new(config: ProxyConfig, registry: Arc<dyn Registry>) -> Self {
        let dialer = TcpDialer::new(Duration::from_secs(config.timeouts.connect_secs));
        Self::with_dialer(config, registry, Arc::new(dialer))
    }

    /// Create a new HTTP server with a custom dial hook.
    pub fn with_dialer(config: ProxyConfig, registry: Arc<dyn Registry>, dialer: Arc<dyn Dial>) -> Self {
        let failover = FailoverDialer::new(registry.clone(), dialer);
        let state = AppState {
            registry,
            proxy: Arc::new(ReverseProxy::new(failover)),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router, for embedding or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Picks the next upstream for the request host and forwards the request.
async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let routed = tokio::time::timeout(state.request_timeout, route_request(&state, client, request))
        .await
        .unwrap_or(Err(ProxyError::Timeout(state.request_timeout)));

    let response = match routed {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Returning bad gateway");
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}

async fn route_request(
    state: &AppState,
    client: Option<SocketAddr>,
    request: Request,
) -> Result<Response, ProxyError> {
    let host = request_host(&request).ok_or(ProxyError::MissingHost)?;
    let upstream = state.registry.next(&host).await?;

    tracing::debug!(
        host = %host,
        upstream = %upstream,
        method = %request.method(),
        path = %request.uri().path(),
        "Proxying request"
    );

    state.proxy.forward(&host, &upstream, client, request).await
}

/// The requested host: `Host` header, else the URI authority.
fn request_host(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
}
