//! One-shot reverse proxying over a failover connection.
//!
//! # Responsibilities
//! - Dial through the failover dialer instead of the literal target
//! - Apply the director for whichever upstream answered the dial
//! - Speak HTTP/1.1 to the upstream and stream the response back
//!
//! # Design Decisions
//! - One upstream connection per request; the dial hook is the only transport
//! - Every failure maps to 502 with a fixed `Bad Gateway` body

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    extract::Request,
    http::{StatusCode, Version},
    response::{IntoResponse, Response},
};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use thiserror::Error;

use crate::http::director;
use crate::net::dialer::Protocol;
use crate::net::failover::{DialError, FailoverDialer};
use crate::registry::RegistryError;

/// Errors that end a proxied request with a gateway failure.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("request has no host")]
    MissingHost,

    #[error(transparent)]
    NoUpstream(#[from] RegistryError),

    #[error(transparent)]
    Dial(#[from] DialError),

    #[error("invalid upstream target: {0}")]
    InvalidTarget(#[from] axum::http::Error),

    #[error("upstream protocol error: {0}")]
    Upstream(#[from] hyper::Error),

    #[error("no upstream response within {0:?}")]
    Timeout(Duration),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = StatusCode::BAD_GATEWAY;
        (status, status.canonical_reason().unwrap_or("Bad Gateway")).into_response()
    }
}

/// Reverse proxy whose outbound dial goes through [`FailoverDialer`].
#[derive(Debug, Clone)]
pub struct ReverseProxy {
    failover: FailoverDialer,
}

impl ReverseProxy {
    pub fn new(failover: FailoverDialer) -> Self {
        Self { failover }
    }

    /// Forward `request` for `host` to `upstream` (or a sibling if it is unreachable).
    pub async fn forward(
        &self,
        host: &str,
        upstream: &str,
        client: Option<SocketAddr>,
        request: Request,
    ) -> Result<Response, ProxyError> {
        let dialed = self.failover.dial(Protocol::Tcp, host, upstream).await?;

        let (mut parts, body) = request.into_parts();
        director::direct(&mut parts, host, &dialed.upstream)?;
        director::remove_hop_by_hop_headers(&mut parts.headers);
        if let Some(addr) = client {
            director::append_forwarded_for(&mut parts.headers, addr.ip());
        }

        tracing::debug!(
            host = %host,
            upstream = %dialed.upstream,
            uri = %parts.uri,
            "Forwarding request"
        );

        let (mut sender, conn) = http1::handshake(TokioIo::new(dialed.connection)).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "Upstream connection closed with error");
            }
        });

        parts.uri = director::origin_form(&parts.uri);
        parts.version = Version::HTTP_11;
        let response = sender.send_request(Request::from_parts(parts, body)).await?;

        let (mut parts, body) = response.into_parts();
        director::remove_hop_by_hop_headers(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
