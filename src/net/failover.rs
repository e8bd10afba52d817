//! Dial-time failover across a host's upstreams.
//!
//! # Responsibilities
//! - Connect to a candidate upstream for a front-end host
//! - On failure: disable it, start a background prober, move to the next one
//! - Give up only when the registry has no healthy upstream left
//!
//! # Design Decisions
//! - The registry spelling of an address (scheme included) identifies the
//!   upstream; only the dial target has the scheme stripped
//! - Probers are fire-and-forget; the dial never waits on them
//! - The retry budget is the rotation itself: every failure disables a slot

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::net::dialer::{BoxedConnection, Dial, Protocol};
use crate::observability::metrics;
use crate::registry::{strip_scheme, Registry};

/// Errors returned by the failover dialer.
#[derive(Debug, Error)]
pub enum DialError {
    /// Every upstream for the host failed or is disabled.
    #[error("no upstream available for {host}")]
    NoUpstream {
        host: String,
        /// The connect error that exhausted the rotation.
        #[source]
        last_error: Option<io::Error>,
    },
}

/// A live connection and the upstream it reached.
pub struct Dialed {
    pub connection: BoxedConnection,
    /// Registry spelling of the upstream that accepted the connection.
    pub upstream: String,
}

impl std::fmt::Debug for Dialed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialed").field("upstream", &self.upstream).finish()
    }
}

/// Dialer that works around unreachable upstreams.
#[derive(Debug, Clone)]
pub struct FailoverDialer {
    registry: Arc<dyn Registry>,
    dialer: Arc<dyn Dial>,
}

impl FailoverDialer {
    pub fn new(registry: Arc<dyn Registry>, dialer: Arc<dyn Dial>) -> Self {
        Self { registry, dialer }
    }

    /// Connect to `upstream`, failing over to the host's other upstreams.
    pub async fn dial(
        &self,
        protocol: Protocol,
        host: &str,
        upstream: &str,
    ) -> Result<Dialed, DialError> {
        let mut candidate = upstream.to_string();

        loop {
            let result = self.dialer.dial(protocol, strip_scheme(&candidate)).await;

            let err = match result {
                Ok(connection) => {
                    tracing::debug!(host = %host, upstream = %candidate, "Connected to upstream");
                    return Ok(Dialed {
                        connection,
                        upstream: candidate,
                    });
                }
                Err(e) => e,
            };

            tracing::warn!(
                host = %host,
                upstream = %candidate,
                error = %err,
                "Upstream dial failed, disabling"
            );
            metrics::record_dial_failure(&candidate);

            self.registry.disable(host, &candidate).await;
            self.spawn_prober(host, &candidate);

            candidate = match self.registry.next(host).await {
                Ok(next) => next,
                Err(e) => {
                    tracing::error!(host = %host, error = %e, "No upstream left to fail over to");
                    return Err(DialError::NoUpstream {
                        host: host.to_string(),
                        last_error: Some(err),
                    });
                }
            };
        }
    }

    fn spawn_prober(&self, host: &str, upstream: &str) {
        let registry = self.registry.clone();
        let host = host.to_string();
        let upstream = upstream.to_string();
        tokio::spawn(async move {
            registry.wait_ping(&host, &upstream).await;
        });
    }
}
