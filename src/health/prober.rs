//! Reconnection probing for disabled upstreams.
//!
//! # Responsibilities
//! - Repeatedly dial a disabled upstream until it accepts a connection
//! - Wait between attempts using the configured backoff
//!
//! A prober never gives up: it returns only once the upstream answers.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::time;

use crate::config::ProxyConfig;
use crate::net::dialer::{Dial, Protocol, TcpDialer};
use crate::observability::metrics;
use crate::registry::strip_scheme;
use crate::resilience::backoff::Backoff;

#[derive(Debug, Clone)]
pub struct HealthProber {
    dialer: Arc<dyn Dial>,
    backoff: Backoff,
}

impl HealthProber {
    pub fn new(dialer: Arc<dyn Dial>, backoff: Backoff) -> Self {
        Self { dialer, backoff }
    }

    /// Build a TCP prober from the proxy configuration.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let dialer = TcpDialer::new(Duration::from_secs(config.timeouts.connect_secs));
        Self::new(Arc::new(dialer), Backoff::from_config(&config.prober))
    }

    /// Dial `address` until a connection succeeds.
    ///
    /// Returns the number of failed attempts before the upstream answered.
    pub async fn wait_until_reachable(&self, address: &str) -> u32 {
        let target = strip_scheme(address);
        let mut failures = 0u32;

        loop {
            match self.dialer.dial(Protocol::Tcp, target).await {
                Ok(mut conn) => {
                    let _ = conn.shutdown().await;
                    return failures;
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = self.backoff.delay(failures);
                    tracing::warn!(
                        upstream = %target,
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Upstream still unreachable"
                    );
                    metrics::record_probe_attempt(target);
                    time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for HealthProber {
    fn default() -> Self {
        Self::new(Arc::new(TcpDialer::default()), Backoff::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_reachable_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let prober = HealthProber::default();
        let failures = prober
            .wait_until_reachable(&format!("http://{}", addr))
            .await;
        assert_eq!(failures, 0);
    }

    #[tokio::test]
    async fn test_reachable_after_listener_starts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober = HealthProber::new(
            Arc::new(TcpDialer::new(Duration::from_millis(200))),
            Backoff::new(5, 20, 2),
        );
        let probe = tokio::spawn(async move { prober.wait_until_reachable(&addr.to_string()).await });

        time::sleep(Duration::from_millis(60)).await;
        let _listener = TcpListener::bind(addr).await.unwrap();

        let failures = time::timeout(Duration::from_secs(5), probe)
            .await
            .expect("prober should finish once the port opens")
            .unwrap();
        assert!(failures >= 1);
    }
}
