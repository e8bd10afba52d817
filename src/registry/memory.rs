//! In-memory registry.
//!
//! # Responsibilities
//! - Own every host's rotation of upstreams
//! - Serialize all access behind a single lock
//! - Deduplicate background probers per (host, upstream)

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::ProxyConfig;
use crate::health::prober::HealthProber;
use crate::observability::metrics;
use crate::registry::rotation::Rotation;
use crate::registry::upstream::Upstream;
use crate::registry::{Registry, RegistryError};

#[derive(Debug, Default)]
struct State {
    /// Map of front-end host -> rotation.
    hosts: HashMap<String, Rotation>,
    /// (host, upstream) pairs with a prober in flight.
    probing: HashSet<(String, String)>,
}

impl State {
    fn add(&mut self, host: &str, upstreams: &[String]) {
        if upstreams.is_empty() {
            return;
        }
        let rotation = self.hosts.entry(host.to_string()).or_default();
        for upstream in upstreams {
            rotation.push(upstream.clone());
            tracing::info!(host = %host, upstream = %upstream, "Added upstream");
        }
    }

    fn set_health(&mut self, host: &str, upstream: &str, healthy: bool) {
        let Some(rotation) = self.hosts.get_mut(host) else {
            tracing::debug!(host = %host, upstream = %upstream, "Host not registered, ignoring");
            return;
        };

        let mut changed = 0;
        for u in rotation.matching_mut(upstream) {
            if healthy {
                u.mark_healthy();
            } else {
                u.mark_unhealthy();
            }
            changed += 1;
        }

        if changed == 0 {
            tracing::debug!(host = %host, upstream = %upstream, "Upstream not registered, ignoring");
            return;
        }
        metrics::record_upstream_health(host, upstream, healthy);
    }
}

/// Registry keeping all rotations in process memory.
#[derive(Debug)]
pub struct DefaultRegistry {
    state: RwLock<State>,
    prober: HealthProber,
}

impl DefaultRegistry {
    /// Create an empty registry probing over TCP with default backoff.
    pub fn new() -> Self {
        Self::with_prober(HealthProber::default())
    }

    pub fn with_prober(prober: HealthProber) -> Self {
        Self {
            state: RwLock::new(State::default()),
            prober,
        }
    }

    /// Create a registry populated with the configured hosts.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let mut state = State::default();
        for host in &config.hosts {
            state.add(&host.host, &host.upstreams);
        }
        Self {
            state: RwLock::new(state),
            prober: HealthProber::from_config(config),
        }
    }

    /// Look up an upstream by exact address.
    ///
    /// Returns a snapshot of its current state.
    pub async fn find(&self, host: &str, upstream: &str) -> Option<Upstream> {
        let state = self.state.read().await;
        state.hosts.get(host)?.find(upstream).cloned()
    }

    /// Registered hosts, sorted.
    pub async fn hosts(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut hosts: Vec<String> = state.hosts.keys().cloned().collect();
        hosts.sort();
        hosts
    }

    /// Upstreams for a host in slot order.
    pub async fn upstreams(&self, host: &str) -> Vec<Upstream> {
        let state = self.state.read().await;
        state
            .hosts
            .get(host)
            .map(|rotation| rotation.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Return true if a prober is running for the upstream.
    pub async fn is_probing(&self, host: &str, upstream: &str) -> bool {
        let state = self.state.read().await;
        state
            .probing
            .contains(&(host.to_string(), upstream.to_string()))
    }
}

impl Default for DefaultRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Registry for DefaultRegistry {
    async fn add(&self, host: &str, upstreams: &[String]) {
        self.state.write().await.add(host, upstreams);
    }

    async fn enable(&self, host: &str, upstream: &str) {
        self.state.write().await.set_health(host, upstream, true);
    }

    async fn disable(&self, host: &str, upstream: &str) {
        self.state.write().await.set_health(host, upstream, false);
    }

    async fn wait_ping(&self, host: &str, upstream: &str) {
        let key = (host.to_string(), upstream.to_string());
        if !self.state.write().await.probing.insert(key.clone()) {
            tracing::debug!(host = %host, upstream = %upstream, "Prober already running");
            return;
        }

        let failures = self.prober.wait_until_reachable(upstream).await;

        let mut state = self.state.write().await;
        state.probing.remove(&key);
        tracing::info!(
            host = %host,
            upstream = %upstream,
            failed_attempts = failures,
            "Upstream reachable again, enabling"
        );
        state.set_health(host, upstream, true);
    }

    async fn next(&self, host: &str) -> Result<String, RegistryError> {
        let mut state = self.state.write().await;

        let Some(rotation) = state.hosts.get_mut(host) else {
            tracing::warn!(host = %host, "Host not registered");
            return Err(RegistryError::ServiceNotFound {
                host: host.to_string(),
            });
        };

        let len = rotation.len();
        match rotation.advance() {
            Some(upstream) => Ok(upstream.address.clone()),
            None => {
                tracing::warn!(host = %host, upstreams = len, "All upstreams disabled");
                Err(RegistryError::ServiceNotFound {
                    host: host.to_string(),
                })
            }
        }
    }
}
