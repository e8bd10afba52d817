//! Upstream abstraction.
//!
//! # Responsibilities
//! - Represent a single backend address for a front-end host
//! - Track health state (Healthy/Unhealthy)
//! - Strip the scheme from a registered address to get its dial target

/// Health state of an upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// A single upstream server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// The address exactly as it was registered (may carry a scheme).
    pub address: String,
    /// Current health state.
    pub state: HealthState,
}

impl Upstream {
    /// Create a new, healthy upstream.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: HealthState::Healthy,
        }
    }

    /// Return true if the upstream may receive traffic.
    pub fn is_healthy(&self) -> bool {
        self.state == HealthState::Healthy
    }

    pub fn mark_healthy(&mut self) {
        self.state = HealthState::Healthy;
    }

    pub fn mark_unhealthy(&mut self) {
        self.state = HealthState::Unhealthy;
    }
}

/// Strip a leading `http://` or `https://` from an address.
///
/// Only the first matching prefix is removed; the scheme is otherwise ignored
/// (no TLS is negotiated by the proxy itself).
pub fn strip_scheme(address: &str) -> &str {
    address
        .strip_prefix("http://")
        .or_else(|| address.strip_prefix("https://"))
        .unwrap_or(address)
}
