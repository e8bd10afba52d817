//! Upstream registry subsystem.
//!
//! # Data Flow
//! ```text
//! Request for front-end host H
//!     → Registry::next(H)
//!     → memory.rs (look up H's rotation under the registry lock)
//!     → rotation.rs (advance cursor to next healthy slot)
//!     → Return upstream address or ServiceNotFound
//!
//! Dial failure on upstream U:
//!     → Registry::disable(H, U)
//!     → Registry::wait_ping(H, U) in the background
//!     → health::prober reconnects with backoff
//!     → Registry::enable(H, U)
//! ```
//!
//! # Design Decisions
//! - One lock per registry instance; `next` mutates the cursor and takes it exclusively
//! - Rotations only grow; disabling keeps the slot occupied
//! - Trait object seam so the dialer and router work against any registry

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod rotation;
pub mod upstream;

pub use memory::DefaultRegistry;
pub use upstream::{strip_scheme, HealthState, Upstream};

/// Errors returned by registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Host is unknown, or every upstream for it is disabled.
    #[error("upstream host not found for {host}")]
    ServiceNotFound { host: String },
}

/// Lookup of upstream addresses for a front-end host.
#[async_trait]
pub trait Registry: Send + Sync + std::fmt::Debug {
    /// Append upstreams to the host's rotation, creating it if absent.
    async fn add(&self, host: &str, upstreams: &[String]);

    /// Mark an upstream healthy. No-op if the host or address is unknown.
    async fn enable(&self, host: &str, upstream: &str);

    /// Mark an upstream unhealthy. No-op if the host or address is unknown.
    async fn disable(&self, host: &str, upstream: &str);

    /// Probe a disabled upstream until it accepts connections, then enable it.
    async fn wait_ping(&self, host: &str, upstream: &str);

    /// Return the next healthy upstream for the host in round-robin order.
    async fn next(&self, host: &str) -> Result<String, RegistryError>;
}
