//! Health subsystem.
//!
//! # Data Flow
//! ```text
//! Dial failure (net::failover):
//!     → Registry::disable(host, upstream)
//!     → Registry::wait_ping(host, upstream) spawned as its own task
//!     → prober.rs dials with backoff until the upstream answers
//!     → Registry::enable(host, upstream)
//! ```
//!
//! # Design Decisions
//! - Health is driven by traffic: probing starts only after a failed dial
//! - A single successful TCP connect is enough to reinstate an upstream
//! - Probers are not cancelled; enabling an enabled upstream is a no-op
//! - At most one prober per (host, upstream), tracked by the registry

pub mod prober;
