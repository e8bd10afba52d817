//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream unreachable:
//!     → net::failover disables it and moves to the next healthy upstream
//!     → health::prober retries it with backoff.rs delays until it answers
//! ```
//!
//! # Design Decisions
//! - Backoff grows exponentially and is clamped, never wrapped
//! - Jittered delays keep concurrent probers from reconnecting in lockstep

pub mod backoff;
