//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream selected for host H
//!     → failover.rs (dial candidate; on failure disable, probe, ask for next)
//!     → dialer.rs (resolve host:port, connect with timeout)
//!     → Connection handed to the HTTP proxy
//! ```
//!
//! # Design Decisions
//! - The dial boundary is a trait so tests and embedders can swap transports
//! - Dial targets never carry a scheme; it is stripped before connecting

pub mod dialer;
pub mod failover;

pub use dialer::{BoxedConnection, Connection, Dial, Protocol, TcpDialer};
pub use failover::{DialError, Dialed, FailoverDialer};
