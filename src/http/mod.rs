//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, host extraction)
//!     → Registry::next(host) picks the upstream
//!     → director.rs (rewrite scheme/authority, strip hop-by-hop headers)
//!     → proxy.rs (dial via net::failover, HTTP/1.1 to upstream)
//!     → Stream response to client
//! ```

pub mod director;
pub mod proxy;
pub mod server;

pub use proxy::{ProxyError, ReverseProxy};
pub use server::HttpServer;
