//! Host-based reverse proxy with round-robin upstreams and dial-time failover.
//!
//! ```text
//! Client ─▶ http::server ─▶ Registry::next(host) ─▶ http::proxy
//!                                                     │
//!                                   net::failover ◀───┘
//!                                     │  on dial failure:
//!                                     │   Registry::disable ─▶ health::prober (background)
//!                                     ▼                           │
//!                                  upstream ◀─── Registry::enable ┘
//! ```

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod registry;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::{DefaultRegistry, Registry, RegistryError};
