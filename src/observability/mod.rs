//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! registry / net / health / http produce:
//!     → tracing events (host, upstream, attempt, error fields)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
